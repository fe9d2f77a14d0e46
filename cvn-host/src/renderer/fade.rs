//! # Fade 模块
//!
//! 实例透明度渐变。
//!
//! 渐变按时间推进：速度单位为每秒变化的 alpha 值，
//! 内部用浮点累积，帧间隔很小时也不会丢失进度。

/// 透明度渐变
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    target: u8,
    /// 每秒 alpha 变化量
    speed: f32,
    value: f32,
}

impl Fade {
    /// 从 `from` 渐变到 `target`
    ///
    /// 速度非正或非有限值时立即到达目标。
    pub fn new(from: u8, target: u8, speed: f32) -> Self {
        let value = if speed.is_finite() && speed > 0.0 {
            f32::from(from)
        } else {
            f32::from(target)
        };
        Self {
            target,
            speed,
            value,
        }
    }

    /// 推进 `dt` 秒，返回当前 alpha
    pub fn advance(&mut self, dt: f32) -> u8 {
        let goal = f32::from(self.target);
        if dt > 0.0 && !self.is_done() {
            let step = self.speed * dt;
            self.value = if self.value < goal {
                (self.value + step).min(goal)
            } else {
                (self.value - step).max(goal)
            };
        }
        self.alpha()
    }

    pub fn alpha(&self) -> u8 {
        self.value.round().clamp(0.0, 255.0) as u8
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn is_done(&self) -> bool {
        self.value == f32::from(self.target)
    }
}

/// 渐变时长
///
/// 都以「从完全透明到完全不透明」所需秒数表示，0 表示立即切换。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTimings {
    /// 立绘淡入/淡出
    pub sprite_seconds: f32,
    /// 背景交叉淡化
    pub background_seconds: f32,
}

impl FadeTimings {
    /// 不做任何渐变
    pub const INSTANT: Self = Self {
        sprite_seconds: 0.0,
        background_seconds: 0.0,
    };

    pub fn sprite_speed(&self) -> f32 {
        speed_for(self.sprite_seconds)
    }

    pub fn background_speed(&self) -> f32 {
        speed_for(self.background_seconds)
    }
}

impl Default for FadeTimings {
    fn default() -> Self {
        Self {
            sprite_seconds: 0.4,
            background_seconds: 0.8,
        }
    }
}

/// 时长换算为速度；非正时长返回无穷大（立即完成）
fn speed_for(seconds: f32) -> f32 {
    if seconds > 0.0 {
        255.0 / seconds
    } else {
        f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_in_reaches_target() {
        let mut fade = Fade::new(0, 255, 510.0);
        assert_eq!(fade.advance(0.25), 128);
        assert!(!fade.is_done());
        assert_eq!(fade.advance(0.5), 255);
        assert!(fade.is_done());
    }

    #[test]
    fn test_fade_out_clamps_at_target() {
        let mut fade = Fade::new(200, 50, 100.0);
        assert_eq!(fade.advance(1.0), 100);
        assert_eq!(fade.advance(10.0), 50);
        assert!(fade.is_done());
    }

    #[test]
    fn test_small_steps_accumulate() {
        let mut fade = Fade::new(0, 255, 255.0);
        for _ in 0..100 {
            fade.advance(0.002);
        }
        assert_eq!(fade.alpha(), 51);
    }

    #[test]
    fn test_instant_speeds() {
        assert!(Fade::new(0, 255, f32::INFINITY).is_done());
        assert!(Fade::new(0, 255, 0.0).is_done());
        assert_eq!(Fade::new(255, 0, -1.0).alpha(), 0);

        let mut fade = Fade::new(10, 20, 100.0);
        assert_eq!(fade.advance(0.0), 10);
    }

    #[test]
    fn test_timings() {
        let timings = FadeTimings {
            sprite_seconds: 0.5,
            background_seconds: 0.0,
        };
        assert_eq!(timings.sprite_speed(), 510.0);
        assert!(timings.background_speed().is_infinite());
        assert!(FadeTimings::INSTANT.sprite_speed().is_infinite());
    }
}
