//! # Shake 模块
//!
//! 屏幕震动。偏移量由已经过时间确定性地计算，便于测试。

use std::time::Duration;

/// 震动状态
#[derive(Debug, Clone, Default)]
pub struct ShakeState {
    /// 最大偏移（像素）
    intensity: u32,
    /// 剩余时间（秒）
    remaining: f32,
    /// 已经过时间（秒）
    elapsed: f32,
}

impl ShakeState {
    /// 开始震动，覆盖正在进行的震动
    pub fn start(&mut self, intensity: u32, duration: Duration) {
        self.intensity = intensity;
        self.remaining = duration.as_secs_f32();
        self.elapsed = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        if !self.is_active() {
            return;
        }
        let dt = dt.max(0.0);
        self.elapsed += dt;
        self.remaining = (self.remaining - dt).max(0.0);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0 && self.intensity > 0
    }

    /// 当前偏移，范围 `[-intensity, intensity]`；未震动时为 (0, 0)
    pub fn offset(&self) -> (i32, i32) {
        if !self.is_active() {
            return (0, 0);
        }
        let amplitude = self.intensity as f32;
        let x = (self.elapsed * 97.0).sin() * amplitude;
        let y = (self.elapsed * 71.0 + 1.3).cos() * amplitude;
        (x.round() as i32, y.round() as i32)
    }
}
