//! # Typewriter 模块
//!
//! 对话文本逐字显示的计时器。只计算"显示了多少个字符"，不关心文本内容。

use serde::{Deserialize, Serialize};

/// 默认每字符耗时（秒）
pub const DEFAULT_SECONDS_PER_CHAR: f32 = 0.03;

// 浮点累加误差补偿，避免恰好到达边界时少显示一个字符
const EPSILON: f32 = 1e-4;

/// 打字机计时器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typewriter {
    seconds_per_char: f32,
    total_chars: usize,
    elapsed: f32,
    skipped: bool,
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(DEFAULT_SECONDS_PER_CHAR)
    }
}

impl Typewriter {
    /// 创建打字机
    ///
    /// `seconds_per_char <= 0` 表示立即显示全部文本。
    pub fn new(seconds_per_char: f32) -> Self {
        Self {
            seconds_per_char,
            total_chars: 0,
            elapsed: 0.0,
            skipped: false,
        }
    }

    /// 开始显示一段新文本
    pub fn reset(&mut self, total_chars: usize) {
        self.total_chars = total_chars;
        self.elapsed = 0.0;
        self.skipped = false;
    }

    /// 推进时间
    pub fn update(&mut self, dt: f32) {
        if !self.is_complete() {
            self.elapsed += dt.max(0.0);
        }
    }

    /// 当前应显示的字符数
    pub fn visible_chars(&self) -> usize {
        if self.skipped || self.seconds_per_char <= 0.0 {
            return self.total_chars;
        }
        let revealed = (self.elapsed / self.seconds_per_char + EPSILON).floor() as usize;
        revealed.min(self.total_chars)
    }

    pub fn is_complete(&self) -> bool {
        self.visible_chars() >= self.total_chars
    }

    /// 立即显示全部
    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    pub fn seconds_per_char(&self) -> f32 {
        self.seconds_per_char
    }

    /// 截取 `text` 中当前可见的前缀
    pub fn visible_text<'a>(&self, text: &'a str) -> &'a str {
        let count = self.visible_chars();
        match text.char_indices().nth(count) {
            Some((byte_index, _)) => &text[..byte_index],
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_progress() {
        let mut tw = Typewriter::new(0.03);
        tw.reset(40);
        assert_eq!(tw.visible_chars(), 0);

        tw.update(0.5);
        assert_eq!(tw.visible_chars(), 16);
        assert!(!tw.is_complete());

        tw.skip();
        assert_eq!(tw.visible_chars(), 40);
        assert!(tw.is_complete());
    }

    #[test]
    fn test_reveal_caps_at_total() {
        let mut tw = Typewriter::new(0.03);
        tw.reset(5);
        tw.update(10.0);
        assert_eq!(tw.visible_chars(), 5);
        assert!(tw.is_complete());
    }

    #[test]
    fn test_empty_text_is_complete() {
        let mut tw = Typewriter::default();
        tw.reset(0);
        assert!(tw.is_complete());
    }

    #[test]
    fn test_non_positive_rate_reveals_instantly() {
        let mut tw = Typewriter::new(0.0);
        tw.reset(12);
        assert!(tw.is_complete());

        let mut tw = Typewriter::new(-1.0);
        tw.reset(3);
        assert_eq!(tw.visible_chars(), 3);
    }

    #[test]
    fn test_reset_clears_skip() {
        let mut tw = Typewriter::new(0.1);
        tw.reset(10);
        tw.skip();
        tw.reset(10);
        assert_eq!(tw.visible_chars(), 0);
    }

    #[test]
    fn test_visible_text_is_char_aligned() {
        let mut tw = Typewriter::new(0.1);
        tw.reset(4);
        tw.update(0.2);
        // 多字节字符按字符截取
        assert_eq!(tw.visible_text("喵呜喵呜"), "喵呜");
    }
}
