//! # Input 模块
//!
//! 定义 Host 向 Runtime 传递的语义化输入。
//!
//! Runtime 不直接处理键盘/手柄事件，Host 负责把原始输入翻译为 [`Intent`]。

use serde::{Deserialize, Serialize};

/// 玩家意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// 推进对话（先补全打字机，再前进）
    Advance,
    /// 选项高亮上移
    SelectUp,
    /// 选项高亮下移
    SelectDown,
    /// 确认当前选项（对话状态下等同于推进）
    Confirm,
    /// 取消（Runtime 不处理，留给 Host）
    Cancel,
    /// 立即显示完整文本
    Skip,
    /// 退出（Runtime 不处理，留给 Host）
    Quit,
}

impl Intent {
    /// 从命令行/配置中的名称解析意图
    ///
    /// 未知名称返回 `None`。
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "advance" | "a" => Some(Self::Advance),
            "up" | "select_up" => Some(Self::SelectUp),
            "down" | "select_down" => Some(Self::SelectDown),
            "confirm" | "c" => Some(Self::Confirm),
            "cancel" => Some(Self::Cancel),
            "skip" | "s" => Some(Self::Skip),
            "quit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}
