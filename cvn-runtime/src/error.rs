//! # Error 模块
//!
//! 定义 cvn-runtime 中使用的错误类型。
//!
//! 解析器从不失败：格式错误的行被跳过并记录为 [`ParseWarning`]。
//! 运行时错误 [`RuntimeError`] 都是可恢复的，由引擎记录日志后继续执行。

use thiserror::Error;

/// 解析警告
///
/// 每条警告都携带源码行号（从 1 开始）。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// 无效的行格式
    #[error("第 {line} 行：无效的格式 - {message}")]
    InvalidLine { line: usize, message: String },

    /// 无法识别的语句
    #[error("第 {line} 行：未知语句 '{statement}'")]
    UnknownStatement { line: usize, statement: String },

    /// 某类定义达到容量上限
    #[error("第 {line} 行：{kind} 数量已达上限 {limit}，后续定义被忽略")]
    CapacityReached {
        line: usize,
        kind: &'static str,
        limit: usize,
    },

    /// 重复定义
    #[error("第 {line} 行：重复定义 {kind} '{name}'，已忽略")]
    Duplicate {
        line: usize,
        kind: &'static str,
        name: String,
    },

    /// 块缺少右花括号
    #[error("第 {line} 行：块未闭合")]
    UnclosedBlock { line: usize },
}

impl ParseWarning {
    /// 警告对应的源码行号
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidLine { line, .. }
            | Self::UnknownStatement { line, .. }
            | Self::CapacityReached { line, .. }
            | Self::Duplicate { line, .. }
            | Self::UnclosedBlock { line } => *line,
        }
    }
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// 标签未找到
    #[error("标签 '{label}' 未找到")]
    LabelNotFound { label: String },

    /// 素材未定义
    #[error("素材 {asset_type}/{name} 未定义")]
    AssetNotFound { asset_type: String, name: String },
}
