//! # Parser 模块
//!
//! 两阶段脚本解析器实现（手写解析，无 regex 依赖）。
//!
//! ## 架构
//!
//! ```text
//! 原始文本 → [阶段1: 块识别] → Vec<Block> → [阶段2: 块解析] → ScriptDocument
//! ```
//!
//! ## 设计原则
//!
//! - 解析永不失败：无效行被跳过并记录为警告
//! - 每条指令记录源码行号，供诊断使用
//! - 各类定义有容量上限，超出部分被忽略
//!
//! ## 模块结构
//!
//! - `helpers`: 辅助解析函数
//! - `phase1`: 块识别
//! - `phase2`: 块解析

mod helpers;
mod phase1;
mod phase2;

#[cfg(test)]
mod tests;

use crate::error::ParseWarning;
use crate::script::ast::{ParseLimits, ScriptDocument};

use phase1::recognize_blocks;
use phase2::Phase2Parser;

// 重新导出辅助函数供诊断与测试使用
pub use helpers::{parse_hex_color, strip_statement};

/// 脚本解析器
pub struct Parser {
    /// 阶段2解析器
    phase2: Phase2Parser,
}

impl Parser {
    /// 使用默认容量创建解析器
    pub fn new() -> Self {
        Self::with_limits(ParseLimits::default())
    }

    /// 使用指定容量创建解析器
    pub fn with_limits(limits: ParseLimits) -> Self {
        Self {
            phase2: Phase2Parser::new(limits),
        }
    }

    /// 解析脚本文本
    ///
    /// # 参数
    ///
    /// - `text`: 脚本文本内容
    ///
    /// # 返回
    ///
    /// 解析后的 `ScriptDocument`。警告通过 [`Parser::warnings`] 获取，
    /// 在下一次解析前保持有效。
    pub fn parse(&mut self, text: &str) -> ScriptDocument {
        self.phase2.reset();

        for block in recognize_blocks(text) {
            self.phase2.parse_block(block);
        }

        self.phase2.finish()
    }

    /// 获取解析过程中的警告
    pub fn warnings(&self) -> &[ParseWarning] {
        &self.phase2.warnings
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
