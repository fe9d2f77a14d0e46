//! # Runtime 模块
//!
//! 脚本解释器核心，负责指令执行和状态机管理。
//!
//! ## 模块结构
//!
//! - [`engine`]：解释器（状态机与执行循环）
//! - [`executor`]：单条指令到 SceneRequest 的转换

pub mod engine;
pub mod executor;

pub use engine::{ChoiceView, DialogueView, Interpreter, MAX_CHAINED_COMMANDS, SpeakerDisplay};
