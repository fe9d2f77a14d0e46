//! # CVN Runtime
//!
//! 双屏视觉小说引擎的核心运行时库。
//!
//! ## 架构概述
//!
//! `cvn-runtime` 是纯逻辑核心，不依赖任何 IO 或渲染后端。
//! 它通过 **请求驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                             Runtime
//!   │                                 │
//!   │──── Intent / dt ──────────────►│
//!   │                                 │ handle() / update()
//!   │◄─── Vec<SceneRequest> ─────────│
//!   │                                 │
//! ```
//!
//! ## 核心类型
//!
//! - [`ScriptDocument`]：解析后的脚本
//! - [`Interpreter`]：对话 / 选择 / 结束状态机
//! - [`SceneRequest`]：Runtime 向 Host 发出的场景请求
//! - [`Intent`]：Host 向 Runtime 传递的玩家意图
//!
//! ## 使用示例
//!
//! ```ignore
//! use cvn_runtime::{Interpreter, ScriptDocument};
//!
//! let doc = ScriptDocument::parse(script_text);
//! let mut interpreter = Interpreter::new(doc);
//!
//! for request in interpreter.start() {
//!     host.execute(request);
//! }
//! loop {
//!     for intent in host.poll_intents() {
//!         for request in interpreter.handle(intent) {
//!             host.execute(request);
//!         }
//!     }
//!     for request in interpreter.update(dt) {
//!         host.execute(request);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`script`]：脚本解析（文档定义与 Parser）
//! - [`runtime`]：解释器
//! - [`request`]：SceneRequest 定义
//! - [`input`]：Intent 定义
//! - [`state`]：解释器状态
//! - [`typewriter`]：逐字显示计时
//! - [`diagnostic`]：静态检查
//! - [`error`]：错误类型定义

pub mod diagnostic;
pub mod error;
pub mod input;
pub mod request;
pub mod runtime;
pub mod script;
pub mod state;
pub mod typewriter;

// 重导出核心类型
pub use diagnostic::{
    AssetReference, Diagnostic, DiagnosticLevel, DiagnosticResult, analyze_document,
    analyze_text, extract_asset_references, get_defined_labels, warnings_to_diagnostics,
};
pub use error::{ParseWarning, RuntimeError};
pub use input::Intent;
pub use request::{AudioChannel, SceneRequest};
pub use runtime::{ChoiceView, DialogueView, Interpreter, SpeakerDisplay};
pub use script::{
    Asset, Character, ChoiceOption, Command, Condition, END_LABEL, Label, ParseLimits, Parser,
    ScreenPosition, ScriptDocument, Style,
};
pub use state::{DialogueLine, InterpreterState, MachineState, PauseTimer, WaitingReason};
pub use typewriter::Typewriter;
