//! # Host 层
//!
//! 双屏视觉小说引擎的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 分层场景渲染与多显示器路由
//! - 纹理加载与缓存
//! - 音频播放
//! - 将 Runtime 的 SceneRequest 转换为实际效果
//!
//! Host 层不包含脚本逻辑。窗口与图形上下文通过 [`display::DisplayOutput`]
//! 接入，仓库自带的 [`display::HeadlessDisplay`] 只记录绘制调用。

pub mod app;
pub mod audio;
pub mod command_executor;
pub mod config;
pub mod display;
pub mod renderer;
pub mod resources;

pub use app::{Session, SessionBackends, load_document};
pub use audio::{AudioManager, AudioSink, NullAudioSink};
pub use command_executor::{CommandExecutor, ExecuteError, ExecuteResult};
pub use config::{AppConfig, ConfigError};
pub use display::{DisplayId, DisplayOutput, DrawCall, HeadlessDisplay, Rect};
pub use renderer::{
    DisplayRouter, FadeTimings, Instance, Layer, LayerId, RenderError, RendererLimits,
    SceneRenderer, SpritePlacement,
};
pub use resources::{
    ImageLoader, ResourceError, ResourceManager, TextureId, TextureLoader, TextureQuery,
};
