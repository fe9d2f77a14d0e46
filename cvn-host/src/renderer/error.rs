//! # Render Error 模块

use thiserror::Error;

/// 场景渲染错误
///
/// 返回错误时渲染器状态保持不变。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("图层数量已达上限 {limit}")]
    LayerCapacity { limit: usize },

    #[error("图层 {layer} 的实例数量已达上限 {limit}")]
    InstanceCapacity { layer: String, limit: usize },

    #[error("图层已存在: {name}")]
    DuplicateLayer { name: String },

    #[error("图层不存在: {name}")]
    UnknownLayer { name: String },

    #[error("实例已存在: {id}")]
    DuplicateInstance { id: String },

    #[error("实例不存在: {id}")]
    UnknownInstance { id: String },
}
