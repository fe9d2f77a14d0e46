//! Command Executor 类型定义

use thiserror::Error;

use crate::renderer::RenderError;
use crate::resources::ResourceError;

/// 请求执行结果
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExecuteResult {
    /// 执行成功
    #[default]
    Ok,
    /// 执行失败，效果未应用
    Failed(ExecuteError),
}

impl ExecuteResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// 请求执行错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecuteError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// 执行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecuteStats {
    pub executed: usize,
    pub failed: usize,
}
