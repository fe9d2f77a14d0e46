//! # 效果相关请求执行

use std::time::Duration;

use crate::renderer::SceneRenderer;

use super::CommandExecutor;
use super::types::ExecuteError;

impl CommandExecutor {
    /// 执行 Shake
    pub(super) fn execute_shake(
        &mut self,
        intensity: u32,
        duration: Duration,
        renderer: &mut SceneRenderer,
    ) -> Result<(), ExecuteError> {
        renderer.start_shake(intensity, duration);
        Ok(())
    }
}
