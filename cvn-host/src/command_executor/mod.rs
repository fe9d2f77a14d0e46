//! # Command Executor 模块
//!
//! 请求执行器，负责把 Runtime 发出的 [`SceneRequest`] 应用到渲染器和音频。
//!
//! ## 设计说明
//!
//! - 每个请求尽力执行：失败只记录日志并返回 [`ExecuteResult::Failed`]，
//!   渲染器状态保持不变
//! - 执行器不直接绘制，只更新场景，绘制由 `SceneRenderer::render` 负责
//!
//! ## 模块结构
//!
//! - `audio`: 音频请求
//! - `background`: 背景请求
//! - `character`: 立绘显示/隐藏
//! - `effects`: 屏幕震动
//! - `types`: 类型定义

mod audio;
mod background;
mod character;
mod effects;
mod types;

pub use types::*;

use cvn_runtime::SceneRequest;
use tracing::{debug, warn};

use crate::audio::AudioManager;
use crate::renderer::SceneRenderer;
use crate::resources::ResourceManager;

/// 请求执行器
#[derive(Debug, Default)]
pub struct CommandExecutor {
    stats: ExecuteStats,
}

impl CommandExecutor {
    /// 创建新的执行器
    pub fn new() -> Self {
        Self::default()
    }

    /// 执行单个请求
    pub fn execute(
        &mut self,
        request: &SceneRequest,
        renderer: &mut SceneRenderer,
        resources: &mut ResourceManager,
        audio: &mut AudioManager,
    ) -> ExecuteResult {
        let result = match request {
            SceneRequest::SetBackground { path } => {
                self.execute_set_background(path, renderer, resources)
            }
            SceneRequest::ShowSprite {
                id,
                path,
                layer,
                x,
                y,
                scale,
            } => self.execute_show_sprite(id, path, layer, (*x, *y), *scale, renderer, resources),
            SceneRequest::HideInstance { id } => self.execute_hide_instance(id, renderer),
            SceneRequest::PlayAudio {
                path,
                channel,
                looping,
            } => self.execute_play_audio(path, *channel, *looping, audio),
            SceneRequest::Shake {
                intensity,
                duration,
            } => self.execute_shake(*intensity, *duration, renderer),
        };

        self.stats.executed += 1;
        match result {
            Ok(()) => {
                debug!(?request, "请求已执行");
                ExecuteResult::Ok
            }
            Err(e) => {
                self.stats.failed += 1;
                warn!(?request, error = %e, "请求执行失败");
                ExecuteResult::Failed(e)
            }
        }
    }

    /// 依次执行一批请求
    ///
    /// 某个请求失败不影响后续请求；返回第一个失败。
    pub fn execute_batch(
        &mut self,
        requests: &[SceneRequest],
        renderer: &mut SceneRenderer,
        resources: &mut ResourceManager,
        audio: &mut AudioManager,
    ) -> ExecuteResult {
        let mut first_failure = ExecuteResult::Ok;
        for request in requests {
            let result = self.execute(request, renderer, resources, audio);
            if first_failure.is_ok() && !result.is_ok() {
                first_failure = result;
            }
        }
        first_failure
    }

    pub fn stats(&self) -> ExecuteStats {
        self.stats
    }
}
