//! # 背景相关请求执行
//!
//! 处理 SetBackground 请求。

use crate::renderer::{BACKGROUND_INSTANCE_ID, BACKGROUND_LAYER, SceneRenderer, SpritePlacement};
use crate::resources::{ResourceManager, TextureQuery};
use tracing::debug;

use super::CommandExecutor;
use super::types::ExecuteError;

impl CommandExecutor {
    /// 执行 SetBackground
    ///
    /// 背景占用背景层上固定 ID 的实例，铺满该图层的第一个目标显示器。
    pub(super) fn execute_set_background(
        &mut self,
        path: &str,
        renderer: &mut SceneRenderer,
        resources: &mut ResourceManager,
    ) -> Result<(), ExecuteError> {
        let texture = resources.load_texture(path)?;
        let texture_size = resources.texture_size(texture).unwrap_or((0, 0));

        renderer.place_sprite(&SpritePlacement {
            layer: BACKGROUND_LAYER,
            id: BACKGROUND_INSTANCE_ID,
            texture,
            texture_size,
            x: 0.5,
            y: 0.5,
            scale: 1.0,
        })?;

        debug!(path = %path, "背景已切换");
        Ok(())
    }
}
