//! # 立绘相关请求执行
//!
//! 处理 ShowSprite 和 HideInstance 请求。

use crate::renderer::{SceneRenderer, SpritePlacement};
use crate::resources::{ResourceManager, TextureQuery};
use tracing::debug;

use super::CommandExecutor;
use super::types::ExecuteError;

impl CommandExecutor {
    /// 执行 ShowSprite
    ///
    /// 同一 ID 的活动实例原地更新纹理和位置，保留图层与 z。
    #[allow(clippy::too_many_arguments)]
    pub(super) fn execute_show_sprite(
        &mut self,
        id: &str,
        path: &str,
        layer: &str,
        (x, y): (f32, f32),
        scale: f32,
        renderer: &mut SceneRenderer,
        resources: &mut ResourceManager,
    ) -> Result<(), ExecuteError> {
        let texture = resources.load_texture(path)?;
        let texture_size = resources.texture_size(texture).unwrap_or((0, 0));

        renderer.place_sprite(&SpritePlacement {
            layer,
            id,
            texture,
            texture_size,
            x,
            y,
            scale,
        })?;

        debug!(id = %id, path = %path, layer = %layer, "显示立绘");
        Ok(())
    }

    /// 执行 HideInstance
    ///
    /// 实例先淡出，透明度到 0 后才释放槽位。
    pub(super) fn execute_hide_instance(
        &mut self,
        id: &str,
        renderer: &mut SceneRenderer,
    ) -> Result<(), ExecuteError> {
        renderer.hide_instance(id)?;
        debug!(id = %id, "隐藏实例");
        Ok(())
    }
}
