//! # Instance 模块
//!
//! 精灵实例。

use super::fade::Fade;
use crate::resources::TextureId;

/// 精灵实例
///
/// 通过 `SceneRenderer::instance_mut` 取得后直接修改字段即可生效。
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// 实例 ID（在所有图层中唯一）
    pub id: String,
    /// 位置（`|v| <= 2.0` 为归一化坐标，否则为像素）
    pub x: f32,
    pub y: f32,
    /// 锚点（0–1）
    pub anchor_x: f32,
    pub anchor_y: f32,
    /// 统一缩放
    pub scale: f32,
    /// 旋转（度，顺时针）
    pub rotation: f32,
    pub alpha: u8,
    /// 颜色调制 `0xRRGGBBAA`（alpha 字节不使用）
    pub tint: u32,
    /// 排序键，升序绘制
    pub z: i32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub(crate) texture: Option<TextureId>,
    /// 纹理自然尺寸缓存
    pub(crate) natural_size: Option<(u32, u32)>,
    pub(crate) active: bool,
    /// 进行中的透明度渐变
    pub(crate) fade: Option<Fade>,
}

impl Instance {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            anchor_x: 0.5,
            anchor_y: 0.5,
            scale: 1.0,
            rotation: 0.0,
            alpha: 255,
            tint: 0xFFFF_FFFF,
            z: 0,
            flip_x: false,
            flip_y: false,
            texture: None,
            natural_size: None,
            active: true,
            fade: None,
        }
    }

    /// 重置为刚创建时的外观（保留 ID 与 z）
    pub(crate) fn reset(&mut self) {
        let z = self.z;
        *self = Self::new(std::mem::take(&mut self.id));
        self.z = z;
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// 更换纹理，同时使尺寸缓存失效
    pub fn set_texture(&mut self, texture: Option<TextureId>) {
        if self.texture != texture {
            self.natural_size = None;
        }
        self.texture = texture;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn natural_size(&self) -> Option<(u32, u32)> {
        self.natural_size
    }

    /// 从当前 alpha 渐变到 `target`
    ///
    /// `speed` 为每秒 alpha 变化量，非正或无穷大时立即完成。
    /// 渐变在 alpha 到达 0 时结束的实例会被隐藏（保留槽位）。
    pub fn fade_to(&mut self, target: u8, speed: f32) {
        self.fade = Some(Fade::new(self.alpha, target, speed));
        self.advance_fade(0.0);
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// 渐变目标；没有进行中的渐变时为 None
    pub fn fade_target(&self) -> Option<u8> {
        self.fade.map(|fade| fade.target())
    }

    pub(crate) fn advance_fade(&mut self, dt: f32) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };
        self.alpha = fade.advance(dt);
        if fade.is_done() {
            self.fade = None;
            if self.alpha == 0 {
                self.active = false;
            }
        }
    }
}
