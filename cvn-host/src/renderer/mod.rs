//! # Renderer 模块
//!
//! 分层、多显示器的场景渲染器。
//!
//! ## 渲染层顺序
//!
//! 1. 背景层（background）
//! 2. 角色层（actors）
//! 3. 覆盖层（overlay）
//! 4. UI 层（ui）
//!
//! 运行时创建的图层排在默认图层之后。每个图层通过 [`DisplayRouter`]
//! 路由到零个、一个或两个显示器；同一图层内按实例的 z 升序绘制。
//!
//! ## 渐变
//!
//! 立绘显示时从透明淡入，隐藏时淡出到 0 后才释放。更换背景时旧背景
//! 保留在新背景下方，新背景淡入完成后旧背景被隐藏。

use std::time::Duration;

use tracing::{debug, warn};

use crate::display::{DisplayId, DisplayOutput, DrawCall};
use crate::resources::{TextureId, TextureQuery};

mod error;
mod fade;
pub mod geometry;
mod instance;
mod layer;
pub mod router;
mod shake;

pub use error::RenderError;
pub use fade::{Fade, FadeTimings};
pub use instance::Instance;
pub use layer::{Layer, LayerId};
pub use router::DisplayRouter;
pub use shake::ShakeState;

use geometry::{cover_scale, dest_rect, resolve_coord, tint_rgb};

pub const BACKGROUND_LAYER: &str = "background";
pub const ACTORS_LAYER: &str = "actors";
pub const OVERLAY_LAYER: &str = "overlay";
pub const UI_LAYER: &str = "ui";

/// 默认图层（按绘制顺序）
pub const DEFAULT_LAYERS: [&str; 4] = [BACKGROUND_LAYER, ACTORS_LAYER, OVERLAY_LAYER, UI_LAYER];

/// 背景图片使用的实例 ID
pub const BACKGROUND_INSTANCE_ID: &str = "__background__";

/// 交叉淡化期间保留的旧背景
pub const PREVIOUS_BACKGROUND_ID: &str = "__background_prev__";

/// 渲染器容量限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererLimits {
    pub max_layers: usize,
    pub max_instances_per_layer: usize,
}

impl Default for RendererLimits {
    fn default() -> Self {
        Self {
            max_layers: 16,
            max_instances_per_layer: 256,
        }
    }
}

/// 精灵放置参数
#[derive(Debug, Clone, Copy)]
pub struct SpritePlacement<'a> {
    /// 新建实例时使用的图层
    pub layer: &'a str,
    pub id: &'a str,
    pub texture: TextureId,
    /// 纹理像素尺寸
    pub texture_size: (u32, u32),
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// 场景渲染器
#[derive(Debug)]
pub struct SceneRenderer {
    /// 按创建顺序排列的图层
    layers: Vec<Layer>,
    router: DisplayRouter,
    limits: RendererLimits,
    shake: ShakeState,
    fades: FadeTimings,
}

impl SceneRenderer {
    /// 创建渲染器，包含四个默认图层，全部路由到主显示器
    pub fn new(limits: RendererLimits) -> Self {
        let mut router = DisplayRouter::new();
        let layers = DEFAULT_LAYERS
            .iter()
            .map(|name| {
                router.set_route(name, DisplayId::Primary);
                Layer::new(*name)
            })
            .collect();

        Self {
            layers,
            router,
            limits,
            shake: ShakeState::default(),
            fades: FadeTimings::default(),
        }
    }

    /// 使用指定的渐变时长
    pub fn with_fade_timings(mut self, fades: FadeTimings) -> Self {
        self.fades = fades;
        self
    }

    pub fn fade_timings(&self) -> FadeTimings {
        self.fades
    }

    pub fn set_fade_timings(&mut self, fades: FadeTimings) {
        self.fades = fades;
    }

    pub fn limits(&self) -> RendererLimits {
        self.limits
    }

    pub fn router(&self) -> &DisplayRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut DisplayRouter {
        &mut self.router
    }

    /// 添加显示输出（同一 ID 已存在时替换）
    pub fn add_output(&mut self, output: Box<dyn DisplayOutput>) {
        self.router.add_output(output);
    }

    // ========== 图层 ==========

    /// 创建图层，排在所有已有图层之后
    ///
    /// # 返回
    ///
    /// 新图层的句柄；超过上限返回 `LayerCapacity`，重名返回 `DuplicateLayer`
    pub fn create_layer(&mut self, name: &str, target: DisplayId) -> Result<LayerId, RenderError> {
        if self.layer_index(name).is_some() {
            return Err(RenderError::DuplicateLayer {
                name: name.to_string(),
            });
        }
        if self.layers.len() >= self.limits.max_layers {
            return Err(RenderError::LayerCapacity {
                limit: self.limits.max_layers,
            });
        }

        self.layers.push(Layer::new(name));
        self.router.set_route(name, target);
        debug!(layer = %name, display = %target, "创建图层");
        Ok(LayerId(self.layers.len() - 1))
    }

    /// 删除图层及其所有实例
    pub fn remove_layer(&mut self, name: &str) -> Result<(), RenderError> {
        let index = self.require_layer(name)?;
        self.layers.remove(index);
        self.router.remove_layer(name);
        Ok(())
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// 把图层改为只绘制到 `display`
    pub fn set_layer_display(&mut self, name: &str, display: DisplayId) -> Result<(), RenderError> {
        self.route_layer(name, &[display])
    }

    /// 把图层路由到多个显示器；空切片表示不绘制
    pub fn route_layer(&mut self, name: &str, displays: &[DisplayId]) -> Result<(), RenderError> {
        self.require_layer(name)?;
        self.router.set_routes(name, displays);
        Ok(())
    }

    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> Result<(), RenderError> {
        let index = self.require_layer(name)?;
        self.layers[index].visible = visible;
        Ok(())
    }

    // ========== 实例 ==========

    /// 在图层上创建实例
    ///
    /// 活动实例重名返回 `DuplicateInstance`。同名的已隐藏槽位会被复用：
    /// 在同一图层时原地重置（保留 z），在其它图层时先移除旧槽位。
    /// 图层满时回收一个已隐藏的槽位，没有可回收的则返回 `InstanceCapacity`。
    pub fn create_instance(&mut self, layer: &str, id: &str) -> Result<&mut Instance, RenderError> {
        let layer_index = self.require_layer(layer)?;

        let stale = match self.locate(id) {
            Some((li, ii)) if self.layers[li].instances[ii].active => {
                return Err(RenderError::DuplicateInstance { id: id.to_string() });
            }
            Some((li, ii)) if li == layer_index => {
                let instance = &mut self.layers[li].instances[ii];
                instance.reset();
                return Ok(instance);
            }
            other => other,
        };

        let limit = self.limits.max_instances_per_layer;
        let target = &self.layers[layer_index];
        let reclaim = if target.instances.len() >= limit {
            match target.instances.iter().position(|i| !i.active) {
                Some(position) => Some(position),
                None => {
                    return Err(RenderError::InstanceCapacity {
                        layer: layer.to_string(),
                        limit,
                    });
                }
            }
        } else {
            None
        };

        if let Some((li, ii)) = stale {
            self.layers[li].instances.remove(ii);
        }

        let target = &mut self.layers[layer_index];
        if let Some(position) = reclaim {
            target.instances.remove(position);
        }

        let mut instance = Instance::new(id);
        instance.z = target.next_z();
        let index = target.instances.len();
        target.instances.push(instance);
        Ok(&mut target.instances[index])
    }

    /// 按 ID 查找实例（包括已隐藏的槽位）
    pub fn instance(&self, id: &str) -> Option<&Instance> {
        self.locate(id)
            .map(|(li, ii)| &self.layers[li].instances[ii])
    }

    pub fn instance_mut(&mut self, id: &str) -> Option<&mut Instance> {
        self.locate(id)
            .map(|(li, ii)| &mut self.layers[li].instances[ii])
    }

    /// 实例所在图层名
    pub fn instance_layer(&self, id: &str) -> Option<&str> {
        self.locate(id).map(|(li, _)| self.layers[li].name.as_str())
    }

    /// 提交实例修改
    ///
    /// 字段修改在下一次 `draw` 时直接生效，这里什么也不做。
    pub fn commit_instance(&mut self, _id: &str) {}

    /// 隐藏实例（保留槽位，之后以同一 ID 显示时复用）
    pub fn remove_instance(&mut self, id: &str) -> Result<(), RenderError> {
        match self.instance_mut(id) {
            Some(instance) if instance.active => {
                instance.active = false;
                instance.fade = None;
                Ok(())
            }
            _ => Err(RenderError::UnknownInstance { id: id.to_string() }),
        }
    }

    /// 淡出后隐藏实例
    ///
    /// 淡出期间实例仍是活动的，期间再次显示会从当前透明度淡入回来。
    pub fn hide_instance(&mut self, id: &str) -> Result<(), RenderError> {
        let speed = self.fades.sprite_speed();
        self.fade_instance(id, 0, speed)
    }

    /// 把活动实例渐变到 `target`（`speed` 为每秒 alpha 变化量）
    pub fn fade_instance(&mut self, id: &str, target: u8, speed: f32) -> Result<(), RenderError> {
        match self.instance_mut(id) {
            Some(instance) if instance.active => {
                instance.fade_to(target, speed);
                Ok(())
            }
            _ => Err(RenderError::UnknownInstance { id: id.to_string() }),
        }
    }

    /// 背景是否正在交叉淡化
    pub fn is_background_transitioning(&self) -> bool {
        self.instance(PREVIOUS_BACKGROUND_ID)
            .is_some_and(|previous| previous.active)
    }

    /// 活动实例总数
    pub fn active_instance_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.active_instances().count())
            .sum()
    }

    /// 显示精灵：已有活动实例时原地更新（保留图层和 z），否则新建
    ///
    /// 背景层上的精灵按铺满缩放，位置与锚点固定为 (0.5, 0.5)，不淡入；
    /// 更换背景纹理时与旧背景交叉淡化。其它图层上新显示的精灵从透明淡入，
    /// 正在淡出的精灵淡入回来。
    pub fn place_sprite(&mut self, placement: &SpritePlacement<'_>) -> Result<(), RenderError> {
        let existing = self
            .locate(placement.id)
            .filter(|&(li, ii)| self.layers[li].instances[ii].active);
        let was_active = existing.is_some();

        let (li, ii) = match existing {
            Some(found) => {
                if self.layers[found.0].name != placement.layer {
                    debug!(
                        id = %placement.id,
                        layer = %self.layers[found.0].name,
                        requested = %placement.layer,
                        "实例已存在，保留原图层"
                    );
                }
                found
            }
            None => {
                self.create_instance(placement.layer, placement.id)?;
                self.locate(placement.id)
                    .ok_or_else(|| RenderError::UnknownInstance {
                        id: placement.id.to_string(),
                    })?
            }
        };

        let on_background = self.layers[li].name == BACKGROUND_LAYER;
        let wants_crossfade = on_background
            && was_active
            && placement.id == BACKGROUND_INSTANCE_ID
            && self.fades.background_seconds > 0.0
            && self.layers[li].instances[ii].texture != Some(placement.texture);
        let crossfade = wants_crossfade && self.keep_previous_background(li, ii);

        let fit = if on_background {
            Some(
                self.fit_display_size(BACKGROUND_LAYER)
                    .map(|size| cover_scale(placement.texture_size, size)),
            )
        } else {
            None
        };

        let instance = &mut self.layers[li].instances[ii];
        instance.set_texture(Some(placement.texture));
        instance.natural_size = Some(placement.texture_size);

        match fit {
            Some(scale) => {
                instance.scale = scale.unwrap_or(placement.scale);
                instance.x = 0.5;
                instance.y = 0.5;
                instance.anchor_x = 0.5;
                instance.anchor_y = 0.5;
            }
            None => {
                instance.x = placement.x;
                instance.y = placement.y;
                instance.scale = placement.scale;
            }
        }

        if crossfade {
            instance.alpha = 0;
            instance.fade_to(255, self.fades.background_speed());
        } else if !on_background && (!was_active || instance.is_fading()) {
            if !was_active {
                instance.alpha = 0;
            }
            instance.fade_to(255, self.fades.sprite_speed());
        }
        Ok(())
    }

    // ========== 帧 ==========

    /// 推进计时器：震动、实例渐变与背景交叉淡化
    pub fn update(&mut self, dt: f32) {
        self.shake.update(dt);
        for instance in self.layers.iter_mut().flat_map(|l| l.instances.iter_mut()) {
            instance.advance_fade(dt);
        }

        let settled = self
            .instance(BACKGROUND_INSTANCE_ID)
            .is_none_or(|background| !background.active || !background.is_fading());
        if settled
            && let Some(previous) = self.instance_mut(PREVIOUS_BACKGROUND_ID)
            && previous.active
        {
            previous.active = false;
            debug!("背景过渡完成");
        }
    }

    pub fn start_shake(&mut self, intensity: u32, duration: Duration) {
        self.shake.start(intensity, duration);
    }

    pub fn shake(&self) -> &ShakeState {
        &self.shake
    }

    /// 清空所有可用显示器
    pub fn clear(&mut self) {
        self.router.clear_all();
    }

    /// 把所有图层绘制到路由的显示器
    ///
    /// 每个图层在绘制前按 z 原地稳定排序；纹理尺寸首次查询后缓存在实例上。
    pub fn draw(&mut self, textures: &dyn TextureQuery) {
        let shake_offset = self.shake.offset();
        let Self { layers, router, .. } = self;

        for layer in layers.iter_mut() {
            if !layer.visible {
                continue;
            }

            let targets: Vec<(DisplayId, (u32, u32))> = router
                .routes(&layer.name)
                .iter()
                .filter(|id| router.is_active(**id))
                .filter_map(|id| router.size(*id).map(|size| (*id, size)))
                .collect();
            if targets.is_empty() {
                continue;
            }

            layer.sort_by_z();
            let (offset_x, offset_y) = if layer.name == UI_LAYER {
                (0, 0)
            } else {
                shake_offset
            };

            for instance in layer.instances.iter_mut().filter(|i| i.active) {
                let Some(texture) = instance.texture else {
                    continue;
                };
                let natural = match instance.natural_size {
                    Some(size) => size,
                    None => match textures.texture_size(texture) {
                        Some(size) => {
                            instance.natural_size = Some(size);
                            size
                        }
                        None => {
                            debug!(id = %instance.id, "纹理尺寸未知，跳过绘制");
                            continue;
                        }
                    },
                };

                let scaled = (
                    natural.0 as f32 * instance.scale,
                    natural.1 as f32 * instance.scale,
                );

                for (display, (width, height)) in &targets {
                    let position = (
                        resolve_coord(instance.x, *width) + offset_x as f32,
                        resolve_coord(instance.y, *height) + offset_y as f32,
                    );
                    let call = DrawCall {
                        layer: layer.name.clone(),
                        instance: instance.id.clone(),
                        texture,
                        dest: dest_rect(position, scaled, (instance.anchor_x, instance.anchor_y)),
                        rotation: instance.rotation,
                        flip_x: instance.flip_x,
                        flip_y: instance.flip_y,
                        color_mod: tint_rgb(instance.tint),
                        alpha: instance.alpha,
                    };
                    if let Some(output) = router.output_mut(*display) {
                        output.draw(&call);
                    }
                }
            }
        }
    }

    /// 呈现所有可用显示器
    pub fn present(&mut self) {
        self.router.present_all();
    }

    /// clear → draw → present
    pub fn render(&mut self, textures: &dyn TextureQuery) {
        self.clear();
        self.draw(textures);
        self.present();
    }

    // ========== 内部 ==========

    fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    fn require_layer(&self, name: &str) -> Result<usize, RenderError> {
        self.layer_index(name).ok_or_else(|| {
            warn!(layer = %name, "图层不存在");
            RenderError::UnknownLayer {
                name: name.to_string(),
            }
        })
    }

    /// 实例所在的 (图层下标, 槽位下标)
    fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.layers
            .iter()
            .enumerate()
            .find_map(|(li, layer)| layer.find(id).map(|ii| (li, ii)))
    }

    /// 把当前背景复制为旧背景，放在当前背景下方
    ///
    /// 图层已满且没有旧背景槽位时返回 false（直接切换，不做过渡）。
    fn keep_previous_background(&mut self, li: usize, ii: usize) -> bool {
        let limit = self.limits.max_instances_per_layer;
        let layer = &mut self.layers[li];

        let mut previous = layer.instances[ii].clone();
        previous.id = PREVIOUS_BACKGROUND_ID.to_string();
        previous.z = previous.z.saturating_sub(1);
        previous.alpha = 255;
        previous.fade = None;
        previous.active = true;

        match layer.find(PREVIOUS_BACKGROUND_ID) {
            Some(slot) => layer.instances[slot] = previous,
            None if layer.instances.len() < limit => layer.instances.push(previous),
            None => return false,
        }
        true
    }

    /// 图层铺满计算使用的显示器尺寸：第一个路由目标，未路由时使用主显示器
    fn fit_display_size(&self, layer: &str) -> Option<(u32, u32)> {
        let display = self
            .router
            .routes(layer)
            .first()
            .copied()
            .unwrap_or(DisplayId::Primary);
        self.router.size(display)
    }
}
