//! # Router 模块
//!
//! 显示路由：持有所有显示输出，并记录每个图层要绘制到哪些显示器。

use std::collections::HashMap;

use crate::display::{DisplayId, DisplayOutput};

/// 显示路由
#[derive(Default)]
pub struct DisplayRouter {
    outputs: Vec<Box<dyn DisplayOutput>>,
    /// 图层名 -> 目标显示器（每个 ID 至多一次）
    routes: HashMap<String, Vec<DisplayId>>,
}

impl std::fmt::Debug for DisplayRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<DisplayId> = self.outputs.iter().map(|o| o.id()).collect();
        f.debug_struct("DisplayRouter")
            .field("outputs", &ids)
            .field("routes", &self.routes)
            .finish()
    }
}

impl DisplayRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加显示输出；同一 ID 已存在时替换
    pub fn add_output(&mut self, output: Box<dyn DisplayOutput>) {
        let id = output.id();
        if let Some(slot) = self.outputs.iter_mut().find(|o| o.id() == id) {
            *slot = output;
        } else {
            self.outputs.push(output);
        }
    }

    pub fn output(&self, id: DisplayId) -> Option<&dyn DisplayOutput> {
        self.outputs
            .iter()
            .find(|o| o.id() == id)
            .map(|o| o.as_ref())
    }

    pub fn output_mut(&mut self, id: DisplayId) -> Option<&mut (dyn DisplayOutput + 'static)> {
        self.outputs
            .iter_mut()
            .find(|o| o.id() == id)
            .map(|o| o.as_mut())
    }

    /// 显示器像素尺寸
    pub fn size(&self, id: DisplayId) -> Option<(u32, u32)> {
        self.output(id).map(|o| o.size())
    }

    /// 显示器存在且可用
    pub fn is_active(&self, id: DisplayId) -> bool {
        self.output(id).is_some_and(|o| o.is_active())
    }

    /// 把图层路由到单个显示器
    pub fn set_route(&mut self, layer: &str, id: DisplayId) {
        self.set_routes(layer, &[id]);
    }

    /// 把图层路由到多个显示器（镜像）；空切片表示不绘制该图层
    pub fn set_routes(&mut self, layer: &str, ids: &[DisplayId]) {
        let mut targets: Vec<DisplayId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !targets.contains(id) {
                targets.push(*id);
            }
        }
        self.routes.insert(layer.to_string(), targets);
    }

    /// 图层的目标显示器
    pub fn routes(&self, layer: &str) -> &[DisplayId] {
        self.routes.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn remove_layer(&mut self, layer: &str) {
        self.routes.remove(layer);
    }

    /// 清空所有可用显示器
    pub fn clear_all(&mut self) {
        for output in self.outputs.iter_mut().filter(|o| o.is_active()) {
            output.clear();
        }
    }

    /// 呈现所有可用显示器
    pub fn present_all(&mut self) {
        for output in self.outputs.iter_mut().filter(|o| o.is_active()) {
            output.present();
        }
    }
}
