//! # Layer 模块
//!
//! 图层：按插入顺序保存实例，绘制顺序由 z 决定。

use super::instance::Instance;

/// 图层句柄（创建顺序下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

/// 图层
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub(crate) instances: Vec<Instance>,
}

impl Layer {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            instances: Vec::new(),
        }
    }

    /// 所有槽位（包括已隐藏的）
    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// 活动实例
    pub fn active_instances(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter().filter(|i| i.active)
    }

    pub(crate) fn find(&self, id: &str) -> Option<usize> {
        self.instances.iter().position(|i| i.id == id)
    }

    /// 按 z 升序稳定排序（原地）
    pub(crate) fn sort_by_z(&mut self) {
        self.instances.sort_by_key(|i| i.z);
    }

    /// 下一个可用的 z（当前最大值 + 1）
    pub(crate) fn next_z(&self) -> i32 {
        self.instances
            .iter()
            .map(|i| i.z)
            .max()
            .map_or(0, |z| z.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_z_is_stable() {
        let mut layer = Layer::new("actors");
        for (id, z) in [("a", 5), ("b", 1), ("c", 3), ("d", 1)] {
            let mut instance = Instance::new(id);
            instance.z = z;
            layer.instances.push(instance);
        }

        layer.sort_by_z();
        let order: Vec<&str> = layer.instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_next_z() {
        let mut layer = Layer::new("actors");
        assert_eq!(layer.next_z(), 0);
        let mut instance = Instance::new("a");
        instance.z = 7;
        layer.instances.push(instance);
        assert_eq!(layer.next_z(), 8);
    }
}
