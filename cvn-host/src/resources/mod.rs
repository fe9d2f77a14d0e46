//! # Resources 模块
//!
//! 资源管理系统，负责纹理的加载、缓存和尺寸查询。
//!
//! 纹理句柄是 [`TextureId`] 整数 ID，由 [`ResourceManager`] 统一持有；
//! 渲染器只通过 [`TextureQuery`] 读取尺寸。

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

mod error;
mod loader;

pub use error::ResourceError;
pub use loader::{ImageLoader, TextureInfo, TextureLoader};

/// 默认纹理缓存容量
pub const DEFAULT_TEXTURE_CAPACITY: usize = 512;

/// 纹理句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// 纹理尺寸查询
pub trait TextureQuery {
    /// 返回纹理的像素尺寸；未知句柄返回 None
    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)>;
}

#[derive(Debug, Clone)]
struct TextureEntry {
    path: String,
    info: TextureInfo,
}

/// 资源管理器
///
/// 负责加载和缓存纹理。缓存键是规范化后的完整路径。
pub struct ResourceManager {
    /// 资源基础路径
    base_path: PathBuf,
    loader: Box<dyn TextureLoader>,
    /// 已加载纹理（下标即 TextureId）
    textures: Vec<TextureEntry>,
    /// 规范化路径 -> TextureId
    by_path: HashMap<String, TextureId>,
    capacity: usize,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("base_path", &self.base_path)
            .field("textures", &self.textures.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ResourceManager {
    /// 创建新的资源管理器
    ///
    /// # 参数
    ///
    /// - `base_path`: 资源文件的基础路径（如 "assets"）
    /// - `loader`: 纹理加载器
    pub fn new(base_path: impl Into<PathBuf>, loader: Box<dyn TextureLoader>) -> Self {
        Self {
            base_path: base_path.into(),
            loader,
            textures: Vec::new(),
            by_path: HashMap::new(),
            capacity: DEFAULT_TEXTURE_CAPACITY,
        }
    }

    /// 设置纹理缓存容量
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 解析资源路径（将相对路径转换为完整路径）
    ///
    /// 绝对路径直接规范化；相对路径拼接到 base_path 之后。
    pub fn resolve_path(&self, path: &str) -> String {
        let path_obj = Path::new(path);
        if path_obj.is_absolute() {
            return normalize_path(path_obj);
        }
        normalize_path(&self.base_path.join(path_obj))
    }

    /// 加载纹理
    ///
    /// 如果纹理已缓存，直接返回缓存的句柄。
    ///
    /// # 参数
    ///
    /// - `path`: 图片文件路径（相对于 base_path 或绝对路径）
    ///
    /// # 返回
    ///
    /// 纹理句柄，或加载错误（缓存已满时返回 `CacheFull`，已有缓存不受影响）
    pub fn load_texture(&mut self, path: &str) -> Result<TextureId, ResourceError> {
        let full_path = self.resolve_path(path);

        if let Some(id) = self.by_path.get(&full_path) {
            return Ok(*id);
        }

        if self.textures.len() >= self.capacity {
            return Err(ResourceError::CacheFull {
                path: full_path,
                limit: self.capacity,
            });
        }

        let info = self.loader.load(Path::new(&full_path))?;
        let id = TextureId(self.textures.len() as u32);
        tracing::debug!(path = %full_path, width = info.width, height = info.height, "纹理已加载");

        self.textures.push(TextureEntry {
            path: full_path.clone(),
            info,
        });
        self.by_path.insert(full_path, id);
        Ok(id)
    }

    /// 纹理对应的完整路径
    pub fn texture_path(&self, id: TextureId) -> Option<&str> {
        self.textures
            .get(id.0 as usize)
            .map(|entry| entry.path.as_str())
    }

    /// 是否已缓存
    pub fn is_cached(&self, path: &str) -> bool {
        self.by_path.contains_key(&self.resolve_path(path))
    }

    /// 已加载的纹理数量
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl TextureQuery for ResourceManager {
    fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(id.0 as usize)
            .map(|entry| (entry.info.width, entry.info.height))
    }
}

/// 规范化路径，处理 `..` 和 `.`，统一使用 `/` 分隔
fn normalize_path(path: &Path) -> String {
    let mut components: Vec<String> = Vec::new();
    let mut rooted = false;

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(p.as_os_str().to_string_lossy().to_string()),
            Component::RootDir => rooted = true,
            Component::CurDir => {}
            Component::ParentDir => {
                // 不越过盘符
                if components.last().is_some_and(|c| !c.ends_with(':')) {
                    components.pop();
                }
            }
            Component::Normal(name) => components.push(name.to_string_lossy().to_string()),
        }
    }

    let joined = components.join("/");
    if rooted && !joined.contains(':') {
        format!("/{joined}")
    } else {
        joined
    }
}
