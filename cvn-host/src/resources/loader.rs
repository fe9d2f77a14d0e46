//! # Loader 模块
//!
//! 纹理解码的抽象。核心只关心纹理的像素尺寸，像素上传由具体的显示后端负责。

use std::path::Path;

use super::ResourceError;

/// 解码后的纹理信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
}

/// 纹理加载器
pub trait TextureLoader {
    /// 读取 `path` 处的图片
    fn load(&mut self, path: &Path) -> Result<TextureInfo, ResourceError>;
}

/// 基于 image crate 的加载器
///
/// 只读取图片头部获取尺寸，支持 JPEG、PNG、WebP。
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageLoader;

impl TextureLoader for ImageLoader {
    fn load(&mut self, path: &Path) -> Result<TextureInfo, ResourceError> {
        if !path.is_file() {
            return Err(ResourceError::NotFound {
                path: path.display().to_string(),
            });
        }

        let (width, height) =
            image::image_dimensions(path).map_err(|e| ResourceError::LoadFailed {
                path: path.display().to_string(),
                kind: "texture".to_string(),
                message: e.to_string(),
            })?;

        Ok(TextureInfo { width, height })
    }
}
