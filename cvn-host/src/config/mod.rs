//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::display::DisplayId;
use crate::renderer::{DEFAULT_LAYERS, FadeTimings, RendererLimits, UI_LAYER};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 资源根目录
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 入口脚本路径（相对于 assets_root）
    #[serde(default = "default_start_script_path")]
    pub start_script_path: String,

    /// 脚本为空时显示的文本
    #[serde(default = "default_placeholder_text")]
    pub placeholder_text: String,

    /// 显示器配置
    #[serde(default)]
    pub displays: DisplaysConfig,

    /// 图层路由（图层名 -> 显示器）
    ///
    /// 未列出的图层显示在主显示器上。
    #[serde(default = "default_routing")]
    pub routing: BTreeMap<String, Vec<DisplayId>>,

    /// 逐字显示配置
    #[serde(default)]
    pub typewriter: TypewriterConfig,

    /// 立绘与背景过渡
    #[serde(default)]
    pub transitions: TransitionConfig,

    /// 容量限制
    #[serde(default)]
    pub limits: LimitsConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 显示器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaysConfig {
    #[serde(default = "default_primary_display")]
    pub primary: DisplayConfig,

    #[serde(default = "default_secondary_display")]
    pub secondary: DisplayConfig,
}

/// 单个显示器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// 逐字显示配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypewriterConfig {
    /// 每个字符的显示时间（秒），0 表示立即显示
    #[serde(default = "default_seconds_per_char")]
    pub seconds_per_char: f32,
}

/// 过渡配置（秒，0 表示立即切换）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    #[serde(default = "default_sprite_fade_seconds")]
    pub sprite_fade_seconds: f32,

    #[serde(default = "default_background_fade_seconds")]
    pub background_fade_seconds: f32,
}

/// 容量限制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_layers")]
    pub layers: usize,

    #[serde(default = "default_max_instances")]
    pub instances_per_layer: usize,

    #[serde(default = "default_max_textures")]
    pub textures: usize,
}

/// 音频配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// 主音量 (0.0 - 1.0)
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,

    /// BGM 音量 (0.0 - 1.0)
    #[serde(default = "default_bgm_volume")]
    pub bgm_volume: f32,

    /// SFX 音量 (0.0 - 1.0)
    #[serde(default = "default_sfx_volume")]
    pub sfx_volume: f32,

    /// 是否静音
    #[serde(default)]
    pub muted: bool,
}

/// 调试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 启动时对入口脚本做静态检查
    #[serde(default = "default_script_check")]
    pub script_check: bool,
}

// 默认值函数
fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_start_script_path() -> String {
    "scripts/main.cvn".to_string()
}

fn default_placeholder_text() -> String {
    "（脚本为空）".to_string()
}

fn default_true() -> bool {
    true
}

fn default_primary_display() -> DisplayConfig {
    DisplayConfig {
        width: 1920,
        height: 1080,
        enabled: true,
    }
}

fn default_secondary_display() -> DisplayConfig {
    DisplayConfig {
        width: 1280,
        height: 720,
        enabled: false,
    }
}

fn default_routing() -> BTreeMap<String, Vec<DisplayId>> {
    let mut routing = BTreeMap::new();
    routing.insert(UI_LAYER.to_string(), vec![DisplayId::Secondary]);
    routing
}

fn default_seconds_per_char() -> f32 {
    cvn_runtime::typewriter::DEFAULT_SECONDS_PER_CHAR
}

fn default_sprite_fade_seconds() -> f32 {
    FadeTimings::default().sprite_seconds
}

fn default_background_fade_seconds() -> f32 {
    FadeTimings::default().background_seconds
}

fn default_max_layers() -> usize {
    16
}

fn default_max_instances() -> usize {
    256
}

fn default_max_textures() -> usize {
    crate::resources::DEFAULT_TEXTURE_CAPACITY
}

fn default_master_volume() -> f32 {
    1.0
}

fn default_bgm_volume() -> f32 {
    0.8
}

fn default_sfx_volume() -> f32 {
    1.0
}

fn default_script_check() -> bool {
    // 在 debug build 时默认开启脚本检查
    cfg!(debug_assertions)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            start_script_path: default_start_script_path(),
            placeholder_text: default_placeholder_text(),
            displays: DisplaysConfig::default(),
            routing: default_routing(),
            typewriter: TypewriterConfig::default(),
            transitions: TransitionConfig::default(),
            limits: LimitsConfig::default(),
            audio: AudioConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DisplaysConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_display(),
            secondary: default_secondary_display(),
        }
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            seconds_per_char: default_seconds_per_char(),
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            sprite_fade_seconds: default_sprite_fade_seconds(),
            background_fade_seconds: default_background_fade_seconds(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            layers: default_max_layers(),
            instances_per_layer: default_max_instances(),
            textures: default_max_textures(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            bgm_volume: default_bgm_volume(),
            sfx_volume: default_sfx_volume(),
            muted: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            script_check: default_script_check(),
        }
    }
}

impl DisplaysConfig {
    pub fn get(&self, id: DisplayId) -> &DisplayConfig {
        match id {
            DisplayId::Primary => &self.primary,
            DisplayId::Secondary => &self.secondary,
        }
    }

    /// 已启用的显示器
    pub fn enabled(&self) -> Vec<(DisplayId, DisplayConfig)> {
        [DisplayId::Primary, DisplayId::Secondary]
            .into_iter()
            .filter(|id| self.get(*id).enabled)
            .map(|id| (id, *self.get(id)))
            .collect()
    }
}

impl TransitionConfig {
    pub fn fade_timings(&self) -> FadeTimings {
        FadeTimings {
            sprite_seconds: self.sprite_fade_seconds,
            background_seconds: self.background_fade_seconds,
        }
    }
}

impl LimitsConfig {
    pub fn renderer_limits(&self) -> RendererLimits {
        RendererLimits {
            max_layers: self.layers,
            max_instances_per_layer: self.instances_per_layer,
        }
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 入口脚本完整路径
    pub fn start_script_full_path(&self) -> PathBuf {
        self.assets_root.join(&self.start_script_path)
    }

    /// 实际生效的图层路由
    ///
    /// 指向未启用显示器的目标会被去掉；若因此没有任何目标，改为主显示器。
    /// 显式配置为空列表的图层保持不绘制。
    pub fn effective_routes(&self) -> BTreeMap<String, Vec<DisplayId>> {
        self.routing
            .iter()
            .map(|(layer, targets)| {
                let enabled: Vec<DisplayId> = targets
                    .iter()
                    .copied()
                    .filter(|id| self.displays.get(*id).enabled)
                    .collect();
                let resolved = if enabled.is_empty() && !targets.is_empty() {
                    vec![DisplayId::Primary]
                } else {
                    enabled
                };
                (layer.clone(), resolved)
            })
            .collect()
    }

    /// 验证配置有效性
    ///
    /// 只检查取值本身，不访问文件系统。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_script_path.is_empty() {
            return Err(ConfigError::Validation(
                "必须配置 start_script_path（入口脚本路径）".to_string(),
            ));
        }

        if !self.displays.primary.enabled {
            return Err(ConfigError::Validation("主显示器必须启用".to_string()));
        }

        for (id, display) in self.displays.enabled() {
            if display.width == 0 || display.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "显示器 {id} 的尺寸不能为 0"
                )));
            }
        }

        if !self.typewriter.seconds_per_char.is_finite() || self.typewriter.seconds_per_char < 0.0
        {
            return Err(ConfigError::Validation(
                "seconds_per_char 不能为负数".to_string(),
            ));
        }

        for (name, seconds) in [
            ("sprite_fade_seconds", self.transitions.sprite_fade_seconds),
            ("background_fade_seconds", self.transitions.background_fade_seconds),
        ] {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ConfigError::Validation(format!("{name} 不能为负数")));
            }
        }

        if self.limits.layers < DEFAULT_LAYERS.len() {
            return Err(ConfigError::Validation(format!(
                "图层上限不能小于默认图层数量 {}",
                DEFAULT_LAYERS.len()
            )));
        }

        if self.limits.instances_per_layer == 0 || self.limits.textures == 0 {
            return Err(ConfigError::Validation(
                "实例与纹理上限必须大于 0".to_string(),
            ));
        }

        for (name, volume) in [
            ("主音量", self.audio.master_volume),
            ("BGM 音量", self.audio.bgm_volume),
            ("SFX 音量", self.audio.sfx_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Validation(format!(
                    "{name}必须在 0.0 - 1.0 之间"
                )));
            }
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置验证失败: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.displays.primary.width, 1920);
        assert_eq!(config.displays.primary.height, 1080);
        assert!(!config.displays.secondary.enabled);
        assert_eq!(config.start_script_path, "scripts/main.cvn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "start_script_path": "story.cvn",
            "displays": { "secondary": { "width": 800, "height": 480 } },
            "typewriter": {}
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.start_script_path, "story.cvn");
        assert_eq!(config.assets_root, PathBuf::from("assets"));
        assert!(config.displays.secondary.enabled);
        assert_eq!(config.displays.secondary.width, 800);
        assert_eq!(config.displays.primary.width, 1920);
        assert_eq!(config.typewriter.seconds_per_char, 0.03);
        assert_eq!(config.transitions.fade_timings(), FadeTimings::default());
        assert_eq!(config.limits.layers, 16);
        assert_eq!(
            config.routing.get("ui"),
            Some(&vec![DisplayId::Secondary])
        );
    }

    #[test]
    fn test_effective_routes_fallback() {
        let mut config = AppConfig::default();
        config
            .routing
            .insert("overlay".to_string(), Vec::new());

        let routes = config.effective_routes();
        assert_eq!(routes.get("ui"), Some(&vec![DisplayId::Primary]));
        assert_eq!(routes.get("overlay"), Some(&Vec::new()));

        config.displays.secondary.enabled = true;
        let routes = config.effective_routes();
        assert_eq!(routes.get("ui"), Some(&vec![DisplayId::Secondary]));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.audio.bgm_volume = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = AppConfig::default();
        config.limits.layers = 2;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.typewriter.seconds_per_char = -1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.displays.primary.enabled = false;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.transitions.background_fade_seconds = -0.5;
        assert!(config.validate().is_err());
        config.transitions.background_fade_seconds = 0.0;
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.start_script_path.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.placeholder_text = "空".to_string();
        config.displays.secondary.enabled = true;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.placeholder_text, "空");
        assert!(loaded.displays.secondary.enabled);
    }

    #[test]
    fn test_load_missing_or_broken_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = AppConfig::load(dir.path().join("nope.json"));
        assert_eq!(missing.start_script_path, "scripts/main.cvn");

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let loaded = AppConfig::load(&broken);
        assert_eq!(loaded.displays.primary.width, 1920);
    }
}
