//! # Request 模块
//!
//! 定义 Runtime 向 Host 发出的场景请求。
//!
//! 请求只携带已解析的素材路径与归一化坐标，Host 的执行器据此修改渲染器与音频。
//! 所有请求都是尽力而为的：失败由 Host 记录日志，不会回传给 Runtime。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `show` 未指定图层时使用的图层
pub const DEFAULT_SPRITE_LAYER: &str = "actors";

/// 立绘默认纵坐标（归一化）
pub const SPRITE_Y: f32 = 0.8;

/// 立绘默认缩放
pub const SPRITE_SCALE: f32 = 0.85;

/// 音频通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioChannel {
    /// 背景音乐（同一时刻只有一首）
    Music,
    /// 音效
    Sfx,
}

impl AudioChannel {
    /// 根据素材类型选择通道：`music` / `bgm` 为音乐，其余为音效
    pub fn for_asset_type(asset_type: &str) -> Self {
        if asset_type.eq_ignore_ascii_case("music") || asset_type.eq_ignore_ascii_case("bgm") {
            Self::Music
        } else {
            Self::Sfx
        }
    }
}

/// Runtime 向 Host 发出的场景请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneRequest {
    /// 设置背景（铺满主显示器）
    SetBackground { path: String },

    /// 显示或更新立绘
    ShowSprite {
        id: String,
        path: String,
        layer: String,
        x: f32,
        y: f32,
        scale: f32,
    },

    /// 隐藏实例
    HideInstance { id: String },

    /// 播放音频
    PlayAudio {
        path: String,
        channel: AudioChannel,
        looping: bool,
    },

    /// 屏幕震动
    Shake { intensity: u32, duration: Duration },
}
