//! # Audio 模块
//!
//! 音频管理：区分 BGM 与音效通道，音量与静音在这里计算，
//! 实际解码与播放交给 [`AudioSink`] 实现。

use std::path::{Path, PathBuf};

use cvn_runtime::AudioChannel;
use tracing::debug;

use crate::config::AudioConfig;
use crate::resources::ResourceError;

/// 音频输出
pub trait AudioSink {
    /// 在 `channel` 上播放 `path`
    ///
    /// BGM 通道同一时间只有一首，新的播放会替换旧的。
    fn play(
        &mut self,
        path: &Path,
        channel: AudioChannel,
        looping: bool,
        volume: f32,
    ) -> Result<(), ResourceError>;

    /// 停止通道上的所有声音
    fn stop(&mut self, channel: AudioChannel);

    /// 调整通道音量
    fn set_volume(&mut self, channel: AudioChannel, volume: f32);
}

/// 不发声的音频输出（headless 运行使用）
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn play(
        &mut self,
        path: &Path,
        channel: AudioChannel,
        looping: bool,
        volume: f32,
    ) -> Result<(), ResourceError> {
        debug!(path = %path.display(), ?channel, looping, volume, "播放音频（静音输出）");
        Ok(())
    }

    fn stop(&mut self, _channel: AudioChannel) {}

    fn set_volume(&mut self, _channel: AudioChannel, _volume: f32) {}
}

/// 音频管理器
pub struct AudioManager {
    sink: Box<dyn AudioSink>,
    /// 资源基础路径
    base_path: PathBuf,
    /// 当前 BGM 的完整路径
    current_music: Option<String>,
    master_volume: f32,
    bgm_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("base_path", &self.base_path)
            .field("current_music", &self.current_music)
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    /// 创建新的音频管理器
    pub fn new(base_path: impl Into<PathBuf>, sink: Box<dyn AudioSink>, config: &AudioConfig) -> Self {
        Self {
            sink,
            base_path: base_path.into(),
            current_music: None,
            master_volume: config.master_volume.clamp(0.0, 1.0),
            bgm_volume: config.bgm_volume.clamp(0.0, 1.0),
            sfx_volume: config.sfx_volume.clamp(0.0, 1.0),
            muted: config.muted,
        }
    }

    /// 解析音频路径
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path_obj = Path::new(path);
        if path_obj.is_absolute() {
            path_obj.to_path_buf()
        } else {
            self.base_path.join(path_obj)
        }
    }

    /// 播放音频
    ///
    /// # 参数
    ///
    /// - `path`: 音频路径（相对于 base_path 或绝对路径）
    /// - `channel`: BGM 或音效
    /// - `looping`: 是否循环
    ///
    /// 正在循环播放的 BGM 再次请求时不会重新开始。
    pub fn play(&mut self, path: &str, channel: AudioChannel, looping: bool) -> Result<(), ResourceError> {
        let full_path = self.resolve_path(path);
        let key = full_path.to_string_lossy().to_string();

        match channel {
            AudioChannel::Music => {
                if looping && self.current_music.as_deref() == Some(key.as_str()) {
                    debug!(path = %key, "BGM 已在播放，跳过");
                    return Ok(());
                }
                self.sink.stop(AudioChannel::Music);
                self.current_music = None;
                self.sink
                    .play(&full_path, channel, looping, self.effective_volume(channel))?;
                self.current_music = Some(key);
            }
            AudioChannel::Sfx => {
                if self.muted {
                    return Ok(());
                }
                self.sink
                    .play(&full_path, channel, looping, self.effective_volume(channel))?;
            }
        }
        Ok(())
    }

    /// 停止 BGM
    pub fn stop_music(&mut self) {
        self.sink.stop(AudioChannel::Music);
        self.current_music = None;
    }

    /// 当前 BGM 路径
    pub fn current_music(&self) -> Option<&str> {
        self.current_music.as_deref()
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        let volume = self.effective_volume(AudioChannel::Music);
        self.sink.set_volume(AudioChannel::Music, volume);
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.muted);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// 设置 BGM 音量
    pub fn set_bgm_volume(&mut self, volume: f32) {
        self.bgm_volume = volume.clamp(0.0, 1.0);
        let volume = self.effective_volume(AudioChannel::Music);
        self.sink.set_volume(AudioChannel::Music, volume);
    }

    /// 设置 SFX 音量
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    pub fn bgm_volume(&self) -> f32 {
        self.bgm_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.sfx_volume
    }

    /// 有效音量（考虑主音量与静音）
    pub fn effective_volume(&self, channel: AudioChannel) -> f32 {
        if self.muted {
            return 0.0;
        }
        let channel_volume = match channel {
            AudioChannel::Music => self.bgm_volume,
            AudioChannel::Sfx => self.sfx_volume,
        };
        self.master_volume * channel_volume
    }
}
