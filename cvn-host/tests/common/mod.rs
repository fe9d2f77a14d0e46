//! 集成测试共用的假后端

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use cvn_host::resources::TextureInfo;
use cvn_host::{AudioSink, ResourceError, TextureLoader};
use cvn_runtime::AudioChannel;

/// 按路径返回固定尺寸的纹理加载器
///
/// 路径包含 `missing` 时返回 NotFound；包含 `bg` 时为 100×50，其余为 200×400。
#[derive(Debug, Default)]
pub struct FakeLoader;

impl TextureLoader for FakeLoader {
    fn load(&mut self, path: &Path) -> Result<TextureInfo, ResourceError> {
        let text = path.to_string_lossy();
        if text.contains("missing") {
            return Err(ResourceError::NotFound {
                path: text.to_string(),
            });
        }
        if text.contains("bg") {
            Ok(TextureInfo {
                width: 100,
                height: 50,
            })
        } else {
            Ok(TextureInfo {
                width: 200,
                height: 400,
            })
        }
    }
}

/// 记录的播放调用 (路径, 通道, 循环)
pub type PlayLog = Rc<RefCell<Vec<(String, AudioChannel, bool)>>>;

pub struct RecordingAudio {
    pub played: PlayLog,
}

impl RecordingAudio {
    pub fn new() -> (Self, PlayLog) {
        let played = PlayLog::default();
        (
            Self {
                played: Rc::clone(&played),
            },
            played,
        )
    }
}

impl AudioSink for RecordingAudio {
    fn play(
        &mut self,
        path: &Path,
        channel: AudioChannel,
        looping: bool,
        _volume: f32,
    ) -> Result<(), ResourceError> {
        self.played
            .borrow_mut()
            .push((path.to_string_lossy().replace('\\', "/"), channel, looping));
        Ok(())
    }

    fn stop(&mut self, _channel: AudioChannel) {}

    fn set_volume(&mut self, _channel: AudioChannel, _volume: f32) {}
}
