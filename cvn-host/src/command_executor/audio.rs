//! # 音频相关请求执行

use cvn_runtime::AudioChannel;

use crate::audio::AudioManager;

use super::CommandExecutor;
use super::types::ExecuteError;

impl CommandExecutor {
    /// 执行 PlayAudio
    pub(super) fn execute_play_audio(
        &mut self,
        path: &str,
        channel: AudioChannel,
        looping: bool,
        audio: &mut AudioManager,
    ) -> Result<(), ExecuteError> {
        audio.play(path, channel, looping)?;
        Ok(())
    }
}
