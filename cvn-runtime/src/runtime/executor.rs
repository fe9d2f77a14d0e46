//! # Executor 模块
//!
//! 将单条脚本指令转换为场景请求。
//!
//! ## 职责
//!
//! - 读取 Command
//! - 解析素材、计算立绘坐标，产生对应的 SceneRequest
//! - 决定是否需要等待、跳转或结束

use tracing::debug;

use crate::error::RuntimeError;
use crate::request::{AudioChannel, DEFAULT_SPRITE_LAYER, SPRITE_SCALE, SPRITE_Y, SceneRequest};
use crate::script::{Command, END_LABEL, ScriptDocument};
use crate::state::{DialogueLine, InterpreterState, WaitingReason};

/// 执行结果
#[derive(Debug, Default)]
pub struct ExecuteResult {
    /// 产生的请求
    pub requests: Vec<SceneRequest>,
    /// 等待原因（如果需要等待）
    pub waiting: Option<WaitingReason>,
    /// 跳转目标（如果需要跳转）
    pub jump_to: Option<usize>,
    /// 新的对话行
    pub line: Option<DialogueLine>,
    /// 是否结束脚本
    pub finished: bool,
}

impl ExecuteResult {
    /// 创建空结果
    fn empty() -> Self {
        Self::default()
    }

    /// 创建带请求的结果
    fn with_request(request: SceneRequest) -> Self {
        Self {
            requests: vec![request],
            ..Self::default()
        }
    }

    /// 创建带等待的结果
    fn with_wait(waiting: WaitingReason, line: Option<DialogueLine>) -> Self {
        Self {
            waiting: Some(waiting),
            line,
            ..Self::default()
        }
    }

    /// 创建跳转结果
    fn with_jump(jump_to: usize) -> Self {
        Self {
            jump_to: Some(jump_to),
            ..Self::default()
        }
    }

    /// 创建结束结果
    fn finish() -> Self {
        Self {
            finished: true,
            ..Self::default()
        }
    }
}

/// 指令执行器
///
/// 负责将单个 Command 转换为 SceneRequest。
#[derive(Debug, Default)]
pub struct Executor {}

impl Executor {
    /// 创建新的执行器
    pub fn new() -> Self {
        Self {}
    }

    /// 执行单条指令
    ///
    /// # 返回
    ///
    /// `ExecuteResult` 包含：
    /// - `requests`: 产生的场景请求
    /// - `waiting`: 如果需要等待，返回等待原因
    /// - `jump_to`: 如果需要跳转，返回目标位置
    ///
    /// 返回的错误都可恢复：调用方记录后继续执行下一条指令。
    pub fn execute(
        &mut self,
        command: &Command,
        state: &mut InterpreterState,
        document: &ScriptDocument,
    ) -> Result<ExecuteResult, RuntimeError> {
        match command {
            Command::Say { speaker, text } => Ok(ExecuteResult::with_wait(
                WaitingReason::WaitForAdvance,
                Some(DialogueLine {
                    speaker: speaker.clone(),
                    text: text.clone(),
                }),
            )),

            Command::Scene { asset_type, name } => {
                let path = resolve(document, asset_type, name)?;
                Ok(ExecuteResult::with_request(SceneRequest::SetBackground {
                    path: path.to_string(),
                }))
            }

            Command::Show {
                asset_type,
                name,
                id,
                position,
                layer,
            } => {
                let path = resolve(document, asset_type, name)?;
                let (x, y) = position.to_coords(SPRITE_Y);
                Ok(ExecuteResult::with_request(SceneRequest::ShowSprite {
                    id: id.clone(),
                    path: path.to_string(),
                    layer: layer
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SPRITE_LAYER.to_string()),
                    x,
                    y,
                    scale: SPRITE_SCALE,
                }))
            }

            Command::Hide { id } => Ok(ExecuteResult::with_request(
                SceneRequest::HideInstance { id: id.clone() },
            )),

            Command::Choice { prompt, options } => {
                let visible: Vec<usize> = options
                    .iter()
                    .enumerate()
                    .filter(|(_, option)| {
                        option
                            .condition
                            .as_ref()
                            .is_none_or(|cond| state.get_var(&cond.var) == cond.value)
                    })
                    .map(|(index, _)| index)
                    .collect();

                if visible.is_empty() {
                    debug!(cursor = state.cursor, "选项全部不可见，跳过 choice");
                    return Ok(ExecuteResult::empty());
                }

                let line = prompt.as_ref().map(|prompt| DialogueLine {
                    speaker: None,
                    text: prompt.clone(),
                });
                Ok(ExecuteResult::with_wait(
                    WaitingReason::WaitForChoice { visible },
                    line,
                ))
            }

            Command::Jump { label } => jump_to_label(document, label),

            Command::SetVar { name, value } => {
                state.set_var(name.clone(), *value);
                Ok(ExecuteResult::empty())
            }

            Command::If { condition, label } => {
                if state.get_var(&condition.var) == condition.value {
                    jump_to_label(document, label)
                } else {
                    Ok(ExecuteResult::empty())
                }
            }

            Command::PlayAudio {
                asset_type,
                name,
                looping,
            } => {
                let path = resolve(document, asset_type, name)?;
                Ok(ExecuteResult::with_request(SceneRequest::PlayAudio {
                    path: path.to_string(),
                    channel: AudioChannel::for_asset_type(asset_type),
                    looping: *looping,
                }))
            }

            Command::Pause { duration } => Ok(ExecuteResult::with_wait(
                WaitingReason::WaitForTime(*duration),
                None,
            )),

            Command::Shake {
                intensity,
                duration,
            } => Ok(ExecuteResult::with_request(SceneRequest::Shake {
                intensity: *intensity,
                duration: *duration,
            })),

            Command::End => Ok(ExecuteResult::finish()),
        }
    }
}

fn resolve<'a>(
    document: &'a ScriptDocument,
    asset_type: &str,
    name: &str,
) -> Result<&'a str, RuntimeError> {
    document
        .resolve(asset_type, name)
        .ok_or_else(|| RuntimeError::AssetNotFound {
            asset_type: asset_type.to_string(),
            name: name.to_string(),
        })
}

fn jump_to_label(document: &ScriptDocument, label: &str) -> Result<ExecuteResult, RuntimeError> {
    if label == END_LABEL {
        return Ok(ExecuteResult::finish());
    }
    document
        .label_index(label)
        .map(ExecuteResult::with_jump)
        .ok_or_else(|| RuntimeError::LabelNotFound {
            label: label.to_string(),
        })
}
