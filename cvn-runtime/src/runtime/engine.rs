//! # Engine 模块
//!
//! 脚本解释器：在 [`ScriptDocument`] 上驱动对话/选择/结束状态机。
//!
//! ## 执行模型
//!
//! ```text
//! advance() / select_confirm() / update(dt) -> Vec<SceneRequest>
//! ```
//!
//! 1. 检查当前状态是否允许此操作（不允许时为空操作）
//! 2. 移动游标
//! 3. 连续执行即时指令，直到遇到阻塞指令（对话、选择、暂停）或脚本结束
//! 4. 返回执行过程中产生的场景请求

use tracing::{debug, error, warn};

use crate::input::Intent;
use crate::request::SceneRequest;
use crate::runtime::executor::Executor;
use crate::script::{Character, Command, END_LABEL, ScriptDocument};
use crate::state::{
    DialogueLine, InterpreterState, MachineState, PauseTimer, WaitingReason,
};
use crate::typewriter::Typewriter;

/// 连续执行即时指令的上限，超过视为死循环
pub const MAX_CHAINED_COMMANDS: usize = 10_000;

/// 说话者的显示信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerDisplay {
    /// 显示名（角色未定义或显示名为空时为角色 ID）
    pub name: String,
    /// 名字颜色 `0xRRGGBB`（角色未定义时为 `None`）
    pub color: Option<u32>,
}

/// 当前对话的展示数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueView<'a> {
    pub speaker: Option<&'a str>,
    pub text: &'a str,
    /// 打字机当前可见部分
    pub visible_text: &'a str,
}

/// 当前选择的展示数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView<'a> {
    /// 可见选项文本
    pub options: Vec<&'a str>,
    /// 高亮项（`options` 中的下标）
    pub highlighted: usize,
}

/// 脚本解释器
///
/// # 使用示例
///
/// ```ignore
/// let doc = ScriptDocument::parse(text);
/// let mut interpreter = Interpreter::new(doc);
/// let requests = interpreter.start();
///
/// loop {
///     // Host 执行 requests...
///     let requests = interpreter.handle(intent);
///     let more = interpreter.update(dt);
/// }
/// ```
pub struct Interpreter {
    /// 当前脚本
    document: ScriptDocument,
    /// 运行时状态
    state: InterpreterState,
    /// 指令执行器
    executor: Executor,
    /// 对话逐字显示
    typewriter: Typewriter,
    started: bool,
}

impl Interpreter {
    /// 创建解释器（使用默认打字速度）
    ///
    /// # 参数
    ///
    /// - `document`: 已解析的脚本
    pub fn new(document: ScriptDocument) -> Self {
        Self::with_typewriter(document, Typewriter::default())
    }

    /// 创建解释器（指定打字机）
    pub fn with_typewriter(document: ScriptDocument, typewriter: Typewriter) -> Self {
        Self {
            document,
            state: InterpreterState::new(),
            executor: Executor::new(),
            typewriter,
            started: false,
        }
    }

    /// 从第一条指令开始执行
    ///
    /// 重复调用不会重新开始。
    pub fn start(&mut self) -> Vec<SceneRequest> {
        if self.started {
            debug!("解释器已启动，忽略 start");
            return Vec::new();
        }
        self.started = true;
        self.run_from(0)
    }

    /// 推进对话
    ///
    /// 打字机未完成时先补全文本；暂停期间无效；仅在 `Dialogue` 状态下生效。
    pub fn advance(&mut self) -> Vec<SceneRequest> {
        if !self.started {
            return self.start();
        }
        if self.state.machine != MachineState::Dialogue {
            debug!(state = ?self.state.machine, "当前状态不允许推进");
            return Vec::new();
        }
        if self.state.pause.is_some() {
            return Vec::new();
        }
        if !self.typewriter.is_complete() {
            self.typewriter.skip();
            return Vec::new();
        }
        self.run_from(self.state.cursor + 1)
    }

    /// 移动选项高亮（首尾循环）
    pub fn select_move(&mut self, delta: i32) {
        if self.state.machine != MachineState::Choice {
            return;
        }
        let count = self.state.visible_options.len() as i64;
        if count == 0 {
            return;
        }
        let next = (self.state.highlighted as i64 + i64::from(delta)).rem_euclid(count);
        self.state.highlighted = next as usize;
    }

    /// 确认高亮选项
    ///
    /// 目标为 `end` 时结束脚本；目标标签不存在时保持在选择状态。
    pub fn select_confirm(&mut self) -> Vec<SceneRequest> {
        if self.state.machine != MachineState::Choice {
            return Vec::new();
        }

        let target = self
            .state
            .visible_options
            .get(self.state.highlighted)
            .and_then(|&option_index| match self.document.command(self.state.cursor) {
                Some(Command::Choice { options, .. }) => options.get(option_index),
                _ => None,
            })
            .map(|option| option.target.clone());

        let Some(target) = target else {
            warn!(cursor = self.state.cursor, "选择状态与当前指令不一致");
            return Vec::new();
        };

        if target == END_LABEL {
            self.state.finish();
            return Vec::new();
        }

        match self.document.label_index(&target) {
            Some(index) => {
                self.state.leave_choice();
                self.run_from(index)
            }
            None => {
                warn!(label = %target, "选项目标标签不存在");
                Vec::new()
            }
        }
    }

    /// 按玩家意图分派
    ///
    /// `Cancel` 与 `Quit` 由 Host 处理，这里忽略。
    pub fn handle(&mut self, intent: Intent) -> Vec<SceneRequest> {
        match (self.state.machine, intent) {
            (MachineState::Dialogue, Intent::Advance | Intent::Confirm) => self.advance(),
            (MachineState::Choice, Intent::Advance | Intent::Confirm) => self.select_confirm(),
            (MachineState::Choice, Intent::SelectUp) => {
                self.select_move(-1);
                Vec::new()
            }
            (MachineState::Choice, Intent::SelectDown) => {
                self.select_move(1);
                Vec::new()
            }
            (_, Intent::Skip) => {
                self.skip_reveal();
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// 帧更新：推进打字机与暂停计时
    ///
    /// 暂停到期后自动继续执行。
    pub fn update(&mut self, dt: f32) -> Vec<SceneRequest> {
        self.typewriter.update(dt);

        if self.state.machine != MachineState::Dialogue {
            return Vec::new();
        }
        let elapsed = match self.state.pause.as_mut() {
            Some(pause) => pause.tick(dt),
            None => return Vec::new(),
        };
        if elapsed {
            self.state.pause = None;
            return self.run_from(self.state.cursor + 1);
        }
        Vec::new()
    }

    /// 立即显示完整文本
    pub fn skip_reveal(&mut self) {
        self.typewriter.skip();
    }

    /// 读取变量（未定义为 0）
    pub fn get_var(&self, name: &str) -> i64 {
        self.state.get_var(name)
    }

    /// 设置变量
    pub fn set_var(&mut self, name: impl Into<String>, value: i64) {
        self.state.set_var(name, value);
    }

    //=========================================================================
    // 查询
    //=========================================================================

    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    pub fn machine(&self) -> MachineState {
        self.state.machine
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn document(&self) -> &ScriptDocument {
        &self.document
    }

    pub fn typewriter(&self) -> &Typewriter {
        &self.typewriter
    }

    /// 暂停是否进行中
    pub fn is_paused(&self) -> bool {
        self.state.pause.is_some()
    }

    /// 当前对话
    pub fn dialogue(&self) -> Option<DialogueView<'_>> {
        self.state.dialogue.as_ref().map(|line| DialogueView {
            speaker: line.speaker.as_deref(),
            text: &line.text,
            visible_text: self.typewriter.visible_text(&line.text),
        })
    }

    /// 当前说话者的显示名与颜色
    ///
    /// 旁白返回 `None`。
    pub fn speaker_display(&self) -> Option<SpeakerDisplay> {
        let speaker = self.state.dialogue.as_ref()?.speaker.as_deref()?;
        Some(match self.document.character(speaker) {
            Some(Character {
                display_name,
                name_color,
                ..
            }) => SpeakerDisplay {
                name: if display_name.is_empty() {
                    speaker.to_string()
                } else {
                    display_name.clone()
                },
                color: Some(*name_color),
            },
            None => SpeakerDisplay {
                name: speaker.to_string(),
                color: None,
            },
        })
    }

    /// 当前可见选项
    ///
    /// 不在选择状态时返回 `None`。
    pub fn choice_options(&self) -> Option<ChoiceView<'_>> {
        if self.state.machine != MachineState::Choice {
            return None;
        }
        let Some(Command::Choice { options, .. }) = self.document.command(self.state.cursor)
        else {
            return None;
        };
        Some(ChoiceView {
            options: self
                .state
                .visible_options
                .iter()
                .filter_map(|&i| options.get(i).map(|o| o.text.as_str()))
                .collect(),
            highlighted: self.state.highlighted,
        })
    }

    //=========================================================================
    // 执行
    //=========================================================================

    /// 从 `index` 开始执行，直到阻塞或结束
    fn run_from(&mut self, start: usize) -> Vec<SceneRequest> {
        let mut requests = Vec::new();
        let mut index = start;

        for _ in 0..MAX_CHAINED_COMMANDS {
            let Some(command) = self.document.command(index) else {
                // 脚本执行完毕
                self.state.cursor = index;
                self.state.finish();
                return requests;
            };
            self.state.cursor = index;

            let result = match self
                .executor
                .execute(command, &mut self.state, &self.document)
            {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        cursor = index,
                        line = ?self.document.source_line(index),
                        error = %e,
                        "指令执行失败，跳过"
                    );
                    index += 1;
                    continue;
                }
            };

            requests.extend(result.requests);

            let is_choice = matches!(result.waiting, Some(WaitingReason::WaitForChoice { .. }));
            if let Some(line) = result.line {
                self.show_line(line, is_choice);
            }

            if result.finished {
                self.state.finish();
                return requests;
            }

            // 处理跳转
            if let Some(target) = result.jump_to {
                index = target;
                continue;
            }

            // 如果需要等待，停止执行
            match result.waiting {
                Some(WaitingReason::WaitForAdvance) => {
                    self.state.machine = MachineState::Dialogue;
                    return requests;
                }
                Some(WaitingReason::WaitForChoice { visible }) => {
                    self.state.enter_choice(visible);
                    return requests;
                }
                Some(WaitingReason::WaitForTime(duration)) => {
                    self.state.machine = MachineState::Dialogue;
                    self.state.pause = Some(PauseTimer::new(duration));
                    return requests;
                }
                None => index += 1,
            }
        }

        error!(
            cursor = index,
            limit = MAX_CHAINED_COMMANDS,
            "连续执行指令过多，疑似死循环，停止脚本"
        );
        self.state.finish();
        requests
    }

    /// 切换当前对话行
    ///
    /// 选择提示直接完整显示。
    fn show_line(&mut self, line: DialogueLine, instant: bool) {
        self.typewriter.reset(line.text.chars().count());
        if instant {
            self.typewriter.skip();
        }
        self.state.dialogue = Some(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AudioChannel;

    fn interpreter(text: &str) -> Interpreter {
        Interpreter::new(ScriptDocument::parse(text))
    }

    fn finish_reveal_and_advance(it: &mut Interpreter) -> Vec<SceneRequest> {
        it.skip_reveal();
        it.advance()
    }

    #[test]
    fn test_say_then_end_finishes() {
        let mut it = interpreter("say(\"Hello\")\nend");
        it.start();
        assert_eq!(it.machine(), MachineState::Dialogue);
        assert_eq!(it.dialogue().unwrap().text, "Hello");

        // 第一次推进只补全文本
        it.advance();
        assert_eq!(it.machine(), MachineState::Dialogue);
        assert!(it.typewriter().is_complete());

        it.advance();
        assert_eq!(it.machine(), MachineState::Finished);
    }

    #[test]
    fn test_empty_document_finishes_on_start() {
        let mut it = interpreter("");
        assert!(it.start().is_empty());
        assert!(it.is_finished());
    }

    #[test]
    fn test_running_past_last_command_finishes() {
        let mut it = interpreter("say(\"only line\")");
        it.start();
        finish_reveal_and_advance(&mut it);
        assert!(it.is_finished());

        // 终态下的操作都是空操作
        assert!(it.advance().is_empty());
        assert!(it.select_confirm().is_empty());
        assert!(it.is_finished());
    }

    #[test]
    fn test_instant_commands_chain_until_blocking() {
        let text = r#"
asset bg room = "bg/room.png"
asset sprite chocola = "sprites/chocola.png"
asset music theme = "audio/theme.ogg"
scene bg room
show sprite chocola as choco at left
play music theme loop
shake 5 200
say(chocola, "Hi")
"#;
        let mut it = interpreter(text);
        let requests = it.start();

        assert_eq!(
            requests,
            vec![
                SceneRequest::SetBackground {
                    path: "bg/room.png".to_string()
                },
                SceneRequest::ShowSprite {
                    id: "choco".to_string(),
                    path: "sprites/chocola.png".to_string(),
                    layer: "actors".to_string(),
                    x: 0.15,
                    y: 0.8,
                    scale: 0.85,
                },
                SceneRequest::PlayAudio {
                    path: "audio/theme.ogg".to_string(),
                    channel: AudioChannel::Music,
                    looping: true,
                },
                SceneRequest::Shake {
                    intensity: 5,
                    duration: std::time::Duration::from_millis(200),
                },
            ]
        );
        assert_eq!(it.cursor(), 4);
        assert_eq!(it.dialogue().unwrap().speaker, Some("chocola"));
    }

    #[test]
    fn test_missing_asset_is_skipped() {
        let mut it = interpreter("scene bg nowhere\nsay(\"still here\")");
        let requests = it.start();
        assert!(requests.is_empty());
        assert_eq!(it.dialogue().unwrap().text, "still here");
    }

    #[test]
    fn test_typewriter_progress_via_update() {
        let mut it = interpreter("say(\"0123456789012345678901234567890123456789\")");
        it.start();
        it.update(0.5);
        assert_eq!(it.dialogue().unwrap().visible_text.chars().count(), 16);
        it.handle(Intent::Skip);
        assert_eq!(it.dialogue().unwrap().visible_text.chars().count(), 40);
    }

    #[test]
    fn test_choice_wraps_and_jumps() {
        let text = r#"
choice "Pick" {
    "A" -> a
    "B" -> b
    "C" -> c
}
label a
say("picked a")
end
label b
say("picked b")
end
label c
say("picked c")
end
"#;
        let mut it = interpreter(text);
        it.start();
        assert_eq!(it.machine(), MachineState::Choice);

        // 提示文本直接完整显示
        let dialogue = it.dialogue().unwrap();
        assert_eq!(dialogue.visible_text, "Pick");

        it.select_move(-1);
        assert_eq!(it.choice_options().unwrap().highlighted, 2);
        it.select_move(1);
        assert_eq!(it.choice_options().unwrap().highlighted, 0);
        it.handle(Intent::SelectDown);
        it.handle(Intent::SelectDown);
        it.handle(Intent::SelectDown);
        assert_eq!(it.choice_options().unwrap().highlighted, 0);

        it.handle(Intent::SelectDown);
        it.handle(Intent::Confirm);
        assert_eq!(it.machine(), MachineState::Dialogue);
        assert_eq!(it.dialogue().unwrap().text, "picked b");
        assert!(it.choice_options().is_none());
    }

    #[test]
    fn test_choice_end_target_and_unknown_label() {
        let text = r#"
choice {
    "Missing" -> nowhere
    "Quit" -> end
}
"#;
        let mut it = interpreter(text);
        it.start();

        // 未知标签：保持选择状态
        assert!(it.select_confirm().is_empty());
        assert_eq!(it.machine(), MachineState::Choice);

        it.select_move(1);
        it.select_confirm();
        assert!(it.is_finished());
    }

    #[test]
    fn test_conditional_choice_options() {
        let text = r#"
set met = 1
choice {
    "Always" -> end
    "Hidden" -> end if met == 0
    "Shown" -> end if met == 1
}
"#;
        let mut it = interpreter(text);
        it.start();
        let view = it.choice_options().unwrap();
        assert_eq!(view.options, vec!["Always", "Shown"]);
    }

    #[test]
    fn test_choice_without_visible_options_is_skipped() {
        let text = r#"
choice {
    "Hidden" -> end if flag == 1
}
say("after choice")
"#;
        let mut it = interpreter(text);
        it.start();
        assert_eq!(it.machine(), MachineState::Dialogue);
        assert_eq!(it.dialogue().unwrap().text, "after choice");
    }

    #[test]
    fn test_if_and_jump() {
        let text = r#"
set route = 2
if route == 1 jump one
if route == 2 jump two
say("fallthrough")
label one
say("one")
label two
say("two")
"#;
        let mut it = interpreter(text);
        it.start();
        assert_eq!(it.dialogue().unwrap().text, "two");
        assert_eq!(it.get_var("route"), 2);
    }

    #[test]
    fn test_unknown_jump_falls_through() {
        let mut it = interpreter("jump nowhere\nsay(\"next\")");
        it.start();
        assert_eq!(it.dialogue().unwrap().text, "next");
    }

    #[test]
    fn test_jump_end_finishes() {
        let mut it = interpreter("jump end\nsay(\"never\")");
        it.start();
        assert!(it.is_finished());
        assert!(it.dialogue().is_none());
    }

    #[test]
    fn test_pause_blocks_advance_then_continues() {
        let mut it = interpreter("say(\"before\")\npause 500\nsay(\"after\")");
        it.start();
        finish_reveal_and_advance(&mut it);
        assert!(it.is_paused());

        // 暂停期间推进无效
        assert!(it.advance().is_empty());
        assert_eq!(it.dialogue().unwrap().text, "before");

        it.update(0.3);
        assert!(it.is_paused());
        it.update(0.3);
        assert!(!it.is_paused());
        assert_eq!(it.dialogue().unwrap().text, "after");
    }

    #[test]
    fn test_runaway_loop_stops() {
        let mut it = interpreter("label spin\njump spin");
        it.start();
        assert!(it.is_finished());
    }

    #[test]
    fn test_set_var_from_host() {
        let text = "if flag == 3 jump yes\nsay(\"no\")\nlabel yes\nsay(\"yes\")";
        let mut it = interpreter(text);
        it.set_var("flag", 3);
        it.start();
        assert_eq!(it.dialogue().unwrap().text, "yes");
    }

    #[test]
    fn test_speaker_display() {
        let text = r#"
character chocola {
    display_name: "Chocola";
    name_color: 0xFF69B4;
}
say(chocola, "Hi")
say(stranger, "Who?")
say("Narration")
"#;
        let mut it = interpreter(text);
        it.start();
        assert_eq!(
            it.speaker_display(),
            Some(SpeakerDisplay {
                name: "Chocola".to_string(),
                color: Some(0xFF69B4)
            })
        );

        finish_reveal_and_advance(&mut it);
        assert_eq!(
            it.speaker_display(),
            Some(SpeakerDisplay {
                name: "stranger".to_string(),
                color: None
            })
        );

        finish_reveal_and_advance(&mut it);
        assert_eq!(it.speaker_display(), None);
    }

    #[test]
    fn test_advance_before_start_starts() {
        let mut it = interpreter("say(\"first\")\nsay(\"second\")");
        it.advance();
        assert_eq!(it.dialogue().unwrap().text, "first");
        assert!(it.start().is_empty());
    }
}
