//! # State 模块
//!
//! 定义解释器的运行时状态。
//!
//! ## 设计原则
//!
//! - 所有状态必须**显式建模**
//! - 不允许隐式全局状态
//!
//! ```text
//! Dialogue ──advance──► Dialogue / Choice / Finished
//! Choice   ──confirm──► Dialogue / Choice / Finished
//! Finished              (终态)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 状态机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MachineState {
    /// 显示对话，等待推进
    #[default]
    Dialogue,
    /// 显示选项，等待确认
    Choice,
    /// 脚本结束
    Finished,
}

/// 等待原因
///
/// 执行器遇到阻塞指令时返回，引擎据此切换状态机。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WaitingReason {
    /// 等待推进
    WaitForAdvance,
    /// 等待选择
    ///
    /// `visible` 是当前可见选项在 `Choice` 指令中的下标
    WaitForChoice { visible: Vec<usize> },
    /// 等待指定时长后自动继续
    WaitForTime(Duration),
}

/// 暂停计时器
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseTimer {
    /// 总时长（秒）
    pub total: f32,
    /// 已经过时长（秒）
    pub elapsed: f32,
}

impl PauseTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            total: duration.as_secs_f32(),
            elapsed: 0.0,
        }
    }

    /// 推进计时器，返回是否已到期
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.total
    }
}

/// 当前显示的对话行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// 说话者（角色 ID），`None` 为旁白
    pub speaker: Option<String>,
    /// 完整文本
    pub text: String,
}

/// 解释器状态
///
/// 每次加载脚本时创建一次，只由解释器的操作修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpreterState {
    /// 当前指令下标
    pub cursor: usize,
    /// 整数变量
    pub variables: HashMap<String, i64>,
    /// 状态机状态
    pub machine: MachineState,
    /// 高亮选项（相对 `visible_options` 的下标）
    pub highlighted: usize,
    /// 可见选项在 `Choice` 指令中的下标
    pub visible_options: Vec<usize>,
    /// 进行中的暂停
    pub pause: Option<PauseTimer>,
    /// 当前对话
    pub dialogue: Option<DialogueLine>,
}

impl InterpreterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取变量，未定义时为 0
    pub fn get_var(&self, name: &str) -> i64 {
        self.variables.get(name).copied().unwrap_or(0)
    }

    /// 设置变量
    pub fn set_var(&mut self, name: impl Into<String>, value: i64) {
        self.variables.insert(name.into(), value);
    }

    /// 进入选择状态
    pub fn enter_choice(&mut self, visible: Vec<usize>) {
        self.machine = MachineState::Choice;
        self.highlighted = 0;
        self.visible_options = visible;
    }

    /// 离开选择状态
    pub fn leave_choice(&mut self) {
        self.highlighted = 0;
        self.visible_options.clear();
        if self.machine == MachineState::Choice {
            self.machine = MachineState::Dialogue;
        }
    }

    /// 进入终态
    pub fn finish(&mut self) {
        self.machine = MachineState::Finished;
        self.highlighted = 0;
        self.visible_options.clear();
        self.pause = None;
    }

    pub fn is_finished(&self) -> bool {
        self.machine == MachineState::Finished
    }
}
