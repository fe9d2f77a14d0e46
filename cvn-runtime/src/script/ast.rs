//! # AST 模块
//!
//! 定义脚本解析结果 [`ScriptDocument`]。
//!
//! ## 设计说明
//!
//! 文档是解析器的输出，解析完成后不可变。
//! 声明（角色、素材、样式）与指令序列分开存放，标签映射到指令下标。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::parser::Parser;

/// 保留标签：跳转到此标签即结束脚本
pub const END_LABEL: &str = "end";

/// 解析容量上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseLimits {
    pub max_characters: usize,
    pub max_assets: usize,
    pub max_styles: usize,
    pub max_style_fields: usize,
    pub max_commands: usize,
    pub max_choice_options: usize,
    pub max_labels: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_characters: 32,
            max_assets: 64,
            max_styles: 32,
            max_style_fields: 16,
            max_commands: 512,
            max_choice_options: 6,
            max_labels: 128,
        }
    }
}

/// 角色定义
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Character {
    /// 脚本中引用的 ID
    pub id: String,
    /// 显示名（为空时显示 ID）
    pub display_name: String,
    /// 名字颜色 `0xRRGGBB`
    pub name_color: u32,
    /// 语音标签
    pub voice_tag: String,
}

/// 素材定义：`asset <type> <name> = "path"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_type: String,
    pub name: String,
    pub path: String,
}

/// 样式定义
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    /// 按声明顺序保存的字段
    pub fields: Vec<(String, String)>,
}

impl Style {
    /// 读取字段值
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, value)| value.as_str())
    }
}

/// 标签：名称 → 下一条指令的下标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub index: usize,
}

/// 相等条件 `<var> == <int>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub var: String,
    pub value: i64,
}

/// 选择项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// 选项显示文本
    pub text: String,
    /// 跳转目标标签
    pub target: String,
    /// 可见条件
    pub condition: Option<Condition>,
}

/// 屏幕位置
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ScreenPosition {
    Left,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    Right,
    /// 自定义坐标（归一化或像素，由渲染器判定）
    Custom { x: f32, y: f32 },
}

impl ScreenPosition {
    /// 解析位置名称
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center_left" | "centerleft" => Some(Self::CenterLeft),
            "center" | "middle" => Some(Self::Center),
            "center_right" | "centerright" => Some(Self::CenterRight),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    /// 转换为坐标
    ///
    /// 具名位置只决定横坐标，纵坐标固定为 `default_y`。
    pub fn to_coords(self, default_y: f32) -> (f32, f32) {
        match self {
            Self::Left => (0.15, default_y),
            Self::CenterLeft => (0.3, default_y),
            Self::Center => (0.5, default_y),
            Self::CenterRight => (0.7, default_y),
            Self::Right => (0.85, default_y),
            Self::Custom { x, y } => (x, y),
        }
    }
}

/// 脚本指令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 对话：`say(speaker, "text")`
    Say {
        /// 说话者（None 表示旁白）
        speaker: Option<String>,
        text: String,
    },

    /// 场景切换：`scene <type> <name>`
    Scene { asset_type: String, name: String },

    /// 显示立绘：`show <type> <name> as <id> [at <pos>] [on <layer>]`
    Show {
        asset_type: String,
        name: String,
        id: String,
        position: ScreenPosition,
        layer: Option<String>,
    },

    /// 隐藏实例：`hide <id>`
    Hide { id: String },

    /// 选择分支
    Choice {
        prompt: Option<String>,
        options: Vec<ChoiceOption>,
    },

    /// 无条件跳转：`jump <label>`
    Jump { label: String },

    /// 变量赋值：`set <var> = <int>`
    SetVar { name: String, value: i64 },

    /// 条件跳转：`if <var> == <int> jump <label>`
    If { condition: Condition, label: String },

    /// 播放音频：`play <type> <name> [loop]`
    PlayAudio {
        asset_type: String,
        name: String,
        looping: bool,
    },

    /// 暂停：`pause <ms>`
    Pause { duration: Duration },

    /// 屏幕震动：`shake <intensity> <ms>`
    Shake { intensity: u32, duration: Duration },

    /// 结束脚本
    End,
}

impl Command {
    /// 是否需要等待玩家输入或时间流逝
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Command::Say { .. } | Command::Choice { .. } | Command::Pause { .. }
        )
    }

    /// 指令名称（日志与诊断用）
    pub fn kind_name(&self) -> &'static str {
        match self {
            Command::Say { .. } => "say",
            Command::Scene { .. } => "scene",
            Command::Show { .. } => "show",
            Command::Hide { .. } => "hide",
            Command::Choice { .. } => "choice",
            Command::Jump { .. } => "jump",
            Command::SetVar { .. } => "set",
            Command::If { .. } => "if",
            Command::PlayAudio { .. } => "play",
            Command::Pause { .. } => "pause",
            Command::Shake { .. } => "shake",
            Command::End => "end",
        }
    }
}

/// 解析后的脚本文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub characters: Vec<Character>,
    pub assets: Vec<Asset>,
    pub styles: Vec<Style>,
    pub commands: Vec<Command>,
    pub labels: Vec<Label>,
    /// 每条指令对应的源码行号（从 1 开始），与 `commands` 等长
    #[serde(default)]
    pub source_map: Vec<usize>,
}

impl ScriptDocument {
    /// 使用默认容量解析脚本文本
    pub fn parse(text: &str) -> Self {
        Parser::new().parse(text)
    }

    /// 只有一句旁白的文档，用于脚本缺失或为空时
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self {
            commands: vec![Command::Say {
                speaker: None,
                text: text.into(),
            }],
            source_map: vec![0],
            ..Self::default()
        }
    }

    /// 按 `(type, name)` 查找素材路径
    pub fn resolve(&self, asset_type: &str, name: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|asset| asset.asset_type == asset_type && asset.name == name)
            .map(|asset| asset.path.as_str())
    }

    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    /// 查找标签对应的指令下标
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.index)
    }

    pub fn command(&self, index: usize) -> Option<&Command> {
        self.commands.get(index)
    }

    /// 指令的源码行号
    pub fn source_line(&self, index: usize) -> Option<usize> {
        self.source_map.get(index).copied().filter(|line| *line > 0)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
