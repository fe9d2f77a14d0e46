//! # 阶段 2：块解析
//!
//! 将块转换为声明与指令，写入正在构建的 [`ScriptDocument`]。
//! 任何无法解析的内容都被跳过并记录为 [`ParseWarning`]。

use std::collections::HashSet;

use crate::error::ParseWarning;
use crate::script::ast::{
    Asset, Character, ChoiceOption, Command, Condition, END_LABEL, Label, ParseLimits,
    ScreenPosition, ScriptDocument, Style,
};

use super::helpers::{
    is_identifier, keyword_rest, parse_duration, parse_equality, parse_field, parse_hex_color,
    parse_int, parse_quoted, unquote,
};
use super::phase1::Block;

/// 阶段 2 解析器
pub struct Phase2Parser {
    limits: ParseLimits,
    document: ScriptDocument,
    /// 解析警告（非致命错误）
    pub warnings: Vec<ParseWarning>,
    /// 已报告过容量上限的种类，每种只报告一次
    capped: HashSet<&'static str>,
}

impl Phase2Parser {
    pub fn new(limits: ParseLimits) -> Self {
        Self {
            limits,
            document: ScriptDocument::default(),
            warnings: Vec::new(),
            capped: HashSet::new(),
        }
    }

    /// 清空上一次解析的状态
    pub fn reset(&mut self) {
        self.document = ScriptDocument::default();
        self.warnings.clear();
        self.capped.clear();
    }

    /// 取出构建完成的文档
    pub fn finish(&mut self) -> ScriptDocument {
        std::mem::take(&mut self.document)
    }

    /// 解析单个块
    pub fn parse_block(&mut self, block: Block) {
        match block {
            Block::SingleLine { line, line_number } => self.parse_single_line(&line, line_number),
            Block::Braced {
                header,
                body,
                start_line,
                closed,
            } => {
                if !closed {
                    self.warnings
                        .push(ParseWarning::UnclosedBlock { line: start_line });
                }
                self.parse_braced(&header, &body, start_line);
            }
        }
    }

    //=========================================================================
    // 单行
    //=========================================================================

    fn parse_single_line(&mut self, line: &str, line_number: usize) {
        if line.starts_with("say(") || line.starts_with("say (") {
            if let Some(command) = self.parse_say(line, line_number) {
                self.push_command(command, line_number);
            }
            return;
        }

        if let Some(rest) = keyword_rest(line, "asset") {
            self.parse_asset(rest, line_number);
            return;
        }
        if let Some(rest) = keyword_rest(line, "label") {
            self.define_label(rest, line_number);
            return;
        }
        if line == "end" {
            self.push_command(Command::End, line_number);
            return;
        }

        let parsed = if let Some(rest) = keyword_rest(line, "scene") {
            Some(self.parse_scene(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "show") {
            Some(self.parse_show(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "hide") {
            Some(self.parse_hide(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "jump") {
            Some(self.parse_jump(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "set") {
            Some(self.parse_set(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "if") {
            Some(self.parse_if(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "play") {
            Some(self.parse_play(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "pause") {
            Some(self.parse_pause(rest, line_number))
        } else if let Some(rest) = keyword_rest(line, "shake") {
            Some(self.parse_shake(rest, line_number))
        } else {
            None
        };

        match parsed {
            Some(Some(command)) => self.push_command(command, line_number),
            Some(None) => {}
            None => {
                // 标签简写 `name:`
                if let Some(name) = line.strip_suffix(':')
                    && is_identifier(name.trim())
                {
                    self.define_label(name.trim(), line_number);
                    return;
                }
                self.warnings.push(ParseWarning::UnknownStatement {
                    line: line_number,
                    statement: line.to_string(),
                });
            }
        }
    }

    /// `say(speaker, "text")` / `say("text")`
    fn parse_say(&mut self, line: &str, line_number: usize) -> Option<Command> {
        let inner = line["say".len()..].trim_start().strip_prefix('(');
        let inner = inner.and_then(|s| s.rfind(')').map(|end| s[..end].trim()));
        let Some(inner) = inner else {
            self.invalid(line_number, "say 缺少括号");
            return None;
        };

        let (speaker, text_part) = if inner.starts_with('"') {
            // 带引号的说话者：say("Chocola", "...")
            match parse_quoted(inner) {
                Some((first, rest)) if rest.trim_start().starts_with(',') => {
                    (Some(first.trim()), rest.trim_start()[1..].trim())
                }
                _ => (None, inner),
            }
        } else {
            match inner.find(',') {
                Some(comma) => (Some(inner[..comma].trim()), inner[comma + 1..].trim()),
                None => {
                    self.invalid(line_number, "say 缺少对话文本");
                    return None;
                }
            }
        };

        let Some(text) = outer_quoted(text_part) else {
            self.invalid(line_number, "say 的文本必须用双引号包围");
            return None;
        };

        Some(Command::Say {
            speaker: speaker.filter(|s| !s.is_empty()).map(str::to_string),
            text: text.to_string(),
        })
    }

    /// `scene <type> <name>`
    fn parse_scene(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let [asset_type, name] = tokens[..] else {
            self.invalid(line_number, "用法：scene <type> <name>");
            return None;
        };
        Some(Command::Scene {
            asset_type: asset_type.to_string(),
            name: name.to_string(),
        })
    }

    /// `show <type> <name> [as <id>] [at <pos>] [on <layer>]`
    ///
    /// 省略 `as` 时实例 ID 与素材名相同。
    fn parse_show(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.len() < 2 {
            self.invalid(line_number, "用法：show <type> <name> as <id>");
            return None;
        }
        let asset_type = tokens[0];
        let name = tokens[1];
        let mut id = name;
        let mut position = ScreenPosition::Center;
        let mut layer = None;

        let mut i = 2;
        while i < tokens.len() {
            match tokens[i] {
                "as" => {
                    let Some(value) = tokens.get(i + 1) else {
                        self.invalid(line_number, "as 之后缺少实例 ID");
                        return None;
                    };
                    id = value;
                    i += 2;
                }
                "at" => {
                    // 位置可能写作 `0.3, 0.8`，收集到下一个关键字为止
                    let end = tokens[i + 1..]
                        .iter()
                        .position(|t| *t == "on" || *t == "as")
                        .map_or(tokens.len(), |offset| i + 1 + offset);
                    let spec: String = tokens[i + 1..end].concat();
                    match parse_position(&spec) {
                        Some(parsed) => position = parsed,
                        None => self.invalid(line_number, format!("无效的位置 '{}'", spec)),
                    }
                    i = end;
                }
                "on" => {
                    let Some(value) = tokens.get(i + 1) else {
                        self.invalid(line_number, "on 之后缺少图层名");
                        return None;
                    };
                    layer = Some(value.to_string());
                    i += 2;
                }
                other => {
                    self.invalid(line_number, format!("show 中无法识别的参数 '{}'", other));
                    i += 1;
                }
            }
        }

        Some(Command::Show {
            asset_type: asset_type.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            position,
            layer,
        })
    }

    /// `hide <id>`
    fn parse_hide(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        match single_token(rest) {
            Some(id) => Some(Command::Hide { id: id.to_string() }),
            None => {
                self.invalid(line_number, "用法：hide <id>");
                None
            }
        }
    }

    /// `jump <label>`
    fn parse_jump(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        match single_token(rest) {
            Some(label) => Some(Command::Jump {
                label: label.to_string(),
            }),
            None => {
                self.invalid(line_number, "用法：jump <label>");
                None
            }
        }
    }

    /// `set <var> = <int>`
    fn parse_set(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        let parsed = rest.split_once('=').and_then(|(name, value)| {
            let name = name.trim();
            let value = parse_int(value)?;
            is_identifier(name).then(|| (name.to_string(), value))
        });
        match parsed {
            Some((name, value)) => Some(Command::SetVar { name, value }),
            None => {
                self.invalid(line_number, "用法：set <var> = <int>");
                None
            }
        }
    }

    /// `if <var> == <int> jump <label>`
    fn parse_if(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        let parsed = rest.find(" jump ").and_then(|pos| {
            let (var, value) = parse_equality(&rest[..pos])?;
            let label = single_token(&rest[pos + " jump ".len()..])?;
            Some(Command::If {
                condition: Condition {
                    var: var.to_string(),
                    value,
                },
                label: label.to_string(),
            })
        });
        if parsed.is_none() {
            self.invalid(line_number, "用法：if <var> == <int> jump <label>");
        }
        parsed
    }

    /// `play <type> <name> [loop]`
    fn parse_play(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let (asset_type, name, looping) = match tokens[..] {
            [asset_type, name] => (asset_type, name, false),
            [asset_type, name, "loop"] => (asset_type, name, true),
            _ => {
                self.invalid(line_number, "用法：play <type> <name> [loop]");
                return None;
            }
        };
        Some(Command::PlayAudio {
            asset_type: asset_type.to_string(),
            name: name.to_string(),
            looping,
        })
    }

    /// `pause <ms>`
    fn parse_pause(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        match parse_duration(rest) {
            Some(duration) => Some(Command::Pause { duration }),
            None => {
                self.invalid(line_number, "用法：pause <ms>");
                None
            }
        }
    }

    /// `shake <intensity> <ms>`
    fn parse_shake(&mut self, rest: &str, line_number: usize) -> Option<Command> {
        let tokens: Vec<&str> = rest.split_whitespace().collect();
        let parsed = match tokens[..] {
            [intensity, duration] => intensity
                .parse::<u32>()
                .ok()
                .zip(parse_duration(duration)),
            _ => None,
        };
        match parsed {
            Some((intensity, duration)) => Some(Command::Shake {
                intensity,
                duration,
            }),
            None => {
                self.invalid(line_number, "用法：shake <intensity> <ms>");
                None
            }
        }
    }

    /// `asset <type> <name> = "path"`
    fn parse_asset(&mut self, rest: &str, line_number: usize) {
        let parsed = rest.split_once('=').and_then(|(lhs, rhs)| {
            let tokens: Vec<&str> = lhs.split_whitespace().collect();
            let [asset_type, name] = tokens[..] else {
                return None;
            };
            let path = parse_quoted(rhs).map_or_else(|| unquote(rhs), |(path, _)| path);
            (!path.is_empty()).then(|| Asset {
                asset_type: asset_type.to_string(),
                name: name.to_string(),
                path: path.to_string(),
            })
        });
        let Some(asset) = parsed else {
            self.invalid(line_number, "用法：asset <type> <name> = \"path\"");
            return;
        };

        if self.document.resolve(&asset.asset_type, &asset.name).is_some() {
            self.warnings.push(ParseWarning::Duplicate {
                line: line_number,
                kind: "asset",
                name: format!("{}/{}", asset.asset_type, asset.name),
            });
            return;
        }
        if self.document.assets.len() >= self.limits.max_assets {
            self.capacity_reached("asset", self.limits.max_assets, line_number);
            return;
        }
        self.document.assets.push(asset);
    }

    //=========================================================================
    // 花括号块
    //=========================================================================

    fn parse_braced(&mut self, header: &str, body: &[(String, usize)], start_line: usize) {
        if let Some(rest) = keyword_rest(header, "character") {
            self.parse_character(rest, body, start_line);
        } else if let Some(rest) = keyword_rest(header, "style") {
            self.parse_style(rest, body, start_line);
        } else if let Some(rest) = keyword_rest(header, "choice") {
            if let Some(command) = self.parse_choice(rest, body, start_line) {
                self.push_command(command, start_line);
            }
        } else {
            self.warnings.push(ParseWarning::UnknownStatement {
                line: start_line,
                statement: header.to_string(),
            });
        }
    }

    fn parse_character(&mut self, rest: &str, body: &[(String, usize)], start_line: usize) {
        let id = rest.trim();
        if !is_identifier(id) {
            self.invalid(start_line, format!("无效的角色 ID '{}'", id));
            return;
        }
        if self.document.character(id).is_some() {
            self.warnings.push(ParseWarning::Duplicate {
                line: start_line,
                kind: "character",
                name: id.to_string(),
            });
            return;
        }
        if self.document.characters.len() >= self.limits.max_characters {
            self.capacity_reached("character", self.limits.max_characters, start_line);
            return;
        }

        let mut character = Character {
            id: id.to_string(),
            ..Character::default()
        };
        for (statement, line_number) in body {
            let Some((key, value)) = parse_field(statement) else {
                self.invalid(*line_number, format!("无效的字段 '{}'", statement));
                continue;
            };
            match key {
                "display_name" => character.display_name = unquote(value).to_string(),
                "name_color" => match parse_hex_color(value) {
                    Some(color) => character.name_color = color,
                    None => self.invalid(*line_number, format!("无效的颜色值 '{}'", value)),
                },
                "voice_tag" => character.voice_tag = unquote(value).to_string(),
                other => self.invalid(*line_number, format!("未知的角色字段 '{}'", other)),
            }
        }
        self.document.characters.push(character);
    }

    fn parse_style(&mut self, rest: &str, body: &[(String, usize)], start_line: usize) {
        let name = rest.trim();
        if !is_identifier(name) {
            self.invalid(start_line, format!("无效的样式名 '{}'", name));
            return;
        }
        if self.document.style(name).is_some() {
            self.warnings.push(ParseWarning::Duplicate {
                line: start_line,
                kind: "style",
                name: name.to_string(),
            });
            return;
        }
        if self.document.styles.len() >= self.limits.max_styles {
            self.capacity_reached("style", self.limits.max_styles, start_line);
            return;
        }

        let mut style = Style {
            name: name.to_string(),
            fields: Vec::new(),
        };
        for (statement, line_number) in body {
            let Some((key, value)) = parse_field(statement) else {
                self.invalid(*line_number, format!("无效的字段 '{}'", statement));
                continue;
            };
            if style.fields.len() >= self.limits.max_style_fields {
                self.capacity_reached("style field", self.limits.max_style_fields, *line_number);
                break;
            }
            style.fields.push((key.to_string(), value.to_string()));
        }
        self.document.styles.push(style);
    }

    /// `choice ["prompt"] { "text" -> label [if var == int] }`
    fn parse_choice(
        &mut self,
        rest: &str,
        body: &[(String, usize)],
        start_line: usize,
    ) -> Option<Command> {
        let rest = rest.trim();
        let prompt = if rest.is_empty() {
            None
        } else {
            match parse_quoted(rest) {
                Some((prompt, _)) => Some(prompt.to_string()),
                None => {
                    self.invalid(start_line, "choice 的提示文本必须用双引号包围");
                    None
                }
            }
        };

        let mut options = Vec::new();
        for (statement, line_number) in body {
            let Some(option) = parse_option(statement) else {
                self.invalid(
                    *line_number,
                    "用法：\"text\" -> <label> [if <var> == <int>]",
                );
                continue;
            };
            if options.len() >= self.limits.max_choice_options {
                self.capacity_reached(
                    "choice option",
                    self.limits.max_choice_options,
                    *line_number,
                );
                break;
            }
            options.push(option);
        }

        if options.is_empty() {
            self.invalid(start_line, "choice 没有任何选项");
            return None;
        }
        Some(Command::Choice { prompt, options })
    }

    //=========================================================================
    // 文档写入
    //=========================================================================

    fn push_command(&mut self, command: Command, line_number: usize) {
        if self.document.commands.len() >= self.limits.max_commands {
            self.capacity_reached("command", self.limits.max_commands, line_number);
            return;
        }
        self.document.commands.push(command);
        self.document.source_map.push(line_number);
    }

    fn define_label(&mut self, name: &str, line_number: usize) {
        let name = name.trim();
        if !is_identifier(name) {
            self.invalid(line_number, format!("无效的标签名 '{}'", name));
            return;
        }
        if name == END_LABEL {
            self.invalid(line_number, "标签 'end' 为保留名");
            return;
        }
        if self.document.label_index(name).is_some() {
            self.warnings.push(ParseWarning::Duplicate {
                line: line_number,
                kind: "label",
                name: name.to_string(),
            });
            return;
        }
        if self.document.labels.len() >= self.limits.max_labels {
            self.capacity_reached("label", self.limits.max_labels, line_number);
            return;
        }
        self.document.labels.push(Label {
            name: name.to_string(),
            index: self.document.commands.len(),
        });
    }

    fn capacity_reached(&mut self, kind: &'static str, limit: usize, line_number: usize) {
        if self.capped.insert(kind) {
            self.warnings.push(ParseWarning::CapacityReached {
                line: line_number,
                kind,
                limit,
            });
        }
    }

    fn invalid(&mut self, line_number: usize, message: impl Into<String>) {
        self.warnings.push(ParseWarning::InvalidLine {
            line: line_number,
            message: message.into(),
        });
    }
}

/// 取第一个与最后一个双引号之间的内容（允许文本内含引号）
fn outer_quoted(s: &str) -> Option<&str> {
    let first = s.find('"')?;
    let last = s.rfind('"')?;
    (last > first).then(|| &s[first + 1..last])
}

/// 恰好一个词
fn single_token(s: &str) -> Option<&str> {
    let mut tokens = s.split_whitespace();
    let token = tokens.next()?;
    tokens.next().is_none().then_some(token)
}

/// 具名位置或 `x,y`
fn parse_position(spec: &str) -> Option<ScreenPosition> {
    if let Some(position) = ScreenPosition::from_name(spec) {
        return Some(position);
    }
    let (x, y) = spec.split_once(',')?;
    let x: f32 = x.trim().parse().ok()?;
    let y: f32 = y.trim().parse().ok()?;
    (x.is_finite() && y.is_finite()).then_some(ScreenPosition::Custom { x, y })
}

/// `"text" -> label [if var == int]`
fn parse_option(statement: &str) -> Option<ChoiceOption> {
    let (text, rest) = parse_quoted(statement)?;
    let after = rest.trim().strip_prefix("->")?.trim();

    let (target, condition) = match after.split_once(char::is_whitespace) {
        Some((target, tail)) => {
            let (var, value) = parse_equality(keyword_rest(tail.trim(), "if")?)?;
            (
                target,
                Some(Condition {
                    var: var.to_string(),
                    value,
                }),
            )
        }
        None => (after, None),
    };

    if target != END_LABEL && !is_identifier(target) {
        return None;
    }
    Some(ChoiceOption {
        text: text.to_string(),
        target: target.to_string(),
        condition,
    })
}
