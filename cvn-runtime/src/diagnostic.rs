//! # 诊断模块
//!
//! 提供脚本静态检查和诊断 API，不依赖 IO 或引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 复用 parser 与文档查询，不重复解析逻辑

use std::collections::HashSet;

use crate::error::ParseWarning;
use crate::script::{Command, END_LABEL, Parser, ScriptDocument};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 脚本 ID / 文件路径
    pub script_id: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选）
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(
        level: DiagnosticLevel,
        script_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            script_id: script_id.into(),
            line: None,
            message: message.into(),
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, script_id, message)
    }

    /// 创建警告诊断
    pub fn warn(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, script_id, message)
    }

    /// 创建信息诊断
    pub fn info(script_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Info, script_id, message)
    }

    /// 设置行号
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// 设置行号（可选）
    pub fn with_optional_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.script_id)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: DiagnosticResult) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    /// 获取警告数量
    pub fn warn_count(&self) -> usize {
        self.count(DiagnosticLevel::Warn)
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics.iter().filter(|d| d.level == level).count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// 按最低级别过滤（返回该级别及以上的诊断）
    pub fn filter_by_level(&self, min_level: DiagnosticLevel) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level >= min_level)
            .collect()
    }

    /// 按行号排序（无行号的排在最前）
    pub fn sort_by_line(&mut self) {
        self.diagnostics.sort_by_key(|d| d.line);
    }
}

/// 脚本中的素材引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// 引用它的指令名（scene / show / play）
    pub command: &'static str,
    pub asset_type: String,
    pub name: String,
    /// 解析出的路径（未定义时为 `None`）
    pub path: Option<String>,
    /// 源码行号
    pub line: Option<usize>,
}

//=============================================================================
// 脚本分析 API
//=============================================================================

/// 将解析警告转换为诊断
pub fn warnings_to_diagnostics(script_id: &str, warnings: &[ParseWarning]) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    for warning in warnings {
        result.push(Diagnostic::warn(script_id, warning.to_string()).with_line(warning.line()));
    }
    result
}

/// 解析并分析脚本文本
///
/// # 返回
///
/// 解析得到的文档，以及解析警告与静态检查合并后的诊断
pub fn analyze_text(script_id: &str, text: &str) -> (ScriptDocument, DiagnosticResult) {
    let mut parser = Parser::new();
    let document = parser.parse(text);

    let mut result = warnings_to_diagnostics(script_id, parser.warnings());
    result.merge(analyze_document(script_id, &document));
    result.sort_by_line();
    (document, result)
}

/// 分析脚本文档，返回诊断结果
///
/// 执行以下检查：
/// - 未定义的说话者（Warn）
/// - 未定义的素材引用（Error）
/// - 未定义的跳转目标（jump / if / choice，Error）
/// - 角色颜色超出 `0xRRGGBB` 范围（Warn）
/// - 角色缺少显示名、素材未被使用（Info）
///
/// # 参数
///
/// - `script_id`: 脚本标识（通常是文件路径）
/// - `document`: 已解析的脚本
pub fn analyze_document(script_id: &str, document: &ScriptDocument) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let defined_labels: HashSet<&str> = document.labels.iter().map(|l| l.name.as_str()).collect();

    for (index, command) in document.commands.iter().enumerate() {
        let line = document.source_line(index);

        if let Command::Say {
            speaker: Some(speaker),
            ..
        } = command
            && document.character(speaker).is_none()
        {
            result.push(
                Diagnostic::warn(script_id, format!("未定义的角色: {}", speaker))
                    .with_optional_line(line)
                    .with_detail("说话者将直接显示为角色 ID"),
            );
        }

        for target in jump_targets(command) {
            if target != END_LABEL && !defined_labels.contains(target) {
                result.push(
                    Diagnostic::error(script_id, format!("未定义的跳转目标: {}", target))
                        .with_optional_line(line)
                        .with_detail(format!(
                            "{} 引用了不存在的 label '{}'",
                            command.kind_name(),
                            target
                        )),
                );
            }
        }
    }

    for reference in extract_asset_references(document) {
        if reference.path.is_none() {
            result.push(
                Diagnostic::error(
                    script_id,
                    format!("未定义的素材: {}/{}", reference.asset_type, reference.name),
                )
                .with_optional_line(reference.line)
                .with_detail(format!("{} 引用的素材需要先用 asset 定义", reference.command)),
            );
        }
    }

    for character in &document.characters {
        if character.name_color > 0xFF_FFFF {
            result.push(
                Diagnostic::warn(
                    script_id,
                    format!(
                        "角色 {} 的 name_color 超出 0xRRGGBB 范围: {:#X}",
                        character.id, character.name_color
                    ),
                )
                .with_detail("高位字节会被忽略"),
            );
        }
        if character.display_name.is_empty() {
            result.push(Diagnostic::info(
                script_id,
                format!("角色 {} 未设置 display_name", character.id),
            ));
        }
    }

    let referenced: HashSet<(&str, &str)> = document
        .commands
        .iter()
        .filter_map(asset_key)
        .collect();
    for asset in &document.assets {
        if !referenced.contains(&(asset.asset_type.as_str(), asset.name.as_str())) {
            result.push(Diagnostic::info(
                script_id,
                format!("素材未被使用: {}/{}", asset.asset_type, asset.name),
            ));
        }
    }

    result
}

/// 提取脚本中的所有素材引用
///
/// 遍历指令，提取 scene / show / play 引用的素材，并尝试解析路径。
pub fn extract_asset_references(document: &ScriptDocument) -> Vec<AssetReference> {
    document
        .commands
        .iter()
        .enumerate()
        .filter_map(|(index, command)| {
            let (asset_type, name) = asset_key(command)?;
            Some(AssetReference {
                command: command.kind_name(),
                asset_type: asset_type.to_string(),
                name: name.to_string(),
                path: document.resolve(asset_type, name).map(str::to_string),
                line: document.source_line(index),
            })
        })
        .collect()
}

/// 获取所有已定义的标签
pub fn get_defined_labels(document: &ScriptDocument) -> Vec<&str> {
    document.labels.iter().map(|l| l.name.as_str()).collect()
}

fn asset_key(command: &Command) -> Option<(&str, &str)> {
    match command {
        Command::Scene { asset_type, name }
        | Command::Show {
            asset_type, name, ..
        }
        | Command::PlayAudio {
            asset_type, name, ..
        } => Some((asset_type.as_str(), name.as_str())),
        _ => None,
    }
}

fn jump_targets(command: &Command) -> Vec<&str> {
    match command {
        Command::Jump { label } | Command::If { label, .. } => vec![label.as_str()],
        Command::Choice { options, .. } => options.iter().map(|o| o.target.as_str()).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_script_has_no_errors() {
        let text = r#"
character chocola {
    display_name: "Chocola";
    name_color: 0xFF69B4;
}
asset bg room = "bg/room.png"
scene bg room
say(chocola, "Hi")
choice {
    "Again" -> start
    "Stop" -> end
}
label start
end
"#;
        let (_, result) = analyze_text("clean.cvn", text);
        assert!(result.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn test_undefined_references() {
        let text = r#"
scene bg nowhere
say(ghost, "Boo")
jump missing
if x == 1 jump also_missing
"#;
        let (_, result) = analyze_text("broken.cvn", text);

        assert_eq!(result.error_count(), 3);
        assert_eq!(result.warn_count(), 1);

        let errors = result.filter_by_level(DiagnosticLevel::Error);
        assert_eq!(errors[0].line, Some(2));
        assert!(errors[0].message.contains("bg/nowhere"));
        assert_eq!(errors[1].line, Some(4));
        assert!(errors[2].message.contains("also_missing"));
    }

    #[test]
    fn test_parse_warnings_become_diagnostics() {
        let text = "asset bg a = \"a.png\"\nasset bg a = \"b.png\"\nscene bg a\nwhat is this";
        let (_, result) = analyze_text("dup.cvn", text);

        assert!(!result.has_errors());
        assert_eq!(result.warn_count(), 2);
        assert_eq!(result.diagnostics[0].line, Some(2));
        assert_eq!(result.diagnostics[1].line, Some(4));
    }

    #[test]
    fn test_character_checks() {
        let text = "character a { name_color: 0xFF00FF80 }\nsay(a, \"x\")";
        let doc = ScriptDocument::parse(text);
        let result = analyze_document("chars.cvn", &doc);

        assert_eq!(result.warn_count(), 1);
        let infos: Vec<_> = result
            .diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Info)
            .collect();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].message.contains("display_name"));
        // 按最低级别过滤：Info 及以上包含 Warn
        assert_eq!(result.filter_by_level(DiagnosticLevel::Info).len(), 2);
        assert_eq!(result.filter_by_level(DiagnosticLevel::Warn).len(), 1);
    }

    #[test]
    fn test_unused_asset_is_info() {
        let doc = ScriptDocument::parse("asset sfx bell = \"bell.wav\"\nsay(\"quiet\")");
        let result = analyze_document("unused.cvn", &doc);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].level, DiagnosticLevel::Info);
    }

    #[test]
    fn test_extract_asset_references() {
        let text = r#"
asset sprite chocola = "sprites/chocola.png"
show sprite chocola as c
play music theme
"#;
        let doc = ScriptDocument::parse(text);
        let refs = extract_asset_references(&doc);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].path.as_deref(), Some("sprites/chocola.png"));
        assert_eq!(refs[0].command, "show");
        assert_eq!(refs[1].path, None);
        assert_eq!(refs[1].line, Some(4));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error("main.cvn", "未定义的跳转目标: x")
            .with_line(3)
            .with_detail("jump 引用了不存在的 label 'x'");
        assert_eq!(
            diag.to_string(),
            "[ERROR] main.cvn:3: 未定义的跳转目标: x\n  | jump 引用了不存在的 label 'x'"
        );
    }
}
