//! 脚本读取与加载

use std::path::Path;

use cvn_runtime::{
    DiagnosticLevel, Parser, ScriptDocument, analyze_document, warnings_to_diagnostics,
};
use tracing::{error, info, warn};

use crate::config::AppConfig;

/// 从路径提取脚本 ID（文件名去掉扩展名）
pub fn script_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "script".to_string())
}

/// 读取脚本文件
///
/// 文件不存在或无法读取时返回空文本并记录警告，之后由 [`load_document`]
/// 替换为占位脚本。
pub fn read_script(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "脚本文件读取失败");
            String::new()
        }
    }
}

/// 解析脚本文本
///
/// 解析警告逐条记录到日志；`debug.script_check` 开启时额外做静态检查。
/// 文本为空或没有任何指令时返回占位脚本。
pub fn load_document(config: &AppConfig, script_id: &str, text: &str) -> ScriptDocument {
    if text.trim().is_empty() {
        warn!(script = %script_id, "脚本为空，使用占位脚本");
        return ScriptDocument::placeholder(config.placeholder_text.clone());
    }

    let mut parser = Parser::new();
    let document = parser.parse(text);
    info!(script = %script_id, commands = document.len(), "脚本解析完成");

    if config.debug.script_check {
        let mut result = warnings_to_diagnostics(script_id, parser.warnings());
        result.merge(analyze_document(script_id, &document));
        result.sort_by_line();
        for diagnostic in &result.diagnostics {
            match diagnostic.level {
                DiagnosticLevel::Error => error!("{diagnostic}"),
                DiagnosticLevel::Warn => warn!("{diagnostic}"),
                DiagnosticLevel::Info => info!("{diagnostic}"),
            }
        }
    } else {
        for warning in parser.warnings() {
            warn!(script = %script_id, line = warning.line(), "解析警告: {warning}");
        }
    }

    if document.is_empty() {
        warn!(script = %script_id, "脚本没有任何指令，使用占位脚本");
        return ScriptDocument::placeholder(config.placeholder_text.clone());
    }

    document
}
