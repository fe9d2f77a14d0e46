//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 cvn-runtime 覆盖率
//! - `script-check`: 检查脚本文件（语法、label、素材引用）

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cvn_runtime::{DiagnosticResult, analyze_text, extract_asset_references};
use walkdir::WalkDir;
use xshell::{Shell, cmd};

/// 脚本文件扩展名
const SCRIPT_EXTENSION: &str = "cvn";

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let sh = Shell::new()?;

            eprintln!("\n==> cargo fmt --all -- --check");
            cmd!(sh, "cargo fmt --all -- --check").run()?;

            eprintln!("\n==> cargo clippy --workspace --all-targets");
            cmd!(sh, "cargo clippy --workspace --all-targets").run()?;

            eprintln!("\n==> cargo test --workspace");
            cmd!(sh, "cargo test --workspace").run()?;
        }
        "cov-runtime" => {
            let sh = Shell::new()?;
            if cmd!(sh, "cargo llvm-cov --version").quiet().run().is_err() {
                anyhow::bail!(
                    "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
                );
            }

            eprintln!("\n==> cargo llvm-cov -p cvn-runtime --html");
            cmd!(sh, "cargo llvm-cov -p cvn-runtime --html").run()?;
            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "script-check" => {
            let mut config = ScriptCheckConfig::default();
            let mut path = None;
            while let Some(arg) = args.next() {
                if arg == "--assets" {
                    let root = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--assets 需要一个目录参数"))?;
                    config.assets_root = PathBuf::from(root);
                } else {
                    path = Some(arg);
                }
            }
            script_check(path.as_deref(), &config)?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 cvn-runtime 覆盖率报告
  script-check    检查脚本文件

SCRIPT-CHECK:
  cargo xtask script-check [path] [--assets <dir>]

  不带路径：检查 assets/scripts/ 下所有 .cvn 文件
  带路径参数：检查指定文件或目录
  --assets：素材根目录（默认 assets）

  检查内容：
    - 解析警告（无法识别的行、重复定义、容量上限）
    - 未定义的说话角色、素材与跳转目标
    - 素材文件是否存在

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo script-check  -> cargo xtask script-check
"#
    );
}

//=============================================================================
// script-check 命令实现
//=============================================================================

/// 脚本检查配置
struct ScriptCheckConfig {
    /// 脚本目录（相对于 workspace root）
    scripts_dir: PathBuf,
    /// 素材根目录（相对于 workspace root）
    assets_root: PathBuf,
}

impl Default for ScriptCheckConfig {
    fn default() -> Self {
        Self {
            scripts_dir: PathBuf::from("assets/scripts"),
            assets_root: PathBuf::from("assets"),
        }
    }
}

/// 脚本检查结果
struct ScriptCheckResult {
    /// 检查的脚本数量
    scripts_checked: usize,
    /// 无法读取的文件数量
    read_errors: usize,
    /// 诊断结果
    diagnostics: DiagnosticResult,
    /// 缺失的素材文件
    missing_assets: Vec<MissingAsset>,
}

/// 缺失的素材信息
struct MissingAsset {
    script_id: String,
    asset_type: String,
    path: String,
    line: Option<usize>,
}

/// 执行脚本检查
fn script_check(path: Option<&str>, config: &ScriptCheckConfig) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_script_files(&path)?
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            if !config.scripts_dir.exists() {
                anyhow::bail!(
                    "默认脚本目录不存在: {}\n请在 workspace 根目录运行，或指定脚本路径",
                    config.scripts_dir.display()
                );
            }
            collect_script_files(&config.scripts_dir)?
        }
    };

    if files.is_empty() {
        eprintln!("未找到脚本文件（.{SCRIPT_EXTENSION}）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个脚本文件...\n", files.len());

    let mut result = ScriptCheckResult {
        scripts_checked: 0,
        read_errors: 0,
        diagnostics: DiagnosticResult::new(),
        missing_assets: Vec::new(),
    };

    for file in &files {
        check_script_file(file, config, &mut result);
    }

    print_check_result(&result);

    if result.read_errors > 0 || result.diagnostics.has_errors() {
        anyhow::bail!("脚本检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有脚本文件
fn collect_script_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// 检查单个脚本文件
fn check_script_file(file: &Path, config: &ScriptCheckConfig, result: &mut ScriptCheckResult) {
    let script_id = file.display().to_string();
    result.scripts_checked += 1;

    let content = match std::fs::read_to_string(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ERROR] {}: 无法读取文件 - {}", script_id, e);
            result.read_errors += 1;
            return;
        }
    };

    // 解析警告与语义检查一起进入诊断结果
    let (document, diagnostics) = analyze_text(&script_id, &content);
    result.diagnostics.merge(diagnostics);

    // 未定义的素材已在诊断中报告，这里只检查文件是否存在
    for reference in extract_asset_references(&document) {
        let Some(path) = reference.path else {
            continue;
        };
        if !config.assets_root.join(&path).exists() {
            result.missing_assets.push(MissingAsset {
                script_id: script_id.clone(),
                asset_type: reference.asset_type,
                path,
                line: reference.line,
            });
        }
    }
}

/// 输出检查结果
fn print_check_result(result: &ScriptCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个脚本", result.scripts_checked);
    eprintln!();

    for diag in &result.diagnostics.diagnostics {
        eprintln!("{}", diag);
    }

    for missing in &result.missing_assets {
        let location = match missing.line {
            Some(line) => format!("{}:{}", missing.script_id, line),
            None => missing.script_id.clone(),
        };
        eprintln!(
            "[WARN] {}: 素材文件不存在 [{}] {}",
            location, missing.asset_type, missing.path
        );
    }

    let error_count = result.read_errors + result.diagnostics.error_count();
    let warn_count = result.diagnostics.warn_count() + result.missing_assets.len();

    eprintln!();
    if error_count > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", error_count, warn_count);
    } else if warn_count > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", warn_count);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
