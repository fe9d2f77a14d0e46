//! # CVN headless 运行器
//!
//! 不打开窗口，按固定步长驱动会话，绘制调用写入 headless 显示器。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p cvn-host
//! cargo run -p cvn-host -- --script assets/scripts/demo.cvn
//! cargo run -p cvn-host -- --intents advance,down,confirm --log-level debug
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cvn_host::app::{read_script, script_id_from_path};
use cvn_host::display::FrameRecorder;
use cvn_host::{
    AppConfig, DisplayId, HeadlessDisplay, ImageLoader, NullAudioSink, Session, SessionBackends,
    load_document,
};
use cvn_runtime::Intent;
use tracing::info;

#[derive(Parser)]
#[command(name = "cvn")]
#[command(about = "双屏视觉小说引擎 - headless 运行器")]
#[command(version)]
struct Cli {
    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 入口脚本，覆盖配置中的 start_script_path
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// 逗号分隔的意图序列，每帧一个（如 advance,down,confirm）；
    /// 不提供时自动播放到结束
    #[arg(short, long, value_delimiter = ',')]
    intents: Vec<String>,

    /// 帧间隔（秒）
    #[arg(long, default_value = "0.016")]
    dt: f32,

    /// 最多运行的帧数
    #[arg(long, default_value = "100000")]
    max_frames: u64,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    let config = AppConfig::load(&cli.config);
    config.validate().context("配置无效")?;

    let script_path = cli
        .script
        .clone()
        .unwrap_or_else(|| config.start_script_full_path());
    let script_id = script_id_from_path(&script_path);
    let text = read_script(&script_path);
    let document = load_document(&config, &script_id, &text);

    let scripted: Vec<Intent> = cli
        .intents
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            Intent::from_name(name.trim()).with_context(|| format!("未知的意图: {name}"))
        })
        .collect::<Result<_>>()?;

    let mut recorders: Vec<(DisplayId, FrameRecorder)> = Vec::new();
    let mut outputs: Vec<Box<dyn cvn_host::DisplayOutput>> = Vec::new();
    for (id, display) in config.displays.enabled() {
        let (output, recorder) = HeadlessDisplay::new(id, display.width, display.height);
        outputs.push(Box::new(output.with_history_limit(1)));
        recorders.push((id, recorder));
    }

    let mut session = Session::new(
        config,
        document,
        SessionBackends {
            outputs,
            loader: Box::new(ImageLoader),
            audio: Box::new(NullAudioSink),
        },
    );
    session.start();

    let mut scripted = scripted.into_iter();
    let auto_play = cli.intents.is_empty();
    while session.frame_count() < cli.max_frames && !session.should_exit() {
        let intent = if auto_play {
            session.auto_intent()
        } else {
            match scripted.next() {
                Some(intent) => Some(intent),
                None => break,
            }
        };
        session.frame(intent.as_slice(), cli.dt);
    }

    for (id, recorder) in &recorders {
        let log = recorder.borrow();
        let draws = log.last_frame().map_or(0, |frame| frame.len());
        info!(display = %id, frames = log.clears, last_frame_draws = draws, "显示器统计");
    }

    let stats = session.executor().stats();
    info!(
        frames = session.frame_count(),
        finished = session.is_finished(),
        executed = stats.executed,
        failed = stats.failed,
        "运行结束"
    );
    if let Some(dialogue) = session.interpreter().dialogue() {
        info!(text = %dialogue.text, "最后一句");
    }

    Ok(())
}
