//! # App 模块
//!
//! 会话状态与逐帧循环。
//!
//! 每一帧：依次处理玩家意图（每个意图至多推进解释器一步）→
//! 推进打字机、暂停、渐变与震动计时 → clear / draw / present。

mod script_loader;

pub use script_loader::*;

use cvn_runtime::{
    Intent, Interpreter, MachineState, SceneRequest, ScriptDocument, Typewriter,
};
use tracing::{debug, info, warn};

use crate::audio::{AudioManager, AudioSink};
use crate::command_executor::{CommandExecutor, ExecuteResult};
use crate::config::AppConfig;
use crate::display::DisplayOutput;
use crate::renderer::SceneRenderer;
use crate::resources::{ResourceManager, TextureLoader};

/// 会话使用的外部后端
pub struct SessionBackends {
    /// 显示输出（每个物理显示器一个）
    pub outputs: Vec<Box<dyn DisplayOutput>>,
    pub loader: Box<dyn TextureLoader>,
    pub audio: Box<dyn AudioSink>,
}

/// 一次脚本运行
pub struct Session {
    config: AppConfig,
    interpreter: Interpreter,
    renderer: SceneRenderer,
    resources: ResourceManager,
    audio: AudioManager,
    executor: CommandExecutor,
    quit_requested: bool,
    frame_count: u64,
}

impl Session {
    /// 创建会话
    ///
    /// 按配置创建渲染器并应用图层路由；路由中出现的未知图层会被创建。
    pub fn new(config: AppConfig, document: ScriptDocument, backends: SessionBackends) -> Self {
        let mut renderer = SceneRenderer::new(config.limits.renderer_limits())
            .with_fade_timings(config.transitions.fade_timings());
        for output in backends.outputs {
            renderer.add_output(output);
        }

        for (layer, targets) in config.effective_routes() {
            if renderer.layer(&layer).is_none()
                && let Some(first) = targets.first()
                && let Err(e) = renderer.create_layer(&layer, *first)
            {
                warn!(layer = %layer, error = %e, "无法创建配置中的图层");
                continue;
            }
            if let Err(e) = renderer.route_layer(&layer, &targets) {
                warn!(layer = %layer, error = %e, "图层路由失败");
            }
        }

        let resources = ResourceManager::new(config.assets_root.clone(), backends.loader)
            .with_capacity(config.limits.textures);
        let audio = AudioManager::new(config.assets_root.clone(), backends.audio, &config.audio);
        let typewriter = Typewriter::new(config.typewriter.seconds_per_char);
        let interpreter = Interpreter::with_typewriter(document, typewriter);

        Self {
            config,
            interpreter,
            renderer,
            resources,
            audio,
            executor: CommandExecutor::new(),
            quit_requested: false,
            frame_count: 0,
        }
    }

    /// 开始执行脚本（重复调用无效）
    pub fn start(&mut self) -> ExecuteResult {
        let requests = self.interpreter.start();
        self.apply(&requests)
    }

    /// 运行一帧
    ///
    /// # 参数
    ///
    /// - `intents`: 本帧的玩家意图
    /// - `dt`: 帧间隔时间（秒）
    pub fn frame(&mut self, intents: &[Intent], dt: f32) {
        for intent in intents {
            if *intent == Intent::Quit {
                info!("收到退出请求");
                self.quit_requested = true;
                continue;
            }
            let requests = self.interpreter.handle(*intent);
            self.apply(&requests);
        }

        let requests = self.interpreter.update(dt);
        self.apply(&requests);
        self.renderer.update(dt);

        self.render();
        self.frame_count += 1;
    }

    /// clear → draw → present
    pub fn render(&mut self) {
        self.renderer.render(&self.resources);
    }

    /// 自动播放时下一帧的意图
    ///
    /// 对话中推进（打字机未完成时先补全），选择时确认当前高亮项，
    /// 暂停期间与结束后不产生意图。
    pub fn auto_intent(&self) -> Option<Intent> {
        match self.interpreter.machine() {
            MachineState::Dialogue if !self.interpreter.is_paused() => Some(Intent::Advance),
            MachineState::Choice => Some(Intent::Confirm),
            _ => None,
        }
    }

    /// 会话是否应当结束（脚本结束或收到退出请求）
    pub fn should_exit(&self) -> bool {
        self.quit_requested || self.interpreter.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.interpreter.is_finished()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    fn apply(&mut self, requests: &[SceneRequest]) -> ExecuteResult {
        if requests.is_empty() {
            return ExecuteResult::Ok;
        }
        debug!(count = requests.len(), "执行场景请求");
        self.executor.execute_batch(
            requests,
            &mut self.renderer,
            &mut self.resources,
            &mut self.audio,
        )
    }
}
