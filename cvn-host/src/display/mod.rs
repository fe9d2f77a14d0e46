//! # Display 模块
//!
//! 物理显示器的抽象。
//!
//! 窗口创建、图形上下文与纹理上传都在 [`DisplayOutput`] 之外完成；
//! 渲染器只向输出提交 [`DrawCall`]。仓库自带的 [`HeadlessDisplay`] 只记录绘制调用，
//! 用于测试与 headless 运行。

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::resources::TextureId;

/// 显示器标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayId {
    /// 主显示器（如电视）
    Primary,
    /// 副显示器（如掌机/伴侣屏）
    Secondary,
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// 像素矩形（左上角 + 尺寸）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// 单次绘制
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// 所属图层
    pub layer: String,
    /// 实例 ID
    pub instance: String,
    pub texture: TextureId,
    /// 目标矩形
    pub dest: Rect,
    /// 绕矩形中心顺时针旋转（度）
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    /// 颜色调制 (r, g, b)
    pub color_mod: (u8, u8, u8),
    pub alpha: u8,
}

/// 显示输出
///
/// 每个物理显示器一个实现。`clear` → 若干 `draw` → `present` 构成一帧。
pub trait DisplayOutput {
    fn id(&self) -> DisplayId;

    /// 像素尺寸 (width, height)
    fn size(&self) -> (u32, u32);

    /// 显示器是否可用（窗口被关闭或设备断开时为 false）
    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    fn clear(&mut self);

    fn draw(&mut self, call: &DrawCall);

    fn present(&mut self);
}

/// 绘制记录
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    /// 当前帧（尚未 present）的绘制
    pub pending: Vec<DrawCall>,
    /// 已 present 的帧
    pub presented: Vec<Vec<DrawCall>>,
    /// clear 调用次数
    pub clears: usize,
}

impl FrameLog {
    /// 最近一次 present 的帧
    pub fn last_frame(&self) -> Option<&[DrawCall]> {
        self.presented.last().map(Vec::as_slice)
    }
}

/// 共享的绘制记录句柄
pub type FrameRecorder = Rc<RefCell<FrameLog>>;

/// 只记录绘制调用的显示输出
#[derive(Debug)]
pub struct HeadlessDisplay {
    id: DisplayId,
    width: u32,
    height: u32,
    active: bool,
    log: FrameRecorder,
    /// 保留的已 present 帧数量上限（0 表示不限）
    history_limit: usize,
}

impl HeadlessDisplay {
    /// 创建 headless 显示器，同时返回绘制记录句柄
    pub fn new(id: DisplayId, width: u32, height: u32) -> (Self, FrameRecorder) {
        let log = FrameRecorder::default();
        let display = Self {
            id,
            width,
            height,
            active: true,
            log: Rc::clone(&log),
            history_limit: 0,
        };
        (display, log)
    }

    /// 只保留最近 `limit` 帧
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

impl DisplayOutput for HeadlessDisplay {
    fn id(&self) -> DisplayId {
        self.id
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn clear(&mut self) {
        let mut log = self.log.borrow_mut();
        log.pending.clear();
        log.clears += 1;
    }

    fn draw(&mut self, call: &DrawCall) {
        self.log.borrow_mut().pending.push(call.clone());
    }

    fn present(&mut self) {
        let mut log = self.log.borrow_mut();
        let frame = std::mem::take(&mut log.pending);
        log.presented.push(frame);
        if self.history_limit > 0 && log.presented.len() > self.history_limit {
            let excess = log.presented.len() - self.history_limit;
            log.presented.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(instance: &str) -> DrawCall {
        DrawCall {
            layer: "actors".to_string(),
            instance: instance.to_string(),
            texture: TextureId(0),
            dest: Rect::default(),
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            color_mod: (255, 255, 255),
            alpha: 255,
        }
    }

    #[test]
    fn test_headless_records_frames() {
        let (mut display, log) = HeadlessDisplay::new(DisplayId::Primary, 640, 480);
        assert_eq!(display.size(), (640, 480));

        display.clear();
        display.draw(&call("a"));
        display.draw(&call("b"));
        display.present();

        let log = log.borrow();
        assert_eq!(log.clears, 1);
        assert_eq!(log.presented.len(), 1);
        assert_eq!(log.last_frame().unwrap().len(), 2);
        assert!(log.pending.is_empty());
    }

    #[test]
    fn test_history_limit() {
        let (display, log) = HeadlessDisplay::new(DisplayId::Secondary, 10, 10);
        let mut display = display.with_history_limit(2);
        for name in ["a", "b", "c"] {
            display.clear();
            display.draw(&call(name));
            display.present();
        }

        let log = log.borrow();
        assert_eq!(log.presented.len(), 2);
        assert_eq!(log.presented[0][0].instance, "b");
    }

    #[test]
    fn test_display_id_serde() {
        let json = serde_json::to_string(&DisplayId::Secondary).unwrap();
        assert_eq!(json, "\"secondary\"");
        let id: DisplayId = serde_json::from_str("\"primary\"").unwrap();
        assert_eq!(id, DisplayId::Primary);
    }
}
