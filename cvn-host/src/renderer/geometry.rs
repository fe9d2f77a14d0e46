//! # Geometry 模块
//!
//! 坐标换算。
//!
//! 坐标有两种模式：`|v| <= 2.0` 视为相对显示器尺寸的归一化值，
//! 其余视为像素值。因此 2.0 表示两倍宽度，而 2.01 表示 2 像素左右。

use crate::display::Rect;

/// 归一化坐标的阈值（含）
pub const NORMALIZED_LIMIT: f32 = 2.0;

/// 把坐标换算为像素
///
/// # 参数
///
/// - `value`: 实例坐标
/// - `extent`: 显示器在该轴上的像素尺寸
pub fn resolve_coord(value: f32, extent: u32) -> f32 {
    if value.abs() <= NORMALIZED_LIMIT {
        value * extent as f32
    } else {
        value
    }
}

/// 计算目标矩形
///
/// 左上角 = 像素位置 − 缩放后尺寸 × 锚点。
/// 左上角向下取整，避免负坐标向零截断产生 1 像素偏移；宽高截断。
pub fn dest_rect(
    (px, py): (f32, f32),
    (width, height): (f32, f32),
    (anchor_x, anchor_y): (f32, f32),
) -> Rect {
    Rect {
        x: (px - width * anchor_x).floor() as i32,
        y: (py - height * anchor_y).floor() as i32,
        w: width as i32,
        h: height as i32,
    }
}

/// 背景铺满缩放：`max(dw / tw, dh / th)`
///
/// 纹理尺寸为 0 时返回 1.0。
pub fn cover_scale(texture: (u32, u32), display: (u32, u32)) -> f32 {
    let (tw, th) = texture;
    let (dw, dh) = display;
    if tw == 0 || th == 0 {
        return 1.0;
    }
    (dw as f32 / tw as f32).max(dh as f32 / th as f32)
}

/// 从 `0xRRGGBBAA` 取出 RGB（alpha 字节不使用）
pub fn tint_rgb(tint: u32) -> (u8, u8, u8) {
    ((tint >> 24) as u8, (tint >> 16) as u8, (tint >> 8) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_coord_modes() {
        assert_eq!(resolve_coord(0.5, 1000), 500.0);
        assert_eq!(resolve_coord(500.0, 1000), 500.0);
        assert_eq!(resolve_coord(2.0, 1000), 2000.0);
        assert_eq!(resolve_coord(2.01, 1000), 2.01);
        assert_eq!(resolve_coord(-1.0, 1000), -1000.0);
        assert_eq!(resolve_coord(-5.0, 1000), -5.0);
    }

    #[test]
    fn test_dest_rect_anchor() {
        let rect = dest_rect((500.0, 400.0), (100.0, 200.0), (0.5, 1.0));
        assert_eq!(
            rect,
            Rect {
                x: 450,
                y: 200,
                w: 100,
                h: 200
            }
        );
    }

    #[test]
    fn test_dest_rect_floors_negative_origin() {
        // 贴近左上边缘时左上角为负小数
        let rect = dest_rect((10.0, 20.5), (41.0, 42.0), (0.5, 0.5));
        assert_eq!((rect.x, rect.y), (-11, -1));
        let rect = dest_rect((30.0, 40.5), (41.0, 42.0), (0.5, 0.5));
        assert_eq!((rect.x, rect.y), (9, 19));
    }

    #[test]
    fn test_cover_scale() {
        assert_eq!(cover_scale((100, 50), (1000, 500)), 10.0);
        assert_eq!(cover_scale((1920, 1080), (1280, 1080)), 1.0);
        assert_eq!(cover_scale((0, 50), (1000, 500)), 1.0);
    }

    #[test]
    fn test_tint_rgb() {
        assert_eq!(tint_rgb(0xFF8040AA), (0xFF, 0x80, 0x40));
        assert_eq!(tint_rgb(0xFFFFFFFF), (255, 255, 255));
    }
}
