//! Shared geometry calculations for shapes
//!
//! Constants and math shared between the preview renderer (display scale)
//! and the final compositor (natural scale).

use tiny_skia::{Path, PathBuilder};

use crate::domain::Point;

/// Arrow geometry constants
pub mod arrow {
    use crate::domain::Point;

    /// Base arrowhead length before stroke size is added
    pub const HEAD_BASE: f32 = 10.0;
    /// Arrowhead angle from shaft in radians (30 degrees)
    pub const HEAD_ANGLE: f32 = std::f32::consts::FRAC_PI_6;

    /// Calculate arrow head points for a segment `a -> b`
    ///
    /// Returns the two barb end points; the barbs are drawn from `b`.
    pub fn head_points(a: Point, b: Point, head: f32) -> (Point, Point) {
        let angle = (b.y - a.y).atan2(b.x - a.x);
        let barb = |offset: f32| {
            Point::new(
                b.x - head * (angle + offset).cos(),
                b.y - head * (angle + offset).sin(),
            )
        };
        (barb(-HEAD_ANGLE), barb(HEAD_ANGLE))
    }
}

/// Region effect constants
pub mod effect {
    /// Preview blur approximation: one thumbnail pixel per this many display pixels
    pub const PREVIEW_BLUR_CELL: f32 = 8.0;
    /// Outline drawn around blur/pixelate regions in the preview (rgba)
    pub const PREVIEW_OUTLINE: [u8; 4] = [102, 204, 255, 230];
    /// Outline drawn around blur/pixelate regions in the export
    pub const FINAL_OUTLINE: [u8; 4] = [102, 204, 255, 255];
}

/// Alignment grid constants
pub mod grid {
    /// Grid pitch in natural-image pixels before scaling
    pub const PITCH: f32 = 50.0;
    /// Smallest grid pitch in device pixels
    pub const MIN_STEP: f32 = 10.0;
    pub const COLOR: [u8; 4] = [102, 204, 255, 31];

    /// Grid cell size in device pixels for a display scale
    pub fn step(scale: f32) -> f32 {
        (PITCH * scale).round().max(MIN_STEP)
    }
}

/// Text constants
pub mod text {
    /// Font size per unit of stroke size
    pub const SIZE_FACTOR: f32 = 6.0;
    pub const MIN_FONT_SIZE: f32 = 10.0;

    pub fn font_size(size: f32, scale: f32) -> f32 {
        (size * SIZE_FACTOR * scale).max(MIN_FONT_SIZE)
    }
}

/// Ellipse bezier approximation constant: 4/3 * (sqrt(2) - 1)
pub const BEZIER_K: f32 = 0.552_284_8;

/// Stroke width at a given scale; never thinner than one pixel
#[inline]
pub fn stroke_width(size: f32, scale: f32) -> f32 {
    (size * scale).max(1.0)
}

/// Build an ellipse path using cubic bezier curves
pub fn ellipse_path(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let (rx, ry) = ((w / 2.0).abs(), (h / 2.0).abs());
    let kx = rx * BEZIER_K;
    let ky = ry * BEZIER_K;

    let mut pb = PathBuilder::new();
    pb.move_to(cx, cy - ry);
    pb.cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy);
    pb.cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry);
    pb.cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy);
    pb.cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry);
    pb.close();
    pb.finish()
}

/// Rectangle outline inset by half a pixel so one-pixel borders stay crisp
pub fn inset_rect_path(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    let (l, t) = (x + 0.5, y + 0.5);
    let (r, b) = (l + (w - 1.0).max(0.0), t + (h - 1.0).max(0.0));
    let mut pb = PathBuilder::new();
    pb.move_to(l, t);
    pb.line_to(r, t);
    pb.line_to(r, b);
    pb.line_to(l, b);
    pb.close();
    pb.finish()
}

/// Polyline through `points` scaled by `scale`, plus arrow barbs if `head` is set
pub fn polyline_path(points: &[Point], scale: f32, head: Option<f32>) -> Option<Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    let first = points[0].scaled(scale);
    pb.move_to(first.x, first.y);
    for p in &points[1..] {
        let p = p.scaled(scale);
        pb.line_to(p.x, p.y);
    }
    if let Some(head) = head {
        let a = points[points.len() - 2].scaled(scale);
        let b = points[points.len() - 1].scaled(scale);
        let (h1, h2) = arrow::head_points(a, b, head);
        pb.move_to(b.x, b.y);
        pb.line_to(h1.x, h1.y);
        pb.move_to(b.x, b.y);
        pb.line_to(h2.x, h2.y);
    }
    pb.finish()
}

/// Vertical and horizontal grid lines covering a `width` x `height` surface
pub fn grid_path(width: u32, height: u32, scale: f32) -> Option<Path> {
    let step = grid::step(scale);
    let (w, h) = (width as f32, height as f32);
    let mut pb = PathBuilder::new();
    let mut x = 0.0;
    while x < w {
        pb.move_to(x, 0.0);
        pb.line_to(x, h);
        x += step;
    }
    let mut y = 0.0;
    while y < h {
        pb.move_to(0.0, y);
        pb.line_to(w, y);
        y += step;
    }
    pb.finish()
}
