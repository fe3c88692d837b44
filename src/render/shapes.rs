//! Per-shape drawing shared by the preview renderer and the final compositor
//!
//! Geometry is multiplied by `ShapeStyle::scale` (display scale in the
//! preview, 1.0 for export). Region effects sample `ShapeStyle::source`
//! when set, otherwise whatever has already been drawn into the pixmap.

use ab_glyph::FontArc;
use image::imageops::{self, FilterType};
use tiny_skia::{LineCap, LineJoin, Paint, Path, Pixmap, Stroke, Transform};

use super::geometry::{self, arrow, effect};
use super::raster::{clip_box, put_region, region_to_rgba};
use super::text::draw_text;
use crate::domain::{Rect, RegionShape, Shape, StrokeShape, TextShape};

/// How blur regions are produced
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlurMode {
    /// Downsample to a coarse thumbnail and smooth it back up
    Approximate,
    /// Gaussian blur with the given standard deviation
    Gaussian(f32),
}

#[derive(Clone, Copy)]
pub struct ShapeStyle<'a> {
    pub scale: f32,
    pub blur: BlurMode,
    /// Pixelation cell size in pixels of the target surface
    pub pixel_size: u32,
    /// Outline around blur/pixelate regions
    pub effect_outline: [u8; 4],
    pub font: Option<&'a FontArc>,
    /// Pixels blur and pixelate read from; `None` reads the target itself
    pub source: Option<&'a Pixmap>,
    /// Skip regions that round to less than one pixel
    pub pixel_aligned: bool,
}

fn paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    let [r, g, b, a] = color;
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn stroke_path(pixmap: &mut Pixmap, path: &Path, color: [u8; 4], width: f32) {
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(path, &paint(color), &stroke, Transform::identity(), None);
}

/// Stroke a plain (not inset-adjusted) path, used for the alignment grid
pub fn stroke_hairlines(pixmap: &mut Pixmap, path: &Path, color: [u8; 4]) {
    let stroke = Stroke {
        width: 1.0,
        ..Default::default()
    };
    pixmap.stroke_path(path, &paint(color), &stroke, Transform::identity(), None);
}

/// Draw one shape
pub fn draw_shape(pixmap: &mut Pixmap, shape: &Shape, style: &ShapeStyle<'_>) {
    match shape {
        Shape::Rect(r) => draw_region_outline(pixmap, r, style, false),
        Shape::Ellipse(r) => draw_region_outline(pixmap, r, style, true),
        Shape::Blur(r) => draw_effect(pixmap, r, style, |pixmap, rect| match style.blur {
            BlurMode::Approximate => smooth_region(pixmap, style.source, rect),
            BlurMode::Gaussian(sigma) => gaussian_region(pixmap, style.source, rect, sigma),
        }),
        Shape::Pixel(r) => draw_effect(pixmap, r, style, |pixmap, rect| {
            pixelate_region(pixmap, style.source, rect, style.pixel_size)
        }),
        Shape::Line(s) | Shape::Pen(s) => draw_stroke(pixmap, s, style, false),
        Shape::Arrow(s) => draw_stroke(pixmap, s, style, true),
        Shape::Text(t) => draw_text_shape(pixmap, t, style),
    }
}

/// Display-space box of a region shape, with reversed drags flipped
fn display_box(r: &RegionShape, style: &ShapeStyle<'_>) -> Option<(f32, f32, f32, f32)> {
    let mut r = r.clone();
    r.normalize();
    let scale = style.scale;
    let (x, y, w, h) = (r.x * scale, r.y * scale, r.w * scale, r.h * scale);
    // Zero-area regions are skipped rather than treated as errors
    let empty = if style.pixel_aligned {
        w.round() < 1.0 || h.round() < 1.0
    } else {
        w <= 0.0 || h <= 0.0
    };
    if empty {
        return None;
    }
    Some((x, y, w, h))
}

fn draw_region_outline(pixmap: &mut Pixmap, r: &RegionShape, style: &ShapeStyle<'_>, oval: bool) {
    let Some((x, y, w, h)) = display_box(r, style) else {
        return;
    };
    let path = if oval {
        geometry::ellipse_path(x, y, w, h)
    } else {
        geometry::inset_rect_path(x, y, w, h)
    };
    if let Some(path) = path {
        let width = geometry::stroke_width(r.size, style.scale);
        stroke_path(pixmap, &path, r.color.to_rgba_u8(), width);
    }
}

fn draw_effect(
    pixmap: &mut Pixmap,
    r: &RegionShape,
    style: &ShapeStyle<'_>,
    apply: impl FnOnce(&mut Pixmap, Rect),
) {
    let Some((x, y, w, h)) = display_box(r, style) else {
        return;
    };
    if let Some(rect) = clip_box(x, y, w, h, pixmap.width(), pixmap.height()) {
        apply(pixmap, rect);
    }
    if let Some(path) = geometry::inset_rect_path(x, y, w, h) {
        let width = geometry::stroke_width(r.size, style.scale);
        stroke_path(pixmap, &path, style.effect_outline, width);
    }
}

/// Coarse blur: shrink to one pixel per 8x8 cell, then scale back up smoothly
fn smooth_region(pixmap: &mut Pixmap, source: Option<&Pixmap>, rect: Rect) {
    let Some(src) = region_to_rgba(source.unwrap_or(&*pixmap), rect) else {
        return;
    };
    let (w, h) = src.dimensions();
    let sx = ((w as f32 / effect::PREVIEW_BLUR_CELL).floor() as u32).max(1);
    let sy = ((h as f32 / effect::PREVIEW_BLUR_CELL).floor() as u32).max(1);
    let thumb = imageops::resize(&src, sx, sy, FilterType::Triangle);
    let smooth = imageops::resize(&thumb, w, h, FilterType::Triangle);
    put_region(pixmap, &smooth, rect.left, rect.top);
}

/// Gaussian blur clipped to `rect`; neighbouring pixels feed the kernel
fn gaussian_region(pixmap: &mut Pixmap, source: Option<&Pixmap>, rect: Rect, sigma: f32) {
    if sigma <= 0.0 {
        return;
    }
    let bounds = Rect::new(0, 0, pixmap.width() as i32, pixmap.height() as i32);
    let margin = (sigma * 3.0).ceil() as i32;
    let Some(source_rect) = rect.inflate(margin).intersect(bounds) else {
        return;
    };
    let Some(src) = region_to_rgba(source.unwrap_or(&*pixmap), source_rect) else {
        return;
    };
    let blurred = imageops::blur(&src, sigma);
    let inner = imageops::crop_imm(
        &blurred,
        (rect.left - source_rect.left) as u32,
        (rect.top - source_rect.top) as u32,
        rect.width() as u32,
        rect.height() as u32,
    )
    .to_image();
    put_region(pixmap, &inner, rect.left, rect.top);
}

/// Hard pixelation: nearest-neighbour down to `cell`-sized blocks and back up
fn pixelate_region(pixmap: &mut Pixmap, source: Option<&Pixmap>, rect: Rect, cell: u32) {
    let Some(src) = region_to_rgba(source.unwrap_or(&*pixmap), rect) else {
        return;
    };
    let cell = cell.max(1);
    let (w, h) = src.dimensions();
    let sx = (w / cell).max(1);
    let sy = (h / cell).max(1);
    let small = imageops::resize(&src, sx, sy, FilterType::Nearest);
    let blocks = imageops::resize(&small, w, h, FilterType::Nearest);
    put_region(pixmap, &blocks, rect.left, rect.top);
}

fn draw_stroke(pixmap: &mut Pixmap, s: &StrokeShape, style: &ShapeStyle<'_>, with_head: bool) {
    let head = with_head.then(|| arrow::HEAD_BASE * style.scale + s.size);
    if let Some(path) = geometry::polyline_path(&s.points, style.scale, head) {
        let width = geometry::stroke_width(s.size, style.scale);
        stroke_path(pixmap, &path, s.color.to_rgba_u8(), width);
    }
}

fn draw_text_shape(pixmap: &mut Pixmap, t: &TextShape, style: &ShapeStyle<'_>) {
    if t.text.is_empty() {
        return;
    }
    let Some(font) = style.font else {
        log::trace!("Skipping text shape: no font loaded");
        return;
    };
    let size = geometry::text::font_size(t.size, style.scale);
    draw_text(
        pixmap,
        font,
        &t.text,
        t.x * style.scale,
        t.y * style.scale,
        size,
        t.color.to_rgba_u8(),
    );
}
