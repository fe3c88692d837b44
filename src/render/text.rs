//! Text shape rasterization with ab_glyph

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use tiny_skia::{ColorU8, Pixmap, PremultipliedColorU8};

/// Fonts probed when no font path is configured
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn load_font_file(path: &Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("Invalid font {}: {}", path.display(), err);
            None
        }
    }
}

/// Load the configured font, or the first system font that exists.
///
/// Text shapes are skipped at render time when this returns `None`.
pub fn load_font(configured: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = configured {
        if let Some(font) = load_font_file(path) {
            return Some(font);
        }
        log::warn!("Configured font {} unavailable", path.display());
    }
    let font = SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find_map(|path| load_font_file(&path));
    if font.is_none() {
        log::warn!("No usable font found; text shapes will not be rendered");
    }
    font
}

/// Draw a single line of `text` with its baseline starting at `(x, y)`
pub fn draw_text(
    pixmap: &mut Pixmap,
    font: &FontArc,
    text: &str,
    x: f32,
    y: f32,
    font_size: f32,
    color: [u8; 4],
) {
    let scaled = font.as_scaled(font_size);
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
    let stride = pixmap.width() as usize;
    let pixels = pixmap.pixels_mut();

    let mut cursor_x = x;
    let mut last_glyph: Option<GlyphId> = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(font_size, point(cursor_x, y));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let idx = py as usize * stride + px as usize;
            pixels[idx] = blend(pixels[idx], color, coverage);
        });
    }
}

/// Source-over blend of a straight-alpha color at `coverage` onto a premultiplied pixel
fn blend(dst: PremultipliedColorU8, color: [u8; 4], coverage: f32) -> PremultipliedColorU8 {
    let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32 / 255.0).clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return dst;
    }
    let inv = 1.0 - alpha;
    let channel = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * inv).round() as u8;
    let a = (255.0 * alpha + dst.alpha() as f32 * inv).round() as u8;
    let r = channel(color[0], dst.red()).min(a);
    let g = channel(color[1], dst.green()).min(a);
    let b = channel(color[2], dst.blue()).min(a);
    PremultipliedColorU8::from_rgba(r, g, b, a)
        .unwrap_or_else(|| ColorU8::from_rgba(color[0], color[1], color[2], a).premultiply())
}
