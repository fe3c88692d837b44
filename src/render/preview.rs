//! Interactive preview at display resolution
//!
//! Re-rendered from scratch after every mutation: base image, optional
//! grid, committed shapes, then the in-progress shape on top.

use ab_glyph::FontArc;
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

use super::geometry::{self, effect};
use super::shapes::{BlurMode, ShapeStyle, draw_shape, stroke_hairlines};
use crate::session::state::EditorState;

/// Owns the interactive surface buffer and reuses it between frames
#[derive(Debug, Default)]
pub struct PreviewRenderer {
    surface: Option<Pixmap>,
}

impl PreviewRenderer {
    /// Last rendered frame, if an image was loaded at the time
    pub fn surface(&self) -> Option<&Pixmap> {
        self.surface.as_ref()
    }

    /// Forget the surface (no image loaded)
    pub fn wipe(&mut self) {
        self.surface = None;
    }

    /// Render `state` into the surface buffer
    pub fn render(&mut self, state: &EditorState, font: Option<&FontArc>) -> Option<&Pixmap> {
        let Some(image) = &state.image else {
            self.wipe();
            return None;
        };
        let (width, height) = state.viewport.surface_size();
        let reuse = self
            .surface
            .as_ref()
            .is_some_and(|s| s.width() == width && s.height() == height);
        if !reuse {
            self.surface = Pixmap::new(width, height);
        }
        let surface = self.surface.as_mut()?;
        surface.fill(Color::TRANSPARENT);

        let sx = width as f32 / image.width() as f32;
        let sy = height as f32 / image.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        let base: &Pixmap = &image.pixmap;
        surface.draw_pixmap(
            0,
            0,
            base.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );

        let scale = state.viewport.scale();
        if state.view.grid
            && let Some(path) = geometry::grid_path(width, height, scale)
        {
            stroke_hairlines(surface, &path, geometry::grid::COLOR);
        }

        let style = ShapeStyle {
            scale,
            blur: BlurMode::Approximate,
            pixel_size: state.view.pixel_size,
            effect_outline: effect::PREVIEW_OUTLINE,
            font,
            source: None,
            pixel_aligned: true,
        };
        for shape in &state.annotations.shapes {
            draw_shape(surface, shape, &style);
        }
        if let Some(shape) = &state.annotations.in_progress {
            draw_shape(surface, shape, &style);
        }
        log::trace!(
            "Preview rendered {}x{} with {} shapes",
            width,
            height,
            state.annotations.shapes.len()
        );
        Some(surface)
    }
}
