//! Coordinate/scale model between natural image pixels and display pixels
//!
//! The interactive surface buffer is sized to exactly
//! `round(natural * scale)`, so display size and buffer size match and a
//! pointer position maps to image space with a single division.

use super::geometry::Point;

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;
/// Narrowest container the surface fits into
pub const MIN_CONTAINER_WIDTH: f32 = 120.0;
/// Horizontal padding subtracted from the client width
pub const CONTAINER_PADDING: f32 = 20.0;

/// Clamp a zoom factor to the supported range
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    container_width: f32,
    natural_width: u32,
    natural_height: u32,
    zoom: f32,
    base_fit: f32,
    scale: f32,
    /// Top-left of the surface in pointer-event coordinates
    pub origin: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            container_width: MIN_CONTAINER_WIDTH,
            natural_width: 0,
            natural_height: 0,
            zoom: 1.0,
            base_fit: 1.0,
            scale: 1.0,
            origin: Point::default(),
        }
    }
}

impl Viewport {
    pub fn new(container_width: f32, natural_width: u32, natural_height: u32, zoom: f32) -> Self {
        let mut viewport = Self {
            container_width: container_width.max(1.0),
            natural_width,
            natural_height,
            zoom: clamp_zoom(zoom),
            ..Default::default()
        };
        viewport.recompute();
        viewport
    }

    /// Container width usable for a host client area of `client_width`
    pub fn fit_width(client_width: f32) -> f32 {
        (client_width - CONTAINER_PADDING).max(MIN_CONTAINER_WIDTH)
    }

    fn recompute(&mut self) {
        // Without an image the previous scale is kept
        if self.natural_width == 0 {
            return;
        }
        self.base_fit = self.container_width / self.natural_width as f32;
        self.scale = self.base_fit * self.zoom;
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = clamp_zoom(zoom);
        self.recompute();
        self.zoom
    }

    pub fn set_container_width(&mut self, width: f32) {
        self.container_width = width.max(1.0);
        self.recompute();
    }

    pub fn set_natural_size(&mut self, width: u32, height: u32) {
        self.natural_width = width;
        self.natural_height = height;
        self.recompute();
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn base_fit(&self) -> f32 {
        self.base_fit
    }

    /// Display pixels per natural-image pixel
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    /// Pixel buffer (and display) size of the interactive surface
    pub fn surface_size(&self) -> (u32, u32) {
        let w = (self.natural_width as f32 * self.scale).round().max(1.0);
        let h = (self.natural_height as f32 * self.scale).round().max(1.0);
        (w as u32, h as u32)
    }

    /// Convert a pointer-event position to natural-image coordinates
    pub fn to_natural(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.origin.x) / self.scale,
            (p.y - self.origin.y) / self.scale,
        )
    }

    /// Convert natural-image coordinates back to a pointer-event position
    pub fn to_display(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.origin.x,
            p.y * self.scale + self.origin.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_is_fit_times_zoom() {
        let vp = Viewport::new(400.0, 800, 600, 2.0);
        assert_eq!(vp.base_fit(), 0.5);
        assert_eq!(vp.scale(), 1.0);
        assert_eq!(vp.surface_size(), (800, 600));
    }

    #[test]
    fn test_surface_size_rounds_and_is_never_empty() {
        let vp = Viewport::new(333.0, 1000, 3, 0.25);
        let (w, h) = vp.surface_size();
        assert_eq!(w, (1000.0_f32 * vp.scale()).round() as u32);
        assert_eq!(h, 1);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut vp = Viewport::new(800.0, 800, 600, 1.0);
        assert_eq!(vp.set_zoom(5.0), MAX_ZOOM);
        assert_eq!(vp.set_zoom(0.1), MIN_ZOOM);
        assert_eq!(clamp_zoom(f32::NAN), 1.0);
    }

    #[test]
    fn test_round_trip_within_half_pixel() {
        let mut vp = Viewport::new(637.0, 1913, 1077, 1.0);
        vp.origin = Point::new(12.5, 40.0);
        for zoom in [0.25, 0.9, 1.0, 1.35, 4.0] {
            vp.set_zoom(zoom);
            for (x, y) in [(12.5, 40.0), (100.0, 200.0), (333.3, 71.9), (900.0, 2000.0)] {
                let p = Point::new(x, y);
                let back = vp.to_display(vp.to_natural(p));
                assert!((back.x - p.x).abs() <= 0.5, "x drift at zoom {zoom}");
                assert!((back.y - p.y).abs() <= 0.5, "y drift at zoom {zoom}");
            }
        }
    }

    #[test]
    fn test_fit_width() {
        assert_eq!(Viewport::fit_width(1000.0), 980.0);
        assert_eq!(Viewport::fit_width(50.0), MIN_CONTAINER_WIDTH);
    }

    #[test]
    fn test_container_resize_recomputes_scale() {
        let mut vp = Viewport::new(800.0, 800, 600, 1.0);
        vp.set_container_width(400.0);
        assert_eq!(vp.scale(), 0.5);
        assert_eq!(vp.surface_size(), (400, 300));
    }
}
