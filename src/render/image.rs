//! Final composite at natural image resolution using tiny-skia
//!
//! Used by export actions. Shapes are drawn with their natural-unit
//! geometry directly; blur regions get a real Gaussian filter. Blur and
//! pixelate regions sample the untouched base image, so annotations drawn
//! earlier underneath them do not show through.

use ab_glyph::FontArc;
use image::RgbaImage;

use super::geometry::effect;
use super::raster::rgba_from_pixmap;
use super::shapes::{BlurMode, ShapeStyle, draw_shape};
use crate::capture::image::LoadedImage;
use crate::domain::Shape;
use crate::error::{EditorError, Result};

/// Effect parameters taken from the view state at export time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    pub blur_radius: u32,
    pub pixel_size: u32,
}

/// Render all shapes over `image` at 1:1 and return the flattened raster.
///
/// Output dimensions always equal the natural image dimensions.
pub fn render_final(
    image: Option<&LoadedImage>,
    shapes: &[Shape],
    params: CompositeParams,
    font: Option<&FontArc>,
) -> Result<RgbaImage> {
    let image = image.ok_or(EditorError::NoImage)?;
    let mut pixmap = (*image.pixmap).clone();

    let style = ShapeStyle {
        scale: 1.0,
        blur: BlurMode::Gaussian(params.blur_radius as f32),
        pixel_size: params.pixel_size,
        effect_outline: effect::FINAL_OUTLINE,
        font,
        source: Some(image.pixmap.as_ref()),
        pixel_aligned: false,
    };
    for shape in shapes {
        draw_shape(&mut pixmap, shape, &style);
    }
    log::debug!(
        "Composited {} shapes at {}x{}",
        shapes.len(),
        pixmap.width(),
        pixmap.height()
    );
    Ok(rgba_from_pixmap(&pixmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShapeColor;
    use crate::domain::{Point, RegionShape, StrokeShape};
    use image::Rgba;

    const PARAMS: CompositeParams = CompositeParams {
        blur_radius: 4,
        pixel_size: 8,
    };

    fn base(w: u32, h: u32) -> LoadedImage {
        let img = RgbaImage::from_fn(w, h, |x, _| {
            if x % 2 == 0 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        });
        LoadedImage::from_rgba(img).unwrap()
    }

    fn region(x: f32, y: f32, w: f32, h: f32) -> RegionShape {
        RegionShape {
            x,
            y,
            w,
            h,
            color: ShapeColor::parse("#ff0000").unwrap(),
            size: 3.0,
        }
    }

    #[test]
    fn test_requires_image() {
        let err = render_final(None, &[], PARAMS, None).unwrap_err();
        assert!(matches!(err, EditorError::NoImage));
    }

    #[test]
    fn test_output_has_natural_dimensions() {
        let image = base(123, 45);
        let shapes = vec![Shape::Rect(region(10.0, 10.0, 50.0, 20.0))];
        let out = render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        assert_eq!(out.dimensions(), (123, 45));
    }

    #[test]
    fn test_geometry_is_not_scaled() {
        let image = base(100, 100);
        let shapes = vec![Shape::Line(StrokeShape {
            points: vec![Point::new(0.0, 50.5), Point::new(100.0, 50.5)],
            color: ShapeColor::parse("#ff0000").unwrap(),
            size: 3.0,
        })];
        let out = render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        assert_eq!(out.get_pixel(40, 50).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(40, 90).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_blur_region_is_filtered() {
        let image = base(60, 60);
        let shapes = vec![Shape::Blur(region(10.0, 10.0, 40.0, 40.0))];
        let out = render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        let v = out.get_pixel(30, 30)[1];
        assert!(v > 60 && v < 200, "expected grey, got {v}");
        // Outline in the accent color
        assert_eq!(out.get_pixel(10, 30).0, [102, 204, 255, 255]);
        // Untouched outside
        assert_eq!(out.get_pixel(2, 2).0, [0, 0, 0, 255]);
    }

    fn white(w: u32, h: u32) -> LoadedImage {
        LoadedImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))).unwrap()
    }

    #[test]
    fn test_effects_hide_earlier_annotations() {
        let image = white(80, 80);
        let mut outline = region(20.0, 20.0, 40.0, 40.0);
        outline.size = 12.0;
        let mut cover = region(10.0, 10.0, 60.0, 60.0);
        cover.size = 1.0;

        let shapes = vec![Shape::Rect(outline.clone()), Shape::Blur(cover.clone())];
        let out = render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        let [_, g, b, a] = out.get_pixel(21, 40).0;
        assert!(g > 250 && b > 250 && a > 250, "red leaked through blur: {g} {b}");

        let shapes = vec![Shape::Rect(outline), Shape::Pixel(cover)];
        let out = render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        assert_eq!(out.get_pixel(21, 40).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_sub_pixel_region_still_drawn() {
        let image = white(40, 40);
        let shapes = vec![Shape::Rect(region(10.0, 5.0, 0.4, 30.0))];
        let out = render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        assert_eq!(out.get_pixel(10, 20).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_base_image_is_not_mutated() {
        let image = base(20, 20);
        let before = image.rgba.clone();
        let shapes = vec![Shape::Pixel(region(0.0, 0.0, 20.0, 20.0))];
        render_final(Some(&image), &shapes, PARAMS, None).unwrap();
        assert_eq!(image.rgba, before);
    }
}
