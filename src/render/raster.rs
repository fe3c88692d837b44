//! Conversions between `image` buffers and tiny-skia pixmaps
//!
//! tiny-skia stores premultiplied RGBA; `RgbaImage` is straight alpha.

use image::RgbaImage;
use tiny_skia::{ColorU8, IntRect, IntSize, Pixmap};

use crate::domain::Rect;

/// Copy an RGBA image into a new premultiplied pixmap
pub fn pixmap_from_rgba(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut data = Vec::with_capacity(img.as_raw().len());
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        let c = ColorU8::from_rgba(r, g, b, a).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size)
}

/// Copy a pixmap back into a straight-alpha RGBA image
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}

/// Round a float box to whole pixels and clip it to a `width` x `height` surface
pub fn clip_box(x: f32, y: f32, w: f32, h: f32, width: u32, height: u32) -> Option<Rect> {
    let rect = Rect::new(
        x.round() as i32,
        y.round() as i32,
        (x + w).round() as i32,
        (y + h).round() as i32,
    );
    rect.intersect(Rect::new(0, 0, width as i32, height as i32))
}

pub fn int_rect(rect: Rect) -> Option<IntRect> {
    IntRect::from_xywh(
        rect.left,
        rect.top,
        rect.width().try_into().ok()?,
        rect.height().try_into().ok()?,
    )
}

/// Extract a region of a pixmap as a straight-alpha image
pub fn region_to_rgba(pixmap: &Pixmap, rect: Rect) -> Option<RgbaImage> {
    let region = pixmap.clone_rect(int_rect(rect)?)?;
    Some(rgba_from_pixmap(&region))
}

/// Write `img` into `pixmap` with its top-left at `(x, y)`, replacing pixels
pub fn put_region(pixmap: &mut Pixmap, img: &RgbaImage, x: i32, y: i32) {
    let (pw, ph) = (pixmap.width() as i32, pixmap.height() as i32);
    let stride = pixmap.width() as usize;
    let pixels = pixmap.pixels_mut();
    for (ix, iy, px) in img.enumerate_pixels() {
        let (tx, ty) = (x + ix as i32, y + iy as i32);
        if tx < 0 || ty < 0 || tx >= pw || ty >= ph {
            continue;
        }
        let [r, g, b, a] = px.0;
        pixels[ty as usize * stride + tx as usize] = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
}
