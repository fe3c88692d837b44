//! Loaded base image: decoded raster plus its transferable encoded form

use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::error::{EditorError, Result};
use crate::export::write_png;
use crate::render::raster::pixmap_from_rgba;

/// A base image with its raw RGBA data, a premultiplied pixmap for drawing
/// and the encoded bytes replicated to other surfaces
#[derive(Clone)]
pub struct LoadedImage {
    pub rgba: Arc<RgbaImage>,
    pub pixmap: Arc<Pixmap>,
    pub encoded: Arc<[u8]>,
}

impl LoadedImage {
    /// Decode an encoded image payload (PNG, JPEG, ...)
    pub fn decode(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let encoded = bytes.into();
        let rgba = image::load_from_memory(&encoded)?.to_rgba8();
        Self::with_encoded(rgba, encoded)
    }

    /// Wrap a freshly captured raster, encoding it as PNG for replication
    pub fn from_rgba(rgba: RgbaImage) -> Result<Self> {
        let mut buffer = Vec::new();
        write_png(&mut buffer, &rgba)?;
        Self::with_encoded(rgba, buffer.into())
    }

    fn with_encoded(rgba: RgbaImage, encoded: Arc<[u8]>) -> Result<Self> {
        let pixmap = pixmap_from_rgba(&rgba).ok_or(EditorError::EmptyImage)?;
        log::debug!(
            "LoadedImage ready: {}x{} pixels, {} encoded bytes",
            rgba.width(),
            rgba.height(),
            encoded.len()
        );
        Ok(Self {
            rgba: Arc::new(rgba),
            pixmap: Arc::new(pixmap),
            encoded,
        })
    }

    /// Get the width of the image
    pub fn width(&self) -> u32 {
        self.rgba.width()
    }

    /// Get the height of the image
    pub fn height(&self) -> u32 {
        self.rgba.height()
    }
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}
