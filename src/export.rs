//! Encoding and delivery of the composited image

use std::io;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Default JPEG quality (0.92 in browser terms)
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn jpeg() -> Self {
        ExportFormat::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }
}

/// Encoded export ready to hand to a delivery action
#[derive(Clone, Debug, PartialEq)]
pub struct ExportPayload {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ExportPayload {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}

/// Where an export goes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportAction {
    /// Write a file into the export directory
    Download,
    CopyToClipboard,
    /// Open the payload in a new view and invoke print
    Print,
    OpenInNewView,
}

/// Delivery targets provided by the host surface
pub trait ExportHost {
    fn copy_to_clipboard(&mut self, payload: &ExportPayload) -> anyhow::Result<()>;
    fn print(&mut self, payload: &ExportPayload) -> anyhow::Result<()>;
    fn open_in_new_view(&mut self, payload: &ExportPayload) -> anyhow::Result<()>;
}

pub fn write_png<W: io::Write>(w: W, image: &RgbaImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Encode a composited raster
pub fn encode(image: &RgbaImage, format: ExportFormat) -> Result<ExportPayload> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => write_png(&mut bytes, image)?,
        ExportFormat::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder)
                .map_err(|e| EditorError::Encode(e.to_string()))?;
        }
    }
    Ok(ExportPayload {
        format,
        width: image.width(),
        height: image.height(),
        bytes,
    })
}

/// File name for a download, stamped with local time
pub fn download_name(format: ExportFormat) -> String {
    chrono::Local::now()
        .format(&format!("redacted-%Y-%m-%d_%H-%M-%S.{}", format.extension()))
        .to_string()
}

/// Write the payload into `dir`, creating it if necessary
pub fn download(payload: &ExportPayload, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut path = dir.join(download_name(payload.format));
    // Avoid clobbering an export from the same second
    let mut n = 1;
    while path.exists() {
        let stem = download_name(payload.format);
        let stem = stem.trim_end_matches(&format!(".{}", payload.format.extension()));
        path = dir.join(format!("{stem}-{n}.{}", payload.format.extension()));
        n += 1;
    }
    std::fs::write(&path, &payload.bytes)?;
    log::info!("Saved export to {}", path.display());
    Ok(path)
}

/// Deliver a payload through `action`
pub fn deliver(
    payload: &ExportPayload,
    action: &ExportAction,
    dir: Option<&Path>,
    host: &mut dyn ExportHost,
) -> anyhow::Result<Option<PathBuf>> {
    match action {
        ExportAction::Download => {
            let dir = dir.ok_or_else(|| anyhow::anyhow!("no export directory available"))?;
            Ok(Some(download(payload, dir)?))
        }
        ExportAction::CopyToClipboard => host.copy_to_clipboard(payload).map(|_| None),
        ExportAction::Print => host.print(payload).map(|_| None),
        ExportAction::OpenInNewView => host.open_in_new_view(payload).map(|_| None),
    }
}
