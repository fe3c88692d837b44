//! Screen capture module
//!
//! This module consolidates:
//! - The host collaborator that grabs viewport bitmaps and runs the picker
//! - Visible, region and full-page capture sequences
//! - The loaded image type (image.rs)

pub mod image;

use std::future::Future;
use std::time::Duration;

use ::image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use self::image::LoadedImage;
use crate::domain::CssRect;
use crate::error::{EditorError, Result};

/// A capturable page (browser tab and the window hosting it)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureTarget {
    pub tab_id: u64,
    pub window_id: u64,
}

/// Result of the drag-select picker
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickerSelection {
    pub rect: CssRect,
    pub device_pixel_ratio: f32,
}

/// Scroll geometry of the page, in the units the capture host scrolls by
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub total_width: u32,
    pub total_height: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub scroll_x: i32,
    pub scroll_y: i32,
}

/// Primitives supplied by the host environment
pub trait CaptureHost {
    /// The page captures are taken from, if there is an eligible one
    fn active_target(&self) -> impl Future<Output = Option<CaptureTarget>>;

    /// Encoded bitmap (PNG) of the currently visible viewport
    fn capture_visible(&self, target: &CaptureTarget) -> impl Future<Output = anyhow::Result<Vec<u8>>>;

    /// Interactive drag-select; `None` when the user cancelled
    fn run_picker(
        &self,
        target: &CaptureTarget,
    ) -> impl Future<Output = anyhow::Result<Option<PickerSelection>>>;

    fn scroll_to(&self, target: &CaptureTarget, x: i32, y: i32) -> impl Future<Output = anyhow::Result<()>>;

    fn page_metrics(&self, target: &CaptureTarget) -> impl Future<Output = anyhow::Result<PageMetrics>>;
}

fn host_err(err: anyhow::Error) -> EditorError {
    EditorError::Capture(format!("{err:#}"))
}

async fn require_target<H: CaptureHost>(host: &H) -> Result<CaptureTarget> {
    host.active_target().await.ok_or(EditorError::NoActiveTarget)
}

async fn grab<H: CaptureHost>(host: &H, target: &CaptureTarget) -> Result<RgbaImage> {
    let bytes = host.capture_visible(target).await.map_err(host_err)?;
    Ok(::image::load_from_memory(&bytes)?.to_rgba8())
}

/// Capture the visible viewport of the active page
pub async fn capture_visible<H: CaptureHost>(host: &H) -> Result<LoadedImage> {
    let target = require_target(host).await?;
    let bytes = host.capture_visible(&target).await.map_err(host_err)?;
    let image = LoadedImage::decode(bytes)?;
    log::info!("Captured viewport {}x{}", image.width(), image.height());
    Ok(image)
}

/// Let the user pick a region, then crop it out of a viewport capture.
///
/// Returns `Ok(None)` when the picker was cancelled.
pub async fn capture_region<H: CaptureHost>(host: &H) -> Result<Option<LoadedImage>> {
    let target = require_target(host).await?;
    let Some(selection) = host.run_picker(&target).await.map_err(host_err)? else {
        log::debug!("Region picker cancelled");
        return Ok(None);
    };
    let shot = grab(host, &target).await?;
    let crop = selection
        .rect
        .to_device_crop(selection.device_pixel_ratio, shot.width(), shot.height())
        .ok_or(EditorError::EmptyImage)?;
    let region = imageops::crop_imm(
        &shot,
        crop.left as u32,
        crop.top as u32,
        crop.width() as u32,
        crop.height() as u32,
    )
    .to_image();
    log::info!(
        "Captured region {}x{} at ({}, {})",
        region.width(),
        region.height(),
        crop.left,
        crop.top
    );
    Ok(Some(LoadedImage::from_rgba(region)?))
}

/// Stitch the whole scrollable page from viewport-sized tiles.
///
/// Tiles are taken strictly in order: scroll, wait `settle`, capture. The
/// original scroll position is restored afterwards, also on failure.
pub async fn capture_full_page<H: CaptureHost>(host: &H, settle: Duration) -> Result<LoadedImage> {
    let target = require_target(host).await?;
    let metrics = host.page_metrics(&target).await.map_err(host_err)?;
    if metrics.viewport_width == 0 || metrics.viewport_height == 0 {
        return Err(EditorError::Capture("page reports an empty viewport".into()));
    }

    let stitched = stitch_tiles(host, &target, &metrics, settle).await;
    if let Err(err) = host
        .scroll_to(&target, metrics.scroll_x, metrics.scroll_y)
        .await
    {
        log::warn!("Failed to restore scroll position: {:#}", err);
    }
    let page = stitched?;
    log::info!("Captured full page {}x{}", page.width(), page.height());
    LoadedImage::from_rgba(page)
}

async fn stitch_tiles<H: CaptureHost>(
    host: &H,
    target: &CaptureTarget,
    m: &PageMetrics,
    settle: Duration,
) -> Result<RgbaImage> {
    let cols = m.total_width.div_ceil(m.viewport_width);
    let rows = m.total_height.div_ceil(m.viewport_height);
    let mut page = RgbaImage::new(m.total_width.max(1), m.total_height.max(1));

    for row in 0..rows {
        for col in 0..cols {
            let x = col * m.viewport_width;
            let y = row * m.viewport_height;
            host.scroll_to(target, x as i32, y as i32)
                .await
                .map_err(host_err)?;
            tokio::time::sleep(settle).await;
            let tile = grab(host, target).await?;
            let w = tile.width().min(m.viewport_width);
            let h = tile.height().min(m.viewport_height);
            let visible = imageops::crop_imm(&tile, 0, 0, w, h).to_image();
            imageops::replace(&mut page, &visible, x as i64, y as i64);
            log::trace!("Tile ({}, {}) {}x{} at ({}, {})", col, row, w, h, x, y);
        }
    }
    Ok(page)
}
