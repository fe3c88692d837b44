//! Replicated session record shared between editor surfaces

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::image::LoadedImage;
use crate::domain::Shape;
use crate::session::state::ViewState;

/// Image payload of a snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapshotImage {
    /// Hard reset: receivers drop image, shapes and history
    Reset,
    /// PNG-encoded base image
    Png {
        bytes: Arc<[u8]>,
        width: u32,
        height: u32,
    },
}

impl SnapshotImage {
    pub fn from_image(image: &LoadedImage) -> Self {
        SnapshotImage::Png {
            bytes: image.encoded.clone(),
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Full copy of one surface's state at a point in time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Wall-clock milliseconds, strictly increasing per origin
    pub version: i64,
    /// Identity of the writing surface
    pub origin: Uuid,
    pub image: SnapshotImage,
    pub shapes: Vec<Shape>,
    pub ui: ViewState,
}

impl SessionSnapshot {
    pub fn is_reset(&self) -> bool {
        matches!(self.image, SnapshotImage::Reset)
    }

    /// Ordering key: later version wins, ties broken by origin
    pub fn stamp(&self) -> (i64, Uuid) {
        (self.version, self.origin)
    }
}
