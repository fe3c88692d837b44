//! Shape rendering module
//!
//! This module contains:
//! - Geometry calculations shared between preview and export rendering
//! - Per-shape drawing with tiny-skia (`shapes`)
//! - The display-resolution preview (`preview`)
//! - The natural-resolution final compositor (`image`)

pub mod geometry;
pub mod image;
pub mod preview;
pub mod raster;
pub mod shapes;
pub mod text;
