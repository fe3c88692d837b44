//! Screenshot annotation editor core
//!
//! Capture a page, draw shapes over it at any zoom, keep several editor
//! surfaces in sync through a shared store and export the flattened image
//! at full resolution.

pub mod annotations;
pub mod capture;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod render;
pub mod session;
pub mod sync;

pub use config::{EditorConfig, ShapeColor, SurfaceKind, Tool};
pub use error::{EditorError, Result};
pub use session::Editor;
pub use session::messages::{Command, EditorMsg, KeyPress};
