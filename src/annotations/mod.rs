//! Interactive drawing
//!
//! This module provides the pointer handlers that turn drags into shapes
//! for every drawing tool.

pub mod handlers;

pub use handlers::{DrawOutcome, PointerEvent, handle_pointer};
