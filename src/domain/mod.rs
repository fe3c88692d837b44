//! Pure domain types with minimal dependencies
//!
//! Types here carry no rendering or transport concerns.

pub mod annotation;
pub mod geometry;
pub mod viewport;

pub use annotation::*;
pub use geometry::*;
pub use viewport::Viewport;
