//! Geometric types for capture regions and coordinates

use serde::{Deserialize, Serialize};

/// A point; the coordinate space depends on context (natural image or display)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, scale: f32) -> Self {
        Self::new(self.x * scale, self.y * scale)
    }
}

/// Integer pixel rectangle, used for crop and tile math
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self::new(x, y, x.saturating_add(w), y.saturating_add(h))
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Grow the rectangle by `by` pixels on every side
    pub fn inflate(&self, by: i32) -> Rect {
        Rect {
            left: self.left - by,
            top: self.top - by,
            right: self.right + by,
            bottom: self.bottom + by,
        }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Rectangle in CSS pixels as reported by the region picker
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CssRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl CssRect {
    /// Map to device pixels and clamp to a `bounds_w` x `bounds_h` bitmap.
    ///
    /// The result is always at least 1x1 and lies inside the bitmap.
    pub fn to_device_crop(self, dpr: f32, bounds_w: u32, bounds_h: u32) -> Option<Rect> {
        if bounds_w == 0 || bounds_h == 0 {
            return None;
        }
        let (bw, bh) = (bounds_w as i32, bounds_h as i32);
        let x = ((self.x * dpr).round() as i32).clamp(0, bw - 1);
        let y = ((self.y * dpr).round() as i32).clamp(0, bh - 1);
        let w = ((self.w * dpr).round() as i32).clamp(1, bw - x);
        let h = ((self.h * dpr).round() as i32).clamp(1, bh - y);
        Some(Rect::from_xywh(x, y, w, h))
    }
}
