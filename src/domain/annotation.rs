//! Annotation shapes drawn on top of a captured image
//!
//! All geometry is stored in natural-image pixel coordinates, never in
//! display or viewport units, so the same list renders identically in the
//! zoomed preview and in the full-resolution export.

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::config::{ShapeColor, Tool};

/// Box geometry shared by rect, ellipse, blur and pixelate shapes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionShape {
    pub x: f32,
    pub y: f32,
    /// May be negative while dragging; non-negative once committed
    pub w: f32,
    pub h: f32,
    pub color: ShapeColor,
    pub size: f32,
}

impl RegionShape {
    /// Flip a negative extent so that `(x, y)` becomes the top-left corner
    pub fn normalize(&mut self) {
        if self.w < 0.0 {
            self.x += self.w;
            self.w = -self.w;
        }
        if self.h < 0.0 {
            self.y += self.h;
            self.h = -self.h;
        }
    }
}

/// Polyline geometry shared by line, arrow and pen shapes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeShape {
    /// Line and arrow hold exactly start and end once dragged; pen holds one
    /// vertex per movement sample
    pub points: Vec<Point>,
    pub color: ShapeColor,
    pub size: f32,
}

/// Literal text anchored at its baseline origin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextShape {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub color: ShapeColor,
    pub size: f32,
}

/// Unified annotation type for ordered drawing and undo/redo
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rect(RegionShape),
    Ellipse(RegionShape),
    Blur(RegionShape),
    Pixel(RegionShape),
    Line(StrokeShape),
    Arrow(StrokeShape),
    Pen(StrokeShape),
    Text(TextShape),
}

impl Shape {
    /// Start a new in-progress shape for `tool` at `at`.
    ///
    /// Returns `None` for the text tool, which never enters a drag.
    pub fn begin(tool: Tool, at: Point, color: ShapeColor, size: f32) -> Option<Self> {
        let region = || RegionShape {
            x: at.x,
            y: at.y,
            w: 0.0,
            h: 0.0,
            color,
            size,
        };
        let stroke = || StrokeShape {
            points: vec![at],
            color,
            size,
        };
        Some(match tool {
            Tool::Rect => Shape::Rect(region()),
            Tool::Ellipse => Shape::Ellipse(region()),
            Tool::Blur => Shape::Blur(region()),
            Tool::Pixel => Shape::Pixel(region()),
            Tool::Line => Shape::Line(stroke()),
            Tool::Arrow => Shape::Arrow(stroke()),
            Tool::Pen => Shape::Pen(stroke()),
            Tool::Text => return None,
        })
    }

    pub fn tool(&self) -> Tool {
        match self {
            Shape::Rect(_) => Tool::Rect,
            Shape::Ellipse(_) => Tool::Ellipse,
            Shape::Blur(_) => Tool::Blur,
            Shape::Pixel(_) => Tool::Pixel,
            Shape::Line(_) => Tool::Line,
            Shape::Arrow(_) => Tool::Arrow,
            Shape::Pen(_) => Tool::Pen,
            Shape::Text(_) => Tool::Text,
        }
    }

    pub fn region(&self) -> Option<&RegionShape> {
        match self {
            Shape::Rect(r) | Shape::Ellipse(r) | Shape::Blur(r) | Shape::Pixel(r) => Some(r),
            _ => None,
        }
    }

    pub fn region_mut(&mut self) -> Option<&mut RegionShape> {
        match self {
            Shape::Rect(r) | Shape::Ellipse(r) | Shape::Blur(r) | Shape::Pixel(r) => Some(r),
            _ => None,
        }
    }

    pub fn stroke(&self) -> Option<&StrokeShape> {
        match self {
            Shape::Line(s) | Shape::Arrow(s) | Shape::Pen(s) => Some(s),
            _ => None,
        }
    }

    pub fn color(&self) -> ShapeColor {
        match self {
            Shape::Rect(r) | Shape::Ellipse(r) | Shape::Blur(r) | Shape::Pixel(r) => r.color,
            Shape::Line(s) | Shape::Arrow(s) | Shape::Pen(s) => s.color,
            Shape::Text(t) => t.color,
        }
    }

    pub fn size(&self) -> f32 {
        match self {
            Shape::Rect(r) | Shape::Ellipse(r) | Shape::Blur(r) | Shape::Pixel(r) => r.size,
            Shape::Line(s) | Shape::Arrow(s) | Shape::Pen(s) => s.size,
            Shape::Text(t) => t.size,
        }
    }

    /// Check if this shape is a region effect (blur, pixelate)
    pub fn is_effect(&self) -> bool {
        matches!(self, Shape::Blur(_) | Shape::Pixel(_))
    }
}
