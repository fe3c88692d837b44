use serde::{Deserialize, Serialize};

use crate::capture::image::LoadedImage;
use crate::config::{EditorConfig, ShapeColor, SurfaceKind, Tool};
use crate::domain::viewport::clamp_zoom;
use crate::domain::{Point, Shape, Viewport};
use crate::session::history::History;

/// Committed shapes, the in-progress shape and their history
#[derive(Clone, Debug, Default)]
pub struct AnnotationState {
    pub shapes: Vec<Shape>,
    /// Uncommitted shape being dragged; rendered but not part of `shapes`
    pub in_progress: Option<Shape>,
    pub history: History,
}

impl AnnotationState {
    pub fn is_drawing(&self) -> bool {
        self.in_progress.is_some()
    }

    /// Push the current list as the pre-image of a new edit
    pub fn begin_edit(&mut self) {
        self.history.begin_edit(&self.shapes);
    }

    pub fn commit(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn undo(&mut self) -> bool {
        self.in_progress = None;
        self.history.undo(&mut self.shapes)
    }

    pub fn redo(&mut self) -> bool {
        self.in_progress = None;
        self.history.redo(&mut self.shapes)
    }

    /// Remove every shape as a normal undoable edit.
    ///
    /// Returns false without touching history when there is nothing to clear.
    pub fn clear_annotations_only(&mut self) -> bool {
        self.in_progress = None;
        if self.shapes.is_empty() {
            return false;
        }
        self.begin_edit();
        self.shapes.clear();
        true
    }

    /// Drop shapes and both history stacks; not undoable
    pub fn hard_reset(&mut self) {
        self.shapes.clear();
        self.in_progress = None;
        self.history.clear();
    }
}

/// Rendering options; never affects stored geometry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub tool: Tool,
    pub color: ShapeColor,
    pub size: f32,
    #[serde(rename = "blur")]
    pub blur_radius: u32,
    #[serde(rename = "pixel")]
    pub pixel_size: u32,
    pub grid: bool,
    pub snap: bool,
    pub zoom: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default(), SurfaceKind::Panel)
    }
}

impl ViewState {
    pub fn from_config(config: &EditorConfig, kind: SurfaceKind) -> Self {
        Self {
            tool: config.tool,
            color: config.color,
            size: config.size,
            blur_radius: config.blur_radius,
            pixel_size: config.pixel_size,
            grid: config.grid,
            snap: config.snap,
            zoom: clamp_zoom(config.initial_zoom(kind)),
        }
    }

    /// Zoom in whole percent, as shown on the slider
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Round to the 10-unit grid when snapping is enabled
    pub fn snap(&self, v: f32) -> f32 {
        if self.snap {
            (v / 10.0).round() * 10.0
        } else {
            v
        }
    }

    pub fn snap_point(&self, p: Point) -> Point {
        Point::new(self.snap(p.x), self.snap(p.y))
    }
}

/// Text tool placement waiting for the host to supply the literal text
#[derive(Clone, Debug, PartialEq)]
pub struct PendingText {
    pub anchor: Point,
    pub color: ShapeColor,
    pub size: f32,
}

/// Complete editable state of one surface
#[derive(Clone, Debug, Default)]
pub struct EditorState {
    pub image: Option<LoadedImage>,
    pub annotations: AnnotationState,
    pub view: ViewState,
    pub viewport: Viewport,
    pub pending_text: Option<PendingText>,
}

impl EditorState {
    pub fn new(view: ViewState, container_width: f32) -> Self {
        let viewport = Viewport::new(container_width, 0, 0, view.zoom);
        Self {
            view,
            viewport,
            ..Default::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Apply a clamped zoom; returns true if the effective zoom changed
    pub fn set_zoom(&mut self, zoom: f32) -> bool {
        let zoom = clamp_zoom(zoom);
        let changed = zoom != self.view.zoom;
        self.view.zoom = self.viewport.set_zoom(zoom);
        changed
    }

    /// Nudge zoom by whole percentage points
    pub fn nudge_zoom(&mut self, percent: i32) -> bool {
        self.set_zoom((self.view.zoom * 100.0 + percent as f32) / 100.0)
    }

    /// Replace the base image.
    ///
    /// A fresh capture drops shapes and history; restoration keeps them.
    pub fn load_image(&mut self, image: LoadedImage, keep_shapes: bool) {
        self.viewport.set_natural_size(image.width(), image.height());
        self.image = Some(image);
        self.pending_text = None;
        if keep_shapes {
            self.annotations.in_progress = None;
        } else {
            self.annotations.hard_reset();
        }
    }

    /// Forget image, shapes and history
    pub fn clear_image(&mut self) {
        self.image = None;
        self.pending_text = None;
        self.annotations.hard_reset();
        self.viewport.set_natural_size(0, 0);
    }

    /// Apply an incoming view-state block, keeping the viewport in step
    pub fn apply_view(&mut self, view: &ViewState) {
        self.view = view.clone();
        self.view.zoom = self.viewport.set_zoom(view.zoom);
    }
}
