//! Message types for an editor surface
//!
//! This module contains:
//! - `EditorMsg`, every input the editor reacts to
//! - `KeyPress`, a host-neutral keyboard event
//! - `Command`, effects the editor asks its host to perform

use serde::Deserialize;

use crate::capture::image::LoadedImage;
use crate::config::{ShapeColor, Tool};
use crate::domain::Point;
use crate::sync::SessionSnapshot;

/// Keyboard event as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyPress {
    /// Key value, e.g. `"z"`, `"+"`, `"Escape"`
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    /// Focus is inside an editable text control
    pub editing_text: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Ctrl on most platforms, Cmd on macOS
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Everything that can change an editor surface
///
/// Pointer positions are in pointer-event coordinates; the editor maps
/// them to image space itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorMsg {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Key(KeyPress),

    SetTool(Tool),
    SetColor(ShapeColor),
    SetSize(f32),
    SetBlurRadius(u32),
    SetPixelSize(u32),
    SetGrid(bool),
    SetSnap(bool),
    /// Zoom factor (1.0 = fit to container)
    SetZoom(f32),
    /// Zoom slider position in percent
    SetZoomPercent(u32),
    /// Nudge zoom by percentage points
    NudgeZoom(i32),
    /// Host client area width changed
    Resize(f32),
    /// Pointer-event position of the surface's top-left corner
    SetOrigin(Point),

    Undo,
    Redo,
    /// Remove shapes only; undoable
    ClearAnnotations,
    /// Remove image, shapes and history on every surface
    ClearAll,

    /// Host answer to `Command::PromptText`; `None` when cancelled
    TextEntered(Option<String>),

    /// A fresh capture or opened file
    #[serde(skip)]
    ImageLoaded(LoadedImage),
    /// Change notification from the shared store
    Remote(SessionSnapshot),
    /// A write issued through `Command::Persist` completed
    #[serde(skip)]
    SaveFinished,
}

impl EditorMsg {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown(Point::new(x, y))
    }
    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove(Point::new(x, y))
    }
    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp(Point::new(x, y))
    }
    pub fn key(key: KeyPress) -> Self {
        Self::Key(key)
    }
}

/// Effects requested by `Editor::update`
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Write this snapshot to the shared store, then send `SaveFinished`
    Persist(SessionSnapshot),
    /// Ask the user for literal text, then send `TextEntered`
    PromptText {
        anchor: Point,
        color: ShapeColor,
        size: f32,
    },
}
