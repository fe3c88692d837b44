//! Pointer handlers for the drawing tools
//!
//! A two-state machine (idle, drawing) keyed on the in-progress slot of
//! the annotation state. Every pointer position is mapped to natural-image
//! space and snapped before it is used.

use crate::domain::{Point, Shape};
use crate::session::state::{EditorState, PendingText};

/// Pointer input in pointer-event coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

/// What a pointer event did to the state
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// Nothing changed
    Ignored,
    /// The in-progress shape changed; redraw only
    Updated,
    /// A shape was committed to the list
    Committed,
    /// Text tool placed; waiting for the literal text
    PromptText(PendingText),
}

pub fn handle_pointer(state: &mut EditorState, event: PointerEvent) -> DrawOutcome {
    match event {
        PointerEvent::Down(p) => pointer_down(state, p),
        PointerEvent::Move(p) => pointer_move(state, p),
        PointerEvent::Up(p) => pointer_up(state, p),
    }
}

fn natural(state: &EditorState, p: Point) -> Point {
    state.viewport.to_natural(p)
}

fn pointer_down(state: &mut EditorState, p: Point) -> DrawOutcome {
    if !state.has_image() {
        return DrawOutcome::Ignored;
    }
    let at = state.view.snap_point(natural(state, p));
    state.annotations.begin_edit();

    let view = &state.view;
    match Shape::begin(view.tool, at, view.color, view.size) {
        Some(shape) => {
            log::trace!("Begin {:?} at ({}, {})", view.tool, at.x, at.y);
            state.annotations.in_progress = Some(shape);
            DrawOutcome::Updated
        }
        None => {
            let pending = PendingText {
                anchor: at,
                color: view.color,
                size: view.size,
            };
            state.pending_text = Some(pending.clone());
            DrawOutcome::PromptText(pending)
        }
    }
}

fn pointer_move(state: &mut EditorState, p: Point) -> DrawOutcome {
    let p = natural(state, p);
    let view = &state.view;
    let Some(shape) = state.annotations.in_progress.as_mut() else {
        return DrawOutcome::Ignored;
    };
    match shape {
        Shape::Rect(r) | Shape::Ellipse(r) | Shape::Blur(r) | Shape::Pixel(r) => {
            r.w = view.snap(p.x - r.x);
            r.h = view.snap(p.y - r.y);
        }
        Shape::Line(s) | Shape::Arrow(s) => {
            s.points.truncate(1);
            s.points.push(view.snap_point(p));
        }
        Shape::Pen(s) => s.points.push(view.snap_point(p)),
        Shape::Text(_) => return DrawOutcome::Ignored,
    }
    DrawOutcome::Updated
}

fn pointer_up(state: &mut EditorState, _p: Point) -> DrawOutcome {
    let Some(mut shape) = state.annotations.in_progress.take() else {
        return DrawOutcome::Ignored;
    };
    if let Some(region) = shape.region_mut() {
        region.normalize();
    }
    if let Shape::Line(s) | Shape::Arrow(s) = &mut shape
        && s.points.len() == 1
    {
        // A click without movement ends where it started
        let start = s.points[0];
        s.points.push(start);
    }
    log::debug!("Committed {:?}", shape.tool());
    state.annotations.commit(shape);
    DrawOutcome::Committed
}
