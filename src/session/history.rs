//! Bounded undo/redo history of full shape-list snapshots

use std::collections::VecDeque;

use crate::domain::Shape;

/// Maximum number of snapshots kept on the undo stack
pub const MAX_UNDO: usize = 100;

#[derive(Clone, Debug, Default)]
pub struct History {
    undo: VecDeque<Vec<Shape>>,
    redo: Vec<Vec<Shape>>,
}

impl History {
    fn push_undo(&mut self, snapshot: Vec<Shape>) {
        self.undo.push_back(snapshot);
        while self.undo.len() > MAX_UNDO {
            self.undo.pop_front();
        }
    }

    /// Record the pre-image of an edit that is about to start.
    ///
    /// Any new edit invalidates the redo stack.
    pub fn begin_edit(&mut self, current: &[Shape]) {
        self.push_undo(current.to_vec());
        self.redo.clear();
    }

    /// Restore the list as it was before the most recent edit.
    ///
    /// Returns false (and leaves `current` alone) when there is nothing to undo.
    pub fn undo(&mut self, current: &mut Vec<Shape>) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, previous));
        true
    }

    pub fn redo(&mut self, current: &mut Vec<Shape>) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let replaced = std::mem::replace(current, next);
        self.push_undo(replaced);
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
