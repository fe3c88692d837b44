//! Per-surface side of the replication protocol
//!
//! Tracks the surface identity, issues strictly increasing versions, drops
//! saves requested while a write is in flight and filters incoming
//! snapshots down to those that should be reconciled.

use uuid::Uuid;

use super::snapshot::{SessionSnapshot, SnapshotImage};
use crate::domain::Shape;
use crate::session::state::{EditorState, ViewState};

#[derive(Debug)]
pub struct Replicator {
    origin: Uuid,
    last_version: i64,
    /// Newest `(version, origin)` this surface has written or applied
    latest: Option<(i64, Uuid)>,
    in_flight: usize,
}

impl Default for Replicator {
    fn default() -> Self {
        Self::with_origin(Uuid::new_v4())
    }
}

impl Replicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(origin: Uuid) -> Self {
        Self {
            origin,
            last_version: 0,
            latest: None,
            in_flight: 0,
        }
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// True while a write issued by this surface has not completed
    pub fn is_saving(&self) -> bool {
        self.in_flight > 0
    }

    fn next_version(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_version = now.max(self.last_version + 1);
        self.last_version
    }

    fn stamp(&mut self, image: SnapshotImage, shapes: Vec<Shape>, ui: ViewState) -> SessionSnapshot {
        let snapshot = SessionSnapshot {
            version: self.next_version(),
            origin: self.origin,
            image,
            shapes,
            ui,
        };
        self.latest = Some(snapshot.stamp());
        self.in_flight += 1;
        snapshot
    }

    /// Build a snapshot of `state` for writing.
    ///
    /// Returns `None` when no image is loaded or a write is already in
    /// flight; the request is dropped, not queued.
    pub fn prepare(&mut self, state: &EditorState) -> Option<SessionSnapshot> {
        let image = state.image.as_ref()?;
        if self.is_saving() {
            log::debug!("Save already in flight, dropping request");
            return None;
        }
        let snapshot = self.stamp(
            SnapshotImage::from_image(image),
            state.annotations.shapes.clone(),
            state.view.clone(),
        );
        log::trace!("Prepared snapshot v{}", snapshot.version);
        Some(snapshot)
    }

    /// Build a hard-reset snapshot; never dropped by the in-flight guard
    pub fn prepare_reset(&mut self, ui: &ViewState) -> SessionSnapshot {
        let snapshot = self.stamp(SnapshotImage::Reset, Vec::new(), ui.clone());
        log::debug!("Prepared reset snapshot v{}", snapshot.version);
        snapshot
    }

    /// A write issued by this surface completed (successfully or not)
    pub fn finish_save(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Decide whether an incoming snapshot should be reconciled.
    ///
    /// Own writes and anything not newer than the latest known state are
    /// ignored. Accepting advances the local clock past the snapshot so
    /// later local edits win.
    pub fn accept(&mut self, snapshot: &SessionSnapshot) -> bool {
        if snapshot.origin == self.origin {
            return false;
        }
        if let Some(latest) = self.latest
            && snapshot.stamp() <= latest
        {
            log::debug!(
                "Ignoring stale snapshot v{} from {}",
                snapshot.version,
                snapshot.origin
            );
            return false;
        }
        self.latest = Some(snapshot.stamp());
        self.last_version = self.last_version.max(snapshot.version);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::image::LoadedImage;
    use image::{Rgba, RgbaImage};

    fn loaded_state() -> EditorState {
        let mut state = EditorState::new(ViewState::default(), 400.0);
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        state.load_image(LoadedImage::from_rgba(img).unwrap(), false);
        state
    }

    #[test]
    fn test_no_save_without_image() {
        let mut rep = Replicator::new();
        assert!(rep.prepare(&EditorState::default()).is_none());
        assert!(!rep.is_saving());
    }

    #[test]
    fn test_in_flight_save_drops_second_request() {
        let mut rep = Replicator::new();
        let state = loaded_state();
        assert!(rep.prepare(&state).is_some());
        assert!(rep.prepare(&state).is_none());
        rep.finish_save();
        assert!(rep.prepare(&state).is_some());
    }

    #[test]
    fn test_reset_bypasses_guard() {
        let mut rep = Replicator::new();
        let state = loaded_state();
        rep.prepare(&state).unwrap();
        let reset = rep.prepare_reset(&state.view);
        assert!(reset.is_reset());
        rep.finish_save();
        assert!(rep.is_saving());
        rep.finish_save();
        assert!(!rep.is_saving());
    }

    #[test]
    fn test_versions_strictly_increase() {
        let mut rep = Replicator::new();
        let state = loaded_state();
        let mut last = 0;
        for _ in 0..50 {
            let snapshot = rep.prepare(&state).unwrap();
            rep.finish_save();
            assert!(snapshot.version > last);
            last = snapshot.version;
        }
    }

    #[test]
    fn test_accept_filters_own_and_stale() {
        let state = loaded_state();
        let mut a = Replicator::new();
        let mut b = Replicator::new();

        let first = a.prepare(&state).unwrap();
        a.finish_save();
        assert!(!a.accept(&first));
        assert!(b.accept(&first));
        // Duplicate delivery
        assert!(!b.accept(&first));

        let mut older = first.clone();
        older.version -= 1;
        older.origin = Uuid::new_v4();
        assert!(!b.accept(&older));
    }

    #[test]
    fn test_accept_advances_local_clock() {
        let state = loaded_state();
        let mut a = Replicator::new();
        let mut b = Replicator::new();

        let mut future = a.prepare(&state).unwrap();
        future.version += 60_000;
        assert!(b.accept(&future));

        let reply = b.prepare(&state).unwrap();
        assert!(reply.version > future.version);
        assert!(a.accept(&reply));
    }
}
