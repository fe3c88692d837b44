//! Async driver joining one editor surface to the shared store
//!
//! The loop owns the `Editor` and feeds it three event sources in a fixed
//! priority: completed writes, store notifications, host input. Every
//! message is fully applied (including its preview render) before the
//! next one is taken.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::Editor;
use super::messages::{Command, EditorMsg};
use crate::error::Result;
use crate::sync::SharedStore;

/// Host side of a running surface
#[derive(Clone, Debug)]
pub struct SurfaceHandle {
    tx: mpsc::UnboundedSender<EditorMsg>,
}

impl SurfaceHandle {
    /// Queue a message; returns false once the surface has stopped
    pub fn send(&self, msg: EditorMsg) -> bool {
        self.tx.send(msg).is_ok()
    }
}

pub struct Surface<S: SharedStore> {
    editor: Editor,
    store: S,
    inbox: mpsc::UnboundedReceiver<EditorMsg>,
    /// Commands the host has to answer (text prompts)
    requests: mpsc::UnboundedSender<Command>,
}

impl<S: SharedStore> Surface<S> {
    pub fn new(
        editor: Editor,
        store: S,
    ) -> (Self, SurfaceHandle, mpsc::UnboundedReceiver<Command>) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (requests, requests_rx) = mpsc::unbounded_channel();
        let surface = Self {
            editor,
            store,
            inbox,
            requests,
        };
        (surface, SurfaceHandle { tx }, requests_rx)
    }

    /// Run on the tokio runtime; the task yields the editor when every
    /// handle is dropped
    pub fn spawn(
        editor: Editor,
        store: S,
    ) -> (SurfaceHandle, mpsc::UnboundedReceiver<Command>, JoinHandle<Editor>) {
        let (surface, handle, requests) = Self::new(editor, store);
        (handle, requests, tokio::spawn(surface.run()))
    }

    pub async fn run(mut self) -> Editor {
        // Subscribe before reading so no write falls between the two
        let mut changes = self.store.subscribe();
        match self.store.read_current().await {
            Ok(current) => {
                if let Err(err) = self.editor.restore(current) {
                    log::warn!("Could not restore session: {}", err);
                }
            }
            Err(err) => log::warn!("Could not read shared session: {}", err),
        }

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Result<()>>();
        loop {
            let msg = tokio::select! {
                biased;
                Some(result) = done_rx.recv() => {
                    if let Err(err) = result {
                        log::warn!("Session write failed: {}", err);
                    }
                    EditorMsg::SaveFinished
                }
                change = changes.recv() => match change {
                    Ok(snapshot) => EditorMsg::Remote(snapshot),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Missed {} session notifications, resyncing", skipped);
                        match self.store.read_current().await {
                            Ok(Some(snapshot)) => EditorMsg::Remote(snapshot),
                            Ok(None) => continue,
                            Err(err) => {
                                log::warn!("Resync failed: {}", err);
                                continue;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        log::debug!("Shared store closed");
                        break;
                    }
                },
                input = self.inbox.recv() => match input {
                    Some(msg) => msg,
                    None => break,
                },
            };
            self.dispatch(msg, &done_tx);
        }

        // Let outstanding writes land before handing the editor back
        while self.editor.is_saving() {
            match done_rx.recv().await {
                Some(_) => {
                    self.editor.update(EditorMsg::SaveFinished);
                }
                None => break,
            }
        }
        self.editor
    }

    fn dispatch(&mut self, msg: EditorMsg, done_tx: &mpsc::UnboundedSender<Result<()>>) {
        for command in self.editor.update(msg) {
            match command {
                Command::Persist(snapshot) => {
                    let store = self.store.clone();
                    let done = done_tx.clone();
                    tokio::spawn(async move {
                        let _ = done.send(store.write(snapshot).await);
                    });
                }
                prompt @ Command::PromptText { .. } => {
                    if self.requests.send(prompt).is_err() {
                        log::warn!("Host dropped the request channel, cancelling text prompt");
                        self.editor.update(EditorMsg::TextEntered(None));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::image::LoadedImage;
    use crate::config::{EditorConfig, SurfaceKind, Tool};
    use crate::sync::MemoryStore;
    use image::{Rgba, RgbaImage};
    use std::time::Duration;

    fn editor(kind: SurfaceKind) -> Editor {
        Editor::new(EditorConfig::default(), kind, 820.0)
    }

    fn image() -> LoadedImage {
        LoadedImage::from_rgba(RgbaImage::from_pixel(800, 600, Rgba([9, 9, 9, 255]))).unwrap()
    }

    fn drag(handle: &SurfaceHandle, from: (f32, f32), to: (f32, f32)) {
        handle.send(EditorMsg::pointer_down(from.0, from.1));
        handle.send(EditorMsg::pointer_move(to.0, to.1));
        handle.send(EditorMsg::pointer_up(to.0, to.1));
    }

    /// Let spawned writes and notifications run
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_two_surfaces_converge() {
        let store = MemoryStore::new();
        let (a, _a_req, a_task) = Surface::spawn(editor(SurfaceKind::Panel), store.clone());
        let (b, _b_req, b_task) = Surface::spawn(editor(SurfaceKind::Popout), store.clone());

        a.send(EditorMsg::ImageLoaded(image()));
        settle().await;
        a.send(EditorMsg::SetTool(Tool::Ellipse));
        drag(&a, (10.0, 10.0), (90.0, 60.0));
        settle().await;
        drag(&b, (200.0, 200.0), (100.0, 100.0));
        settle().await;

        drop(a);
        drop(b);
        let a = a_task.await.unwrap();
        let b = b_task.await.unwrap();

        assert_eq!(a.shapes().len(), 2);
        assert_eq!(a.shapes(), b.shapes());
        assert_eq!(a.state().view, b.state().view);
        let current = store.read_current().await.unwrap().unwrap();
        assert_eq!(current.shapes, a.shapes());
    }

    #[tokio::test]
    async fn test_late_surface_restores_current_session() {
        let store = MemoryStore::new();
        let (a, _a_req, a_task) = Surface::spawn(editor(SurfaceKind::Panel), store.clone());
        a.send(EditorMsg::ImageLoaded(image()));
        settle().await;
        drag(&a, (1.0, 1.0), (50.0, 50.0));
        settle().await;

        let (b, _b_req, b_task) = Surface::spawn(editor(SurfaceKind::Popout), store.clone());
        settle().await;
        drop(a);
        drop(b);
        let a = a_task.await.unwrap();
        let b = b_task.await.unwrap();
        assert_eq!(b.shapes(), a.shapes());
        assert!(!b.state().annotations.history.can_undo());
    }

    #[tokio::test]
    async fn test_in_flight_write_drops_intermediate_state() {
        let store = MemoryStore::with_write_delay(Duration::from_millis(50));
        let (a, _req, task) = Surface::spawn(editor(SurfaceKind::Panel), store.clone());
        a.send(EditorMsg::ImageLoaded(image()));
        drag(&a, (1.0, 1.0), (5.0, 5.0));
        drag(&a, (2.0, 2.0), (6.0, 6.0));
        drop(a);
        let a = task.await.unwrap();

        assert_eq!(a.shapes().len(), 2);
        let current = store.read_current().await.unwrap().unwrap();
        // Only the image load was written; both draws hit the busy guard
        assert!(current.shapes.is_empty());
    }

    #[tokio::test]
    async fn test_reset_reaches_other_surface() {
        let store = MemoryStore::new();
        let (a, _a_req, a_task) = Surface::spawn(editor(SurfaceKind::Panel), store.clone());
        let (b, _b_req, b_task) = Surface::spawn(editor(SurfaceKind::Popout), store.clone());
        a.send(EditorMsg::ImageLoaded(image()));
        settle().await;
        drag(&a, (1.0, 1.0), (50.0, 50.0));
        settle().await;
        a.send(EditorMsg::SetTool(Tool::Pen));
        a.send(EditorMsg::ClearAll);
        settle().await;

        drop(a);
        drop(b);
        a_task.await.unwrap();
        let b = b_task.await.unwrap();
        assert!(!b.exports_enabled());
        assert!(b.shapes().is_empty());
        assert_eq!(b.state().view.tool, Tool::Pen);
    }

    #[tokio::test]
    async fn test_text_prompt_round_trip() {
        let store = MemoryStore::new();
        let (a, mut requests, task) = Surface::spawn(editor(SurfaceKind::Panel), store);
        a.send(EditorMsg::ImageLoaded(image()));
        a.send(EditorMsg::SetTool(Tool::Text));
        a.send(EditorMsg::pointer_down(30.0, 30.0));

        match requests.recv().await {
            Some(Command::PromptText { anchor, .. }) => {
                assert_eq!((anchor.x, anchor.y), (30.0, 30.0))
            }
            other => panic!("unexpected {other:?}"),
        }
        a.send(EditorMsg::TextEntered(Some("label".into())));
        drop(a);
        let a = task.await.unwrap();
        assert_eq!(a.shapes().len(), 1);
    }
}
