//! Editor session management module
//!
//! This module contains:
//! - Session state (shapes, history, view options)
//! - Message and command types
//! - Keyboard shortcuts
//! - `Editor`, the single mutation entry point of a surface
//! - The async runtime joining a surface to the shared store

pub mod history;
pub mod messages;
pub mod runtime;
pub mod shortcuts;
pub mod state;

use std::path::PathBuf;

use ab_glyph::FontArc;
use image::RgbaImage;
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::annotations::{DrawOutcome, PointerEvent, handle_pointer};
use crate::capture::image::LoadedImage;
use crate::config::{EditorConfig, SurfaceKind};
use crate::domain::{Shape, TextShape, Viewport};
use crate::error::{EditorError, Result};
use crate::export::{self, ExportAction, ExportFormat, ExportHost};
use crate::render::image::{CompositeParams, render_final};
use crate::render::preview::PreviewRenderer;
use crate::sync::{Replicator, SessionSnapshot, SnapshotImage};

use self::messages::{Command, EditorMsg};
use self::state::{EditorState, ViewState};

/// Zoom slider granularity in percent
pub const ZOOM_SLIDER_STEP: u32 = 5;

/// One editor surface (docked panel or pop-out)
pub struct Editor {
    state: EditorState,
    replicator: Replicator,
    preview: PreviewRenderer,
    font: Option<FontArc>,
    config: EditorConfig,
}

impl Editor {
    pub fn new(config: EditorConfig, kind: SurfaceKind, client_width: f32) -> Self {
        let view = ViewState::from_config(&config, kind);
        Self {
            state: EditorState::new(view, Viewport::fit_width(client_width)),
            replicator: Replicator::new(),
            preview: PreviewRenderer::default(),
            font: None,
            config,
        }
    }

    /// Use `font` for text shapes
    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        self.font = font;
        self
    }

    pub fn origin(&self) -> Uuid {
        self.replicator.origin()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.state.annotations.shapes
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_saving(&self) -> bool {
        self.replicator.is_saving()
    }

    /// Last rendered preview frame
    pub fn surface(&self) -> Option<&Pixmap> {
        self.preview.surface()
    }

    /// Export actions are available exactly while an image is loaded
    pub fn exports_enabled(&self) -> bool {
        self.state.has_image()
    }

    /// Apply one input and return the effects the host should perform
    pub fn update(&mut self, msg: EditorMsg) -> Vec<Command> {
        let mut commands = Vec::new();
        match msg {
            EditorMsg::PointerDown(p) => self.pointer(PointerEvent::Down(p), &mut commands),
            EditorMsg::PointerMove(p) => self.pointer(PointerEvent::Move(p), &mut commands),
            EditorMsg::PointerUp(p) => self.pointer(PointerEvent::Up(p), &mut commands),
            EditorMsg::Key(key) => {
                if let Some(msg) = shortcuts::handle_key_event(&key) {
                    return self.update(msg);
                }
            }

            EditorMsg::SetTool(tool) => self.state.view.tool = tool,
            EditorMsg::SetColor(color) => self.state.view.color = color,
            EditorMsg::SetSize(size) => self.state.view.size = size.max(1.0),
            EditorMsg::SetBlurRadius(radius) => self.state.view.blur_radius = radius,
            EditorMsg::SetPixelSize(cell) => {
                self.state.view.pixel_size = cell.max(1);
                self.redraw();
            }
            EditorMsg::SetGrid(on) => {
                self.state.view.grid = on;
                self.redraw();
            }
            EditorMsg::SetSnap(on) => self.state.view.snap = on,
            EditorMsg::SetZoom(zoom) => self.zoom_to(zoom, &mut commands),
            EditorMsg::SetZoomPercent(percent) => {
                let stepped = (percent as f32 / ZOOM_SLIDER_STEP as f32).round() * ZOOM_SLIDER_STEP as f32;
                self.zoom_to(stepped / 100.0, &mut commands);
            }
            EditorMsg::NudgeZoom(points) => {
                if self.state.nudge_zoom(points) {
                    self.redraw();
                    self.save(&mut commands);
                }
            }
            EditorMsg::Resize(client_width) => {
                self.state
                    .viewport
                    .set_container_width(Viewport::fit_width(client_width));
                self.redraw();
            }
            EditorMsg::SetOrigin(origin) => self.state.viewport.origin = origin,

            EditorMsg::Undo => {
                if self.state.annotations.undo() {
                    self.redraw();
                    self.save(&mut commands);
                }
            }
            EditorMsg::Redo => {
                if self.state.annotations.redo() {
                    self.redraw();
                    self.save(&mut commands);
                }
            }
            EditorMsg::ClearAnnotations => {
                if self.state.annotations.clear_annotations_only() {
                    self.redraw();
                    self.save(&mut commands);
                }
            }
            EditorMsg::ClearAll => {
                self.state.clear_image();
                self.preview.wipe();
                log::info!("Cleared image and annotations");
                let reset = self.replicator.prepare_reset(&self.state.view);
                commands.push(Command::Persist(reset));
            }

            EditorMsg::TextEntered(text) => self.text_entered(text, &mut commands),

            EditorMsg::ImageLoaded(image) => {
                log::info!("Loaded image {}x{}", image.width(), image.height());
                self.state.load_image(image, false);
                self.redraw();
                self.save(&mut commands);
            }
            EditorMsg::Remote(snapshot) => {
                if self.replicator.accept(&snapshot) {
                    self.reconcile(snapshot);
                }
            }
            EditorMsg::SaveFinished => self.replicator.finish_save(),
        }
        commands
    }

    fn pointer(&mut self, event: PointerEvent, commands: &mut Vec<Command>) {
        match handle_pointer(&mut self.state, event) {
            DrawOutcome::Ignored => {}
            DrawOutcome::Updated => self.redraw(),
            DrawOutcome::Committed => {
                self.redraw();
                self.save(commands);
            }
            DrawOutcome::PromptText(pending) => commands.push(Command::PromptText {
                anchor: pending.anchor,
                color: pending.color,
                size: pending.size,
            }),
        }
    }

    fn text_entered(&mut self, text: Option<String>, commands: &mut Vec<Command>) {
        let Some(pending) = self.state.pending_text.take() else {
            log::debug!("Text entered with no pending placement");
            return;
        };
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return;
        };
        self.state.annotations.commit(Shape::Text(TextShape {
            x: pending.anchor.x,
            y: pending.anchor.y,
            text,
            color: pending.color,
            size: pending.size,
        }));
        self.redraw();
        self.save(commands);
    }

    fn zoom_to(&mut self, zoom: f32, commands: &mut Vec<Command>) {
        if self.state.set_zoom(zoom) {
            self.redraw();
            self.save(commands);
        }
    }

    fn redraw(&mut self) {
        self.preview.render(&self.state, self.font.as_ref());
    }

    fn save(&mut self, commands: &mut Vec<Command>) {
        if let Some(snapshot) = self.replicator.prepare(&self.state) {
            commands.push(Command::Persist(snapshot));
        }
    }

    /// Decode a snapshot image, reusing the loaded one when the bytes match
    fn snapshot_image(&self, image: &SnapshotImage) -> Result<Option<LoadedImage>> {
        let SnapshotImage::Png { bytes, .. } = image else {
            return Ok(None);
        };
        if let Some(current) = &self.state.image
            && current.encoded[..] == bytes[..]
        {
            return Ok(Some(current.clone()));
        }
        LoadedImage::decode(bytes.clone()).map(Some)
    }

    /// Adopt a snapshot written by another surface
    fn reconcile(&mut self, snapshot: SessionSnapshot) {
        log::debug!(
            "Reconciling snapshot v{} from {}",
            snapshot.version,
            snapshot.origin
        );
        let image = match self.snapshot_image(&snapshot.image) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("Dropping remote snapshot: {}", err);
                return;
            }
        };
        match image {
            None => {
                self.state.clear_image();
                self.preview.wipe();
                // A reset only carries tool, color and zoom across
                self.state.view.tool = snapshot.ui.tool;
                self.state.view.color = snapshot.ui.color;
                self.state.set_zoom(snapshot.ui.zoom);
            }
            Some(image) => {
                self.state.load_image(image, true);
                self.state.annotations.shapes = snapshot.shapes;
                self.state.apply_view(&snapshot.ui);
                self.redraw();
            }
        }
    }

    /// Restore the store's current snapshot on startup.
    ///
    /// Applies image, shapes and zoom only. Nothing is written back and no
    /// history entry is pushed. Returns whether an image was restored.
    pub fn restore(&mut self, snapshot: Option<SessionSnapshot>) -> Result<bool> {
        let Some(snapshot) = snapshot else {
            return Ok(false);
        };
        if !self.replicator.accept(&snapshot) {
            return Ok(false);
        }
        let Some(image) = self.snapshot_image(&snapshot.image)? else {
            return Ok(false);
        };
        self.state.load_image(image, true);
        self.state.annotations.shapes = snapshot.shapes;
        self.state.set_zoom(snapshot.ui.zoom);
        self.redraw();
        log::debug!(
            "Restored {} shapes from snapshot v{}",
            self.state.annotations.shapes.len(),
            snapshot.version
        );
        Ok(true)
    }

    /// Flatten the shapes onto the image at natural resolution
    pub fn composite(&self) -> Result<RgbaImage> {
        let params = CompositeParams {
            blur_radius: self.state.view.blur_radius,
            pixel_size: self.state.view.pixel_size,
        };
        render_final(
            self.state.image.as_ref(),
            &self.state.annotations.shapes,
            params,
            self.font.as_ref(),
        )
    }

    /// JPEG at the configured quality
    pub fn jpeg_format(&self) -> ExportFormat {
        ExportFormat::Jpeg {
            quality: self.config.jpeg_quality,
        }
    }

    /// Composite, encode and deliver.
    ///
    /// Returns the written path for downloads.
    pub fn export(
        &self,
        format: ExportFormat,
        action: &ExportAction,
        host: &mut dyn ExportHost,
    ) -> anyhow::Result<Option<PathBuf>> {
        if !self.exports_enabled() {
            return Err(EditorError::NoImage.into());
        }
        let flattened = self.composite()?;
        let payload = export::encode(&flattened, format)?;
        log::info!(
            "Exporting {}x{} {} ({} bytes) via {:?}",
            payload.width,
            payload.height,
            payload.mime(),
            payload.bytes.len(),
            action
        );
        let dir = self.config.export_dir();
        export::deliver(&payload, action, dir.as_deref(), host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShapeColor, Tool};
    use crate::domain::Point;
    use crate::export::ExportPayload;
    use crate::session::history::MAX_UNDO;
    use crate::session::messages::KeyPress;
    use image::Rgba;

    fn image(w: u32, h: u32) -> LoadedImage {
        LoadedImage::from_rgba(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))).unwrap()
    }

    /// Editor showing an 800x600 image at scale 1 (container 800)
    fn editor() -> Editor {
        let mut editor = Editor::new(EditorConfig::default(), SurfaceKind::Panel, 820.0);
        let cmds = editor.update(EditorMsg::ImageLoaded(image(800, 600)));
        assert_eq!(cmds.len(), 1);
        editor.update(EditorMsg::SaveFinished);
        editor
    }

    fn drag(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) -> Vec<Command> {
        editor.update(EditorMsg::pointer_down(from.0, from.1));
        editor.update(EditorMsg::pointer_move(to.0, to.1));
        editor.update(EditorMsg::pointer_up(to.0, to.1))
    }

    /// Drag and acknowledge the resulting write
    fn drag_saved(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) {
        let cmds = drag(editor, from, to);
        if cmds.iter().any(|c| matches!(c, Command::Persist(_))) {
            editor.update(EditorMsg::SaveFinished);
        }
    }

    fn persisted(cmds: &[Command]) -> Option<&SessionSnapshot> {
        cmds.iter().find_map(|c| match c {
            Command::Persist(s) => Some(s),
            _ => None,
        })
    }

    #[derive(Default)]
    struct NullHost {
        copied: Vec<ExportPayload>,
    }

    impl ExportHost for NullHost {
        fn copy_to_clipboard(&mut self, payload: &ExportPayload) -> anyhow::Result<()> {
            self.copied.push(payload.clone());
            Ok(())
        }
        fn print(&mut self, _payload: &ExportPayload) -> anyhow::Result<()> {
            Ok(())
        }
        fn open_in_new_view(&mut self, _payload: &ExportPayload) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_draw_undo_redo_scenario() {
        let mut editor = editor();
        assert_eq!(editor.state().viewport.scale(), 1.0);

        let cmds = drag(&mut editor, (100.0, 100.0), (50.0, 50.0));
        let snapshot = persisted(&cmds).unwrap();
        assert_eq!(snapshot.shapes.len(), 1);
        editor.update(EditorMsg::SaveFinished);

        let r = editor.shapes()[0].region().unwrap().clone();
        assert_eq!((r.x, r.y, r.w, r.h), (50.0, 50.0, 50.0, 50.0));

        let cmds = editor.update(EditorMsg::Undo);
        assert!(editor.shapes().is_empty());
        assert!(persisted(&cmds).is_some());
        editor.update(EditorMsg::SaveFinished);

        editor.update(EditorMsg::Redo);
        assert_eq!(editor.shapes().len(), 1);
        assert_eq!(editor.shapes()[0].region(), Some(&r));
    }

    #[test]
    fn test_undo_n_times_then_redo_n_times() {
        let mut editor = editor();
        for i in 0..5 {
            let x = 10.0 * i as f32;
            drag_saved(&mut editor, (x, x), (x + 5.0, x + 5.0));
        }
        let full = editor.shapes().to_vec();
        for n in (0..5).rev() {
            editor.update(EditorMsg::Undo);
            editor.update(EditorMsg::SaveFinished);
            assert_eq!(editor.shapes(), &full[..n]);
        }
        for n in 1..=5 {
            editor.update(EditorMsg::Redo);
            editor.update(EditorMsg::SaveFinished);
            assert_eq!(editor.shapes(), &full[..n]);
        }
    }

    #[test]
    fn test_undo_stack_is_bounded() {
        let mut editor = editor();
        for _ in 0..MAX_UNDO + 1 {
            drag_saved(&mut editor, (1.0, 1.0), (2.0, 2.0));
        }
        assert_eq!(editor.state().annotations.history.undo_len(), MAX_UNDO);
        for _ in 0..MAX_UNDO {
            editor.update(EditorMsg::Undo);
            editor.update(EditorMsg::SaveFinished);
        }
        // The very first pre-image was evicted
        assert_eq!(editor.shapes().len(), 1);
        assert!(!editor.state().annotations.history.can_undo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut editor = editor();
        drag_saved(&mut editor, (1.0, 1.0), (9.0, 9.0));
        editor.update(EditorMsg::Undo);
        editor.update(EditorMsg::SaveFinished);
        drag_saved(&mut editor, (2.0, 2.0), (8.0, 8.0));
        assert!(editor.update(EditorMsg::Redo).is_empty());
        assert_eq!(editor.shapes().len(), 1);
    }

    #[test]
    fn test_zoom_is_clamped_and_saved() {
        let mut editor = editor();
        editor.update(EditorMsg::SetZoom(4.0));
        editor.update(EditorMsg::SaveFinished);
        assert!(editor.update(EditorMsg::SetZoom(5.0)).is_empty());
        assert_eq!(editor.state().view.zoom_percent(), 400);

        let cmds = editor.update(EditorMsg::SetZoomPercent(53));
        assert_eq!(editor.state().view.zoom_percent(), 55);
        assert_eq!(persisted(&cmds).unwrap().ui.zoom, editor.state().view.zoom);
    }

    #[test]
    fn test_surface_follows_zoom() {
        let mut editor = editor();
        assert_eq!(editor.surface().map(|s| (s.width(), s.height())), Some((800, 600)));
        editor.update(EditorMsg::key(KeyPress::new("-")));
        assert_eq!(editor.surface().map(|s| (s.width(), s.height())), Some((720, 540)));
    }

    #[test]
    fn test_second_save_dropped_while_in_flight() {
        let mut editor = editor();
        let first = drag(&mut editor, (0.0, 0.0), (5.0, 5.0));
        assert!(persisted(&first).is_some());
        let second = drag(&mut editor, (0.0, 0.0), (6.0, 6.0));
        assert!(persisted(&second).is_none());
        assert_eq!(editor.shapes().len(), 2);
        editor.update(EditorMsg::SaveFinished);
        let third = editor.update(EditorMsg::Undo);
        assert_eq!(persisted(&third).unwrap().shapes.len(), 1);
    }

    #[test]
    fn test_text_flow() {
        let mut editor = editor();
        editor.update(EditorMsg::SetTool(Tool::Text));
        editor.update(EditorMsg::SetColor(ShapeColor::parse("#ff0000").unwrap()));
        let cmds = editor.update(EditorMsg::pointer_down(40.0, 60.0));
        assert_eq!(
            cmds,
            vec![Command::PromptText {
                anchor: Point::new(40.0, 60.0),
                color: ShapeColor::parse("#ff0000").unwrap(),
                size: 4.0,
            }]
        );
        let cmds = editor.update(EditorMsg::TextEntered(Some("secret".into())));
        assert!(persisted(&cmds).is_some());
        match &editor.shapes()[0] {
            Shape::Text(t) => assert_eq!((t.x, t.y, t.text.as_str()), (40.0, 60.0, "secret")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_text_commits_nothing() {
        let mut editor = editor();
        editor.update(EditorMsg::SetTool(Tool::Text));
        editor.update(EditorMsg::pointer_down(1.0, 1.0));
        assert!(editor.update(EditorMsg::TextEntered(None)).is_empty());
        editor.update(EditorMsg::pointer_down(1.0, 1.0));
        assert!(editor.update(EditorMsg::TextEntered(Some(String::new()))).is_empty());
        assert!(editor.shapes().is_empty());
    }

    #[test]
    fn test_soft_clear_vs_hard_clear() {
        let mut editor = editor();
        assert!(editor.update(EditorMsg::ClearAnnotations).is_empty());

        drag_saved(&mut editor, (0.0, 0.0), (5.0, 5.0));
        let cmds = editor.update(EditorMsg::ClearAnnotations);
        assert!(editor.shapes().is_empty());
        assert!(persisted(&cmds).is_some());
        editor.update(EditorMsg::Undo);
        assert_eq!(editor.shapes().len(), 1);

        // Hard clear publishes even with a save in flight
        assert!(editor.is_saving());
        let cmds = editor.update(EditorMsg::ClearAll);
        assert!(persisted(&cmds).unwrap().is_reset());
        assert!(!editor.exports_enabled());
        assert!(editor.surface().is_none());
        assert!(!editor.state().annotations.history.can_undo());
    }

    #[test]
    fn test_replication_between_surfaces() {
        let mut a = editor();
        let mut b = Editor::new(EditorConfig::default(), SurfaceKind::Popout, 420.0);

        a.update(EditorMsg::SetTool(Tool::Arrow));
        let cmds = drag(&mut a, (10.0, 10.0), (200.0, 120.0));
        let snapshot = persisted(&cmds).unwrap().clone();
        a.update(EditorMsg::SaveFinished);

        // Own write is ignored
        a.update(EditorMsg::Remote(snapshot.clone()));
        assert_eq!(a.shapes().len(), 1);

        b.update(EditorMsg::Remote(snapshot));
        assert_eq!(b.shapes(), a.shapes());
        assert_eq!(b.state().view, a.state().view);
        assert!(b.exports_enabled());
        assert_eq!(b.composite().unwrap(), a.composite().unwrap());

        let cmds = a.update(EditorMsg::ClearAll);
        let reset = persisted(&cmds).unwrap().clone();
        b.update(EditorMsg::SetColor(ShapeColor::parse("#000000").unwrap()));
        b.update(EditorMsg::Remote(reset));
        assert!(b.shapes().is_empty());
        assert!(!b.exports_enabled());
        assert!(!b.state().annotations.history.can_undo());
        assert_eq!(b.state().view.tool, Tool::Arrow);
        assert_eq!(b.state().view.color, a.state().view.color);
        assert_eq!(b.state().view.zoom, a.state().view.zoom);
    }

    #[test]
    fn test_stale_remote_snapshot_ignored() {
        let mut a = editor();
        let mut b = editor();
        let cmds = drag(&mut a, (0.0, 0.0), (5.0, 5.0));
        let mut stale = persisted(&cmds).unwrap().clone();

        let cmds = drag(&mut b, (0.0, 0.0), (9.0, 9.0));
        let newer = persisted(&cmds).unwrap().version;
        stale.version = newer - 1_000;
        b.update(EditorMsg::Remote(stale));
        assert_eq!(b.shapes()[0].region().unwrap().w, 9.0);
    }

    #[test]
    fn test_restore_is_non_mutating() {
        let mut a = editor();
        drag_saved(&mut a, (0.0, 0.0), (5.0, 5.0));
        a.update(EditorMsg::SetZoom(1.5));
        a.update(EditorMsg::SaveFinished);
        let cmds = a.update(EditorMsg::SetGrid(true));
        assert!(cmds.is_empty());
        let cmds = a.update(EditorMsg::SetZoom(2.0));
        let snapshot = persisted(&cmds).unwrap().clone();

        let mut b = Editor::new(EditorConfig::default(), SurfaceKind::Popout, 820.0);
        assert!(b.restore(Some(snapshot)).unwrap());
        assert_eq!(b.shapes(), a.shapes());
        assert_eq!(b.state().view.zoom, 2.0);
        // Only zoom is restored from the view block
        assert!(!b.state().view.grid);
        assert!(!b.is_saving());
        assert!(!b.state().annotations.history.can_undo());
        assert!(!b.restore(None).unwrap());
    }

    #[test]
    fn test_export_requires_image() {
        let editor = Editor::new(EditorConfig::default(), SurfaceKind::Panel, 820.0);
        let mut host = NullHost::default();
        assert!(!editor.exports_enabled());
        assert!(editor
            .export(ExportFormat::Png, &ExportAction::CopyToClipboard, &mut host)
            .is_err());
    }

    #[test]
    fn test_export_has_natural_dimensions() {
        let mut editor = editor();
        editor.update(EditorMsg::Resize(300.0));
        editor.update(EditorMsg::SetZoom(0.5));
        let mut host = NullHost::default();
        editor
            .export(editor.jpeg_format(), &ExportAction::CopyToClipboard, &mut host)
            .unwrap();
        assert_eq!((host.copied[0].width, host.copied[0].height), (800, 600));
        assert_eq!(host.copied[0].mime(), "image/jpeg");
    }

    #[test]
    fn test_download_into_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig {
            export_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let mut editor = Editor::new(config, SurfaceKind::Panel, 820.0);
        editor.update(EditorMsg::ImageLoaded(image(20, 10)));
        let path = editor
            .export(ExportFormat::Png, &ExportAction::Download, &mut NullHost::default())
            .unwrap()
            .unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "png");
    }
}
