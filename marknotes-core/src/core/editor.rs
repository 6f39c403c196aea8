//! Editor state and the debounced edit pipeline.
//!
//! [`EditorCoordinator`] sits between an input surface and the
//! [`NotesRepository`]. Title and content edits pass through one
//! [`Debouncer`] each, so a burst of keystrokes turns into a single
//! `update_note` call once typing pauses. The event loop drives the timers by
//! calling [`EditorCoordinator::tick`].
//!
//! Content edits use the same debounce window as titles. The preview is
//! re-rendered when a content edit is committed, and straight away (from the
//! newest typed text) when the preview is switched on.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::debounce::{Clock, Debouncer, DEFAULT_DEBOUNCE};
use crate::core::export::{ExportError, ExportFormat, Exporter};
use crate::core::markdown::MarkdownRenderer;
use crate::core::repository::NotesRepository;
use crate::core::subject::Subscription;
use crate::{Note, NoteChanges, Result};

/// Transient editor state plus the edit pipeline for the selected note.
pub struct EditorCoordinator {
    repo: Rc<NotesRepository>,
    renderer: Rc<dyn MarkdownRenderer>,
    exporter: Exporter,
    clock: Rc<dyn Clock>,
    title: Debouncer<String>,
    content: Debouncer<String>,
    /// Note the pipelines are currently bound to.
    bound_id: Option<String>,
    selected: Rc<RefCell<Option<Note>>>,
    rendered: Rc<RefCell<Option<String>>>,
    show_preview: bool,
    show_export_menu: bool,
    delete_prompt_visible: bool,
    subscription: Option<Subscription>,
}

impl EditorCoordinator {
    pub fn new(
        repo: Rc<NotesRepository>,
        renderer: Rc<dyn MarkdownRenderer>,
        exporter: Exporter,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let selected = Rc::new(RefCell::new(None));
        let rendered = Rc::new(RefCell::new(None));

        let subscription = {
            let selected = Rc::clone(&selected);
            let rendered = Rc::clone(&rendered);
            let renderer = Rc::clone(&renderer);
            repo.selected_note().subscribe(move |note: &Option<Note>| {
                *rendered.borrow_mut() = note.as_ref().map(|n| renderer.render(&n.content));
                *selected.borrow_mut() = note.clone();
            })
        };

        let mut editor = Self {
            repo,
            renderer,
            exporter,
            clock,
            title: Debouncer::new(DEFAULT_DEBOUNCE),
            content: Debouncer::new(DEFAULT_DEBOUNCE),
            bound_id: None,
            selected,
            rendered,
            show_preview: false,
            show_export_menu: false,
            delete_prompt_visible: false,
            subscription: Some(subscription),
        };
        editor.rebind();
        editor
    }

    /// Replaces the debounce windows. A zero `content` window forwards
    /// content edits as soon as they pass dedupe.
    pub fn with_debounce(mut self, title: Duration, content: Duration) -> Self {
        self.title = Debouncer::new(title);
        self.content = Debouncer::new(content);
        self.bound_id = None;
        self.rebind();
        self
    }

    pub fn repository(&self) -> &Rc<NotesRepository> {
        &self.repo
    }

    pub fn selected(&self) -> Option<Note> {
        self.selected.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.subscription.is_none()
    }

    // ── Edit pipeline ────────────────────────────────────────────────────

    pub fn on_title_change(&mut self, title: impl Into<String>) {
        if self.is_disposed() {
            return;
        }
        self.rebind();
        if let Some(title) = self.title.push(title.into(), self.clock.now()) {
            self.commit(NoteChanges::title(title));
        }
    }

    pub fn on_content_change(&mut self, content: impl Into<String>) {
        if self.is_disposed() {
            return;
        }
        self.rebind();
        if let Some(content) = self.content.push(content.into(), self.clock.now()) {
            self.commit(NoteChanges::content(content));
        }
    }

    /// Commits every edit whose debounce window has elapsed.
    ///
    /// Returns `true` if anything was written.
    pub fn tick(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let now = self.clock.now();
        let title = self.title.poll(now);
        let content = self.content.poll(now);
        self.commit_pair(title, content)
    }

    /// Commits all pending edits immediately.
    pub fn flush(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let title = self.title.flush();
        let content = self.content.flush();
        self.commit_pair(title, content)
    }

    /// The earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.title.next_deadline(), self.content.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// The newest content typed for the selected note, committed or not.
    pub fn draft_content(&self) -> Option<String> {
        match self.content.pending_value() {
            Some(pending) => Some(pending.clone()),
            None => self.selected().map(|note| note.content),
        }
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.title.is_idle() || !self.content.is_idle()
    }

    fn commit_pair(&mut self, title: Option<String>, content: Option<String>) -> bool {
        let changed = title.is_some() || content.is_some();
        if let Some(title) = title {
            self.commit(NoteChanges::title(title));
        }
        if let Some(content) = content {
            self.commit(NoteChanges::content(content));
        }
        changed
    }

    fn commit(&mut self, changes: NoteChanges) {
        let Some(id) = self.bound_id.clone() else {
            log::debug!("Dropping edit: no note selected");
            return;
        };
        let re_render = changes.content.is_some();
        self.repo.update_note(&id, changes);
        if re_render {
            self.render_preview();
        }
    }

    /// Re-binds the pipelines when the selection moved to another note.
    ///
    /// The selection may have been changed through the shared repository
    /// rather than through this coordinator, so edits still pending for the
    /// previously bound note are written to that note first.
    fn rebind(&mut self) {
        let current = self.selected();
        let current_id = current.as_ref().map(|n| n.id.clone());
        if current_id == self.bound_id {
            return;
        }
        let title = self.title.flush();
        let content = self.content.flush();
        self.commit_pair(title, content);

        match current {
            Some(note) => {
                self.title.prime(note.title);
                self.content.prime(note.content);
            }
            None => {
                self.title.reset();
                self.content.reset();
            }
        }
        self.bound_id = current_id;
    }

    // ── Note commands ────────────────────────────────────────────────────

    /// Flushes pending edits into the current note, then selects `id`.
    pub fn select_note(&mut self, id: &str) {
        self.flush();
        self.repo.select_note(id);
        self.rebind();
    }

    /// Flushes pending edits, then adds and selects a new note.
    pub fn add_note(&mut self) -> String {
        self.flush();
        let id = self.repo.add_note();
        self.rebind();
        id
    }

    /// Flushes pending edits, deletes `id` and hides the delete prompt.
    pub fn delete_note(&mut self, id: &str) {
        self.flush();
        self.repo.delete_note(id);
        self.delete_prompt_visible = false;
        self.rebind();
    }

    // ── Preview ──────────────────────────────────────────────────────────

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    /// Flips preview visibility. Turning it on renders the newest content
    /// right away, including an edit still waiting for its debounce window.
    pub fn toggle_preview(&mut self) -> bool {
        self.show_preview = !self.show_preview;
        if self.show_preview {
            self.render_preview();
        }
        self.show_preview
    }

    /// HTML of the latest render, whether or not the preview is visible.
    pub fn rendered_content(&self) -> Option<String> {
        self.rendered.borrow().clone()
    }

    /// The rendered preview region; only present while the preview is shown.
    pub fn preview_region(&self) -> Option<String> {
        if self.show_preview {
            self.rendered_content()
        } else {
            None
        }
    }

    fn render_preview(&mut self) {
        let html = self.draft_content().map(|content| self.renderer.render(&content));
        *self.rendered.borrow_mut() = html;
    }

    // ── Menus ────────────────────────────────────────────────────────────

    pub fn show_export_menu(&self) -> bool {
        self.show_export_menu
    }

    pub fn toggle_export_menu(&mut self) -> bool {
        self.show_export_menu = !self.show_export_menu;
        self.show_export_menu
    }

    /// Hides the export menu, e.g. on a click outside it.
    pub fn close_export_menu(&mut self) {
        self.show_export_menu = false;
    }

    pub fn delete_prompt_visible(&self) -> bool {
        self.delete_prompt_visible
    }

    pub fn toggle_delete_prompt(&mut self) -> bool {
        self.delete_prompt_visible = !self.delete_prompt_visible;
        self.delete_prompt_visible
    }

    // ── Export ───────────────────────────────────────────────────────────

    /// Exports the selected note and closes the export menu.
    ///
    /// Returns `Ok(None)` when nothing is selected or when the PDF render
    /// target is missing (logged). PDF export shows the preview for the
    /// duration of the export if it was hidden, and restores it afterwards
    /// whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MarknotesError::Export`] when the rasterizer is
    /// missing or fails, or the file cannot be delivered.
    pub fn export_note(&mut self, format: ExportFormat) -> Result<Option<PathBuf>> {
        self.flush();
        let outcome = self.perform_export(format);
        self.show_export_menu = false;
        outcome
    }

    fn perform_export(&mut self, format: ExportFormat) -> Result<Option<PathBuf>> {
        let Some(note) = self.selected() else {
            return Ok(None);
        };

        let outcome = match format {
            ExportFormat::Markdown => self.exporter.export(&note, format, None),
            ExportFormat::Pdf => {
                let prior = self.show_preview;
                if !prior {
                    self.show_preview = true;
                    self.render_preview();
                }
                let region = self.preview_region();
                let outcome = self.exporter.export(&note, format, region.as_deref());
                self.show_preview = prior;
                outcome
            }
        };

        match outcome {
            Ok(path) => Ok(Some(path)),
            Err(ExportError::MissingRenderTarget) => {
                log::error!("PDF export aborted: preview region for note {} was not rendered", note.id);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ── Teardown ─────────────────────────────────────────────────────────

    /// Cancels pending edits and stops observing the repository.
    ///
    /// After this no edit, tick or flush reaches the repository. Call
    /// [`flush`](Self::flush) first to keep pending edits.
    pub fn dispose(&mut self) {
        self.title.cancel();
        self.content.cancel();
        self.subscription = None;
    }
}

impl Drop for EditorCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::debounce::ManualClock;
    use crate::core::export::{
        DocumentRasterizer, MemorySink, Placement, RasterImage,
    };
    use crate::core::markdown::CmarkRenderer;
    use crate::core::storage::{MemoryStore, SharedStore};

    const WINDOW: Duration = DEFAULT_DEBOUNCE;

    struct Harness {
        editor: EditorCoordinator,
        repo: Rc<NotesRepository>,
        clock: Rc<ManualClock>,
        sink: MemorySink,
        updates: Rc<RefCell<usize>>,
        _sub: Subscription,
    }

    /// Records every HTML region it is asked to rasterize.
    #[derive(Clone, Default)]
    struct RecordingRasterizer {
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl DocumentRasterizer for RecordingRasterizer {
        fn rasterize(&self, html: &str, _scale: f32) -> std::result::Result<RasterImage, ExportError> {
            self.seen.borrow_mut().push(html.to_string());
            Ok(RasterImage { width_px: 10, height_px: 10, data: Vec::new() })
        }

        fn write_pdf(&self, _image: &RasterImage, _placement: &Placement) -> std::result::Result<Vec<u8>, ExportError> {
            Ok(b"%PDF-1.4".to_vec())
        }
    }

    fn harness_with(exporter: impl FnOnce(MemorySink) -> Exporter) -> Harness {
        let store: SharedStore = Rc::new(MemoryStore::new());
        let repo = Rc::new(NotesRepository::load(store));
        let clock = Rc::new(ManualClock::new());
        let sink = MemorySink::new();
        let editor = EditorCoordinator::new(
            Rc::clone(&repo),
            Rc::new(CmarkRenderer::default()),
            exporter(sink.clone()),
            clock.clone(),
        );

        // Count list emissions after the replay; each one is an update_note.
        let updates = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&updates);
        let first = Rc::new(RefCell::new(true));
        let sub = repo.list_notes().subscribe(move |_| {
            if first.replace(false) {
                return;
            }
            *counter.borrow_mut() += 1;
        });

        Harness { editor, repo, clock, sink, updates, _sub: sub }
    }

    fn harness() -> Harness {
        harness_with(|sink| Exporter::new(Box::new(sink)))
    }

    #[test]
    fn test_rapid_title_edits_produce_one_update() {
        let mut h = harness();
        for title in ["S", "Sh", "Sho", "Shop"] {
            h.editor.on_title_change(title);
            h.clock.advance(Duration::from_millis(100));
            h.editor.tick();
        }
        assert_eq!(*h.updates.borrow(), 0);

        h.clock.advance(WINDOW);
        assert!(h.editor.tick());

        assert_eq!(*h.updates.borrow(), 1);
        assert_eq!(h.repo.selected().unwrap().title, "Shop");
    }

    #[test]
    fn test_unchanged_title_is_not_written() {
        let mut h = harness();
        let current = h.repo.selected().unwrap().title;

        h.editor.on_title_change(current);
        h.clock.advance(WINDOW);
        h.editor.tick();

        assert_eq!(*h.updates.borrow(), 0);
    }

    #[test]
    fn test_content_commit_renders_preview() {
        let mut h = harness();
        h.editor.add_note();

        h.editor.on_content_change("# Hi");
        h.clock.advance(WINDOW);
        h.editor.tick();

        assert_eq!(h.repo.selected().unwrap().content, "# Hi");
        assert!(h.editor.rendered_content().unwrap().contains("<h1>Hi</h1>"));
    }

    #[test]
    fn test_zero_content_window_forwards_immediately() {
        let h = harness();
        let mut editor = h.editor.with_debounce(WINDOW, Duration::ZERO);

        editor.on_content_change("now");
        assert_eq!(h.repo.selected().unwrap().content, "now");
        assert_eq!(*h.updates.borrow(), 1);
    }

    #[test]
    fn test_toggle_preview_renders_pending_content() {
        let mut h = harness();
        h.editor.add_note();
        h.editor.on_content_change("## Draft");

        assert!(h.editor.toggle_preview());

        assert!(h.editor.preview_region().unwrap().contains("<h2>Draft</h2>"));
        assert_eq!(*h.updates.borrow(), 1, "only the add; the edit is still pending");
        assert!(h.editor.has_pending_edits());
    }

    #[test]
    fn test_hidden_preview_has_no_region() {
        let h = harness();
        assert!(!h.editor.show_preview());
        assert!(h.editor.rendered_content().is_some());
        assert_eq!(h.editor.preview_region(), None);
    }

    #[test]
    fn test_switching_notes_flushes_into_previous_note() {
        let mut h = harness();
        let first = h.editor.add_note();
        h.editor.on_title_change("first title");

        let second = h.editor.add_note();

        assert_eq!(h.repo.get_note(&first).unwrap().title, "first title");
        assert_eq!(h.repo.get_note(&second).unwrap().title, "new-document.md");
        assert!(!h.editor.has_pending_edits());
    }

    #[test]
    fn test_selection_changed_elsewhere_keeps_pending_edit() {
        let mut h = harness();
        let welcome = h.repo.selected_id().unwrap();
        let first = h.editor.add_note();
        h.editor.on_title_change("typed but pending");

        h.repo.select_note(&welcome);
        h.editor.on_content_change("welcome edit");
        h.editor.flush();

        assert_eq!(h.repo.get_note(&first).unwrap().title, "typed but pending");
        assert_eq!(h.repo.get_note(&welcome).unwrap().content, "welcome edit");
    }

    #[test]
    fn test_same_title_on_another_note_is_still_written() {
        let mut h = harness();
        let first = h.editor.add_note();
        h.editor.on_title_change("same");
        h.editor.flush();

        let second = h.editor.add_note();
        h.editor.on_title_change("same");
        h.editor.flush();

        assert_eq!(h.repo.get_note(&first).unwrap().title, "same");
        assert_eq!(h.repo.get_note(&second).unwrap().title, "same");
    }

    #[test]
    fn test_delete_hides_prompt_and_reselects() {
        let mut h = harness();
        let welcome = h.repo.selected_id().unwrap();
        let added = h.editor.add_note();

        assert!(h.editor.toggle_delete_prompt());
        h.editor.delete_note(&added);

        assert!(!h.editor.delete_prompt_visible());
        assert_eq!(h.editor.selected().unwrap().id, welcome);
    }

    #[test]
    fn test_edits_without_selection_are_dropped() {
        let mut h = harness();
        let only = h.repo.selected_id().unwrap();
        h.editor.delete_note(&only);
        let before = *h.updates.borrow();

        h.editor.on_title_change("orphan");
        h.editor.flush();

        assert_eq!(*h.updates.borrow(), before);
        assert!(h.repo.notes().is_empty());
    }

    #[test]
    fn test_export_without_selection_is_noop() {
        let mut h = harness();
        let only = h.repo.selected_id().unwrap();
        h.editor.delete_note(&only);

        assert_eq!(h.editor.export_note(ExportFormat::Markdown).unwrap(), None);
        assert!(h.sink.files().is_empty());
    }

    #[test]
    fn test_markdown_export_uses_sanitized_title_and_closes_menu() {
        let mut h = harness();
        h.editor.add_note();
        h.editor.on_title_change("My: Notes?");
        h.editor.on_content_change("body");
        h.editor.toggle_export_menu();

        let path = h.editor.export_note(ExportFormat::Markdown).unwrap();

        assert_eq!(path, Some(PathBuf::from("My-_Notes-.md")));
        let files = h.sink.files();
        assert_eq!(files[0].bytes, b"body");
        assert!(!h.editor.show_export_menu());
    }

    #[test]
    fn test_pdf_export_without_rasterizer_reports_and_restores_preview() {
        let mut h = harness();

        let result = h.editor.export_note(ExportFormat::Pdf);

        assert!(matches!(
            result,
            Err(crate::MarknotesError::Export(ExportError::RasterizerUnavailable))
        ));
        assert!(!h.editor.show_preview());
        assert!(h.sink.files().is_empty());
    }

    #[test]
    fn test_pdf_export_forces_preview_temporarily() {
        let rasterizer = RecordingRasterizer::default();
        let seen = Rc::clone(&rasterizer.seen);
        let mut h = harness_with(move |sink| {
            Exporter::new(Box::new(sink)).with_rasterizer(Box::new(rasterizer))
        });
        h.editor.add_note();
        h.editor.on_title_change("Report");
        h.editor.on_content_change("# Quarterly");

        let path = h.editor.export_note(ExportFormat::Pdf).unwrap();

        assert_eq!(path, Some(PathBuf::from("Report.pdf")));
        assert!(seen.borrow()[0].contains("<h1>Quarterly</h1>"));
        assert!(!h.editor.show_preview(), "preview restored to hidden");
    }

    #[test]
    fn test_pdf_export_keeps_visible_preview() {
        let mut h = harness_with(|sink| {
            Exporter::new(Box::new(sink)).with_rasterizer(Box::new(RecordingRasterizer::default()))
        });
        h.editor.toggle_preview();

        h.editor.export_note(ExportFormat::Pdf).unwrap();

        assert!(h.editor.show_preview());
    }

    #[test]
    fn test_dispose_cancels_pending_edits() {
        let mut h = harness();
        let before = h.repo.selected().unwrap().title;
        h.editor.on_title_change("late");

        h.editor.dispose();
        h.clock.advance(WINDOW);
        assert!(!h.editor.tick());

        assert_eq!(h.repo.selected().unwrap().title, before);
        assert_eq!(h.repo.selected_note().observer_count(), 0);
    }

    #[test]
    fn test_next_deadline_tracks_earliest_pending_edit() {
        let mut h = harness();
        assert_eq!(h.editor.next_deadline(), None);

        let start = h.clock.now();
        h.editor.on_title_change("t");
        h.clock.advance(Duration::from_millis(200));
        h.editor.on_content_change("c");

        assert_eq!(h.editor.next_deadline(), Some(start + WINDOW));
    }
}
