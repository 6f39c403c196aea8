//! Core library for Marknotes — a local-first Markdown note-taking application.
//!
//! The primary entry point is [`NotesRepository`], which owns the note list and
//! the current selection and writes every change through a [`KeyValueStore`].
//! Interactive front ends drive it through an [`EditorCoordinator`], which
//! debounces title and content edits and handles preview and export.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    debounce::{Clock, Debouncer, ManualClock, SystemClock, DEFAULT_DEBOUNCE},
    editor::EditorCoordinator,
    error::{MarknotesError, Result},
    export::{
        export_file_name, fit_to_page, markdown_file, sanitize_file_name, DirectorySink,
        DocumentRasterizer, DownloadSink, ExportError, ExportFormat, ExportedFile, Exporter,
        MemorySink, Placement, RasterImage, PDF_SUPERSAMPLE,
    },
    markdown::{CmarkRenderer, MarkdownRenderer},
    note::{Note, NoteChanges, NEW_NOTE_TITLE, WELCOME_TITLE},
    repository::NotesRepository,
    storage::{
        KeyValueStore, MemoryStore, NoteStorage, NullStore, SharedStore, SqliteStore, NOTES_KEY,
        THEME_KEY,
    },
    subject::{Subject, Subscription},
    theme::{ClassList, StyleTarget, Theme, ThemeManager, DARK_CLASS},
};
