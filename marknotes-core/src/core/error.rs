//! Error types for the Marknotes core library.

use thiserror::Error;

use crate::core::export::ExportError;

/// All errors that can occur within the Marknotes core library.
///
/// Repository operations on unknown note ids never produce an error; they are
/// silent no-ops. Errors surface only from the storage backends, the export
/// path and front-end lookups.
#[derive(Debug, Error)]
pub enum MarknotesError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The opened file is not a valid Marknotes store.
    #[error("Invalid store: {0}")]
    InvalidStore(String),

    /// A note ID was requested that does not exist.
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    /// Exporting a note failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored note data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`MarknotesError`].
pub type Result<T> = std::result::Result<T, MarknotesError>;

impl MarknotesError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::InvalidStore(_) => "Could not open the notes store".to_string(),
            Self::NoteNotFound(_) => "Note no longer exists".to_string(),
            Self::Export(ExportError::RasterizerUnavailable) => {
                "PDF export is not available: no document rasterizer is installed".to_string()
            }
            Self::Export(e) => format!("Export failed: {e}"),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
