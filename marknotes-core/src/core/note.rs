use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to notes created with [`Note::blank`].
pub const NEW_NOTE_TITLE: &str = "new-document.md";

/// Title of the note synthesized on first run.
pub const WELCOME_TITLE: &str = "welcome.md";

const WELCOME_CONTENT: &str = include_str!("welcome.md");

/// A titled Markdown document.
///
/// Serializes as `{id, title, content, createdAt, updatedAt}` with RFC 3339
/// timestamps, which is the persisted record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a note with a fresh id and both timestamps set to now.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// An empty note carrying the placeholder title.
    pub fn blank() -> Self {
        Self::new(NEW_NOTE_TITLE, "")
    }

    /// The introductory document shown when the store holds no notes.
    pub fn welcome() -> Self {
        Self::new(WELCOME_TITLE, WELCOME_CONTENT.trim_end())
    }

    /// Applies the supplied fields and stamps `updated_at`.
    pub(crate) fn apply(&mut self, changes: NoteChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(content) = changes.content {
            self.content = content;
        }
        self.updated_at = Utc::now();
    }
}

/// A partial update: only fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl NoteChanges {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), content: None }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self { title: None, content: Some(content.into()) }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}
