//! Internal domain modules for the Marknotes core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod debounce;
pub mod editor;
pub mod error;
pub mod export;
pub mod markdown;
pub mod note;
pub mod repository;
pub mod storage;
pub mod subject;
pub mod theme;

#[doc(inline)]
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
#[doc(inline)]
pub use editor::EditorCoordinator;
#[doc(inline)]
pub use error::{MarknotesError, Result};
#[doc(inline)]
pub use export::{ExportError, ExportFormat, Exporter};
#[doc(inline)]
pub use markdown::{CmarkRenderer, MarkdownRenderer};
#[doc(inline)]
pub use note::{Note, NoteChanges};
#[doc(inline)]
pub use repository::NotesRepository;
#[doc(inline)]
pub use storage::{KeyValueStore, MemoryStore, NullStore, SqliteStore};
#[doc(inline)]
pub use subject::{Subject, Subscription};
#[doc(inline)]
pub use theme::{Theme, ThemeManager};
