//! Key-value persistence backends and the note-list adapter built on them.
//!
//! Everything Marknotes persists is a string value under a fixed key: the note
//! list as a JSON array under [`NOTES_KEY`] and the theme preference under
//! [`THEME_KEY`]. Three backends implement [`KeyValueStore`]:
//!
//! - [`SqliteStore`]: the durable backend, one `kv` table in a SQLite file.
//! - [`MemoryStore`]: lives as long as the process; used by tests and the
//!   CLI's `--ephemeral` mode.
//! - [`NullStore`]: used when no persistence is available at all. Reads
//!   return nothing and writes are dropped.

use crate::{MarknotesError, Note, Result};
use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Key under which the full note list is stored.
pub const NOTES_KEY: &str = "notes";

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "theme";

/// A string-to-string persistence layer.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Whether values survive the process. `false` for [`NullStore`] and
    /// [`MemoryStore`].
    fn is_durable(&self) -> bool;
}

/// Shared handle to a backend; the repository and the theme manager write
/// through the same store.
pub type SharedStore = Rc<dyn KeyValueStore>;

/// Durable backend over a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new store file at `path` and initialises the schema.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Opens an existing store file and checks that it holds the `kv` table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'kv'",
            [],
            |row| row.get(0),
        )?;

        if table_count != 1 {
            return Err(MarknotesError::InvalidStore(
                "Not a valid Marknotes store".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    /// Opens the store at `path`, creating it first if the file does not exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }
}

/// Process-lifetime backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// Backend for environments without persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl KeyValueStore for NullStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// Reads and writes the full note list as JSON under [`NOTES_KEY`].
///
/// The adapter owns no business logic: it never inspects the notes, and every
/// save replaces the stored snapshot wholesale.
#[derive(Clone)]
pub struct NoteStorage {
    store: SharedStore,
}

impl NoteStorage {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Returns `None` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`MarknotesError::Json`] if the stored value is not a valid
    /// note array, or any backend error.
    pub fn load_notes(&self) -> Result<Option<Vec<Note>>> {
        match self.store.get(NOTES_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_notes(&self, notes: &[Note]) -> Result<()> {
        let json = serde_json::to_string(notes)?;
        self.store.set(NOTES_KEY, &json)
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
