//! The authoritative note list and current selection.

use crate::core::storage::{NoteStorage, SharedStore};
use crate::core::subject::Subject;
use crate::{Note, NoteChanges};

/// Owns every note of an application instance and the current selection.
///
/// All mutations go through `NotesRepository` methods. Each mutation writes
/// the full list through the [`NoteStorage`] adapter before notifying
/// observers, so the store never lags behind a completed call. Operations on
/// unknown ids are silent no-ops.
///
/// Methods take `&self`; the repository is meant to be shared as
/// `Rc<NotesRepository>` between the front end and the editor coordinator.
pub struct NotesRepository {
    notes: Subject<Vec<Note>>,
    selected: Subject<Option<Note>>,
    storage: NoteStorage,
    /// Set when the stored list could not be read. Writes are then skipped so
    /// the unreadable value is left in place.
    read_only: bool,
}

impl NotesRepository {
    /// Loads the stored note list, or synthesizes and persists the welcome
    /// note when nothing usable is stored.
    ///
    /// The first note becomes the selection. A backend that fails to read, or
    /// a stored value that does not decode, is logged and the repository runs
    /// in memory only: the welcome note is shown but nothing is written back.
    pub fn load(store: SharedStore) -> Self {
        let storage = NoteStorage::new(store);

        let (stored, read_only) = match storage.load_notes() {
            Ok(notes) => (notes.unwrap_or_default(), false),
            Err(e) => {
                log::warn!("Ignoring unreadable stored notes, changes will not be saved: {e}");
                (Vec::new(), true)
            }
        };

        let repo = Self {
            notes: Subject::new(Vec::new()),
            selected: Subject::new(None),
            storage,
            read_only,
        };

        if stored.is_empty() {
            log::debug!("No stored notes, creating welcome note");
            let welcome = Note::welcome();
            repo.commit(vec![welcome.clone()]);
            repo.selected.next(Some(welcome));
        } else {
            log::debug!("Loaded {} notes", stored.len());
            let first = stored.first().cloned();
            repo.notes.next(stored);
            repo.selected.next(first);
        }

        repo
    }

    /// Live view of the full note list, newest first.
    pub fn list_notes(&self) -> &Subject<Vec<Note>> {
        &self.notes
    }

    /// Live view of the current selection.
    pub fn selected_note(&self) -> &Subject<Option<Note>> {
        &self.selected
    }

    /// Snapshot of the current note list.
    pub fn notes(&self) -> Vec<Note> {
        self.notes.get()
    }

    /// Snapshot of the current selection.
    pub fn selected(&self) -> Option<Note> {
        self.selected.get()
    }

    pub fn selected_id(&self) -> Option<String> {
        self.selected.get().map(|note| note.id)
    }

    pub fn get_note(&self, id: &str) -> Option<Note> {
        self.notes.get().into_iter().find(|note| note.id == id)
    }

    /// Whether writes reach a backend that outlives the process.
    pub fn is_persistent(&self) -> bool {
        !self.read_only && self.storage.store().is_durable()
    }

    /// Selects the note with `id`, or clears the selection if none matches.
    ///
    /// Re-selecting the current note publishes nothing.
    pub fn select_note(&self, id: &str) {
        let note = self.get_note(id);
        if note.is_none() {
            log::debug!("select_note: no note with id {id}");
        }
        self.selected.next_if_changed(note);
    }

    /// Prepends a blank note, selects it and persists. Returns its id.
    pub fn add_note(&self) -> String {
        let note = Note::blank();
        let id = note.id.clone();

        let mut notes = self.notes.get();
        notes.insert(0, note.clone());
        self.commit(notes);
        self.selected.next(Some(note));

        log::debug!("Added note {id}");
        id
    }

    /// Applies the supplied fields to the note with `id`.
    ///
    /// If that note is selected, the selection republishes the updated note.
    pub fn update_note(&self, id: &str, changes: NoteChanges) {
        let mut notes = self.notes.get();
        let Some(note) = notes.iter_mut().find(|note| note.id == id) else {
            log::debug!("update_note: no note with id {id}");
            return;
        };

        note.apply(changes);
        let updated = note.clone();
        self.commit(notes);

        if self.selected_id().as_deref() == Some(id) {
            self.selected.next(Some(updated));
        }
    }

    /// Removes the note with `id`.
    ///
    /// If it was selected, the selection falls back to the first remaining
    /// note, or to empty.
    pub fn delete_note(&self, id: &str) {
        let mut notes = self.notes.get();
        let Some(index) = notes.iter().position(|note| note.id == id) else {
            log::debug!("delete_note: no note with id {id}");
            return;
        };

        notes.remove(index);
        let fallback = notes.first().cloned();
        self.commit(notes);

        if self.selected_id().as_deref() == Some(id) {
            self.selected.next(fallback);
        }

        log::debug!("Deleted note {id}");
    }

    /// Persists `notes` as the full snapshot, then publishes it.
    fn commit(&self, notes: Vec<Note>) {
        if self.read_only {
            log::debug!("Not persisting notes: store is read-only for this session");
        } else if let Err(e) = self.storage.save_notes(&notes) {
            log::error!("Failed to persist notes: {e}");
        }
        self.notes.next(notes);
    }
}
