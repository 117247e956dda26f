//! Note storage - the table behind the request handlers.
//!
//! Every write creates a new, uniquely keyed row; nothing is updated or
//! deleted, so readers need no coordination beyond the store's own
//! write lock. Handlers never hold a store directly: they receive a
//! `ReadGrant` or `WriteGrant`, which exposes exactly the operation the
//! grant allows.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use crate::core::note::{now_iso, Note, NoteInput};
use crate::util::fs;

/// Note storage interface: point writes and capped range reads.
pub trait NoteStore: Send + Sync {
    /// Create a record, filling the generated key fields.
    fn create(&self, input: NoteInput) -> Result<Note>;

    /// The most recent records, newest first, at most `limit`.
    fn latest(&self, limit: usize) -> Result<Vec<Note>>;
}

/// Note store over a single JSON document.
///
/// The whole table is rewritten on each create, guarded by a write
/// lock; reads go straight to the file.
#[derive(Debug)]
pub struct FileNoteStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileNoteStore {
    /// Open a table document. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        FileNoteStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<Note>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("corrupt table document at {}", self.path.display()))
    }

    fn persist(&self, notes: &[Note]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::ensure_dir(parent)?;
        }
        let body = serde_json::to_vec_pretty(notes)?;
        fs::write_atomic(&self.path, &body)
            .with_context(|| format!("failed to write table document at {}", self.path.display()))
    }
}

impl NoteStore for FileNoteStore {
    fn create(&self, input: NoteInput) -> Result<Note> {
        let _guard = self.write_lock.lock().unwrap();

        let note = Note::from_input(input, now_iso());
        let mut notes = self.load()?;
        notes.push(note.clone());
        self.persist(&notes)?;

        Ok(note)
    }

    fn latest(&self, limit: usize) -> Result<Vec<Note>> {
        let mut notes = self.load()?;
        // Sort keys are fixed-width ISO-8601 strings, so lexicographic
        // descending is newest first.
        notes.sort_by(|a, b| b.sk.cmp(&a.sk));
        notes.truncate(limit);
        Ok(notes)
    }
}

/// In-memory note store for tests and ephemeral hosting.
#[derive(Debug, Default)]
pub struct MemNoteStore {
    notes: Mutex<Vec<Note>>,
}

impl MemNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for MemNoteStore {
    fn create(&self, input: NoteInput) -> Result<Note> {
        let note = Note::from_input(input, now_iso());
        self.notes.lock().unwrap().push(note.clone());
        Ok(note)
    }

    fn latest(&self, limit: usize) -> Result<Vec<Note>> {
        let mut notes = self.notes.lock().unwrap().clone();
        notes.sort_by(|a, b| b.sk.cmp(&a.sk));
        notes.truncate(limit);
        Ok(notes)
    }
}

/// Read capability over a note store.
///
/// The holder can list records but never create them.
#[derive(Clone)]
pub struct ReadGrant {
    store: Arc<dyn NoteStore>,
}

impl ReadGrant {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        ReadGrant { store }
    }

    /// The most recent records, newest first, at most `limit`.
    pub fn latest(&self, limit: usize) -> Result<Vec<Note>> {
        self.store.latest(limit)
    }
}

/// Write capability over a note store.
///
/// The holder can create records but never read them back.
#[derive(Clone)]
pub struct WriteGrant {
    store: Arc<dyn NoteStore>,
}

impl WriteGrant {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        WriteGrant { store }
    }

    /// Create a record, filling the generated key fields.
    pub fn create(&self, input: NoteInput) -> Result<Note> {
        self.store.create(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input(note: &str, date: &str) -> NoteInput {
        NoteInput {
            note: note.to_string(),
            subject: "test".to_string(),
            date: Some(date.to_string()),
        }
    }

    #[test]
    fn test_create_fills_key_fields() {
        let tmp = TempDir::new().unwrap();
        let store = FileNoteStore::open(tmp.path().join("notes.json"));

        let note = store
            .create(input("hello", "2024-03-01T10:00:00.000Z"))
            .unwrap();

        assert_eq!(note.pk, "note");
        assert_eq!(note.kind, "note");
        assert_eq!(note.sk, "2024-03-01T10:00:00.000Z");
        assert_eq!(note.sk, note.date);
    }

    #[test]
    fn test_table_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.json");

        FileNoteStore::open(&path)
            .create(input("persisted", "2024-03-01T10:00:00.000Z"))
            .unwrap();

        let reopened = FileNoteStore::open(&path);
        let notes = reopened.latest(10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note, "persisted");
    }

    #[test]
    fn test_latest_is_newest_first_and_capped() {
        let store = MemNoteStore::new();
        for day in 1..=12 {
            store
                .create(input(
                    &format!("note {day}"),
                    &format!("2024-03-{day:02}T10:00:00.000Z"),
                ))
                .unwrap();
        }

        let notes = store.latest(10).unwrap();
        assert_eq!(notes.len(), 10);
        assert_eq!(notes[0].note, "note 12");
        assert_eq!(notes[9].note, "note 3");
    }

    #[test]
    fn test_latest_returns_all_when_under_cap() {
        let store = MemNoteStore::new();
        for day in [3, 1, 2] {
            store
                .create(input(
                    &format!("note {day}"),
                    &format!("2024-03-{day:02}T10:00:00.000Z"),
                ))
                .unwrap();
        }

        let notes = store.latest(10).unwrap();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].note, "note 3");
        assert_eq!(notes[2].note, "note 1");
    }

    #[test]
    fn test_grants_split_capabilities() {
        let store: Arc<dyn NoteStore> = Arc::new(MemNoteStore::new());
        let write = WriteGrant::new(Arc::clone(&store));
        let read = ReadGrant::new(store);

        write
            .create(input("through grant", "2024-03-01T10:00:00.000Z"))
            .unwrap();

        let notes = read.latest(10).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note, "through grant");
    }

    #[test]
    fn test_empty_file_reads_as_empty_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.json");
        fs::write_string(&path, "").unwrap();

        let store = FileNoteStore::open(&path);
        assert!(store.latest(10).unwrap().is_empty());
    }
}
