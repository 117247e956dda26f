//! Durable storage backing the materialized stack.
//!
//! Two stores live here: the object store behind the site bucket and
//! the note store behind the table. Both are traits so the local engine
//! and tests can swap implementations.

pub mod notes;
pub mod object;

pub use notes::{FileNoteStore, MemNoteStore, NoteStore, ReadGrant, WriteGrant};
pub use object::{DirObjectStore, ObjectMeta, ObjectStore, PutOptions};
