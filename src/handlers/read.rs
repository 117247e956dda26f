//! GET /notes - the most recent records, capped.

use crate::handlers::Response;
use crate::store::ReadGrant;

/// How many records a listing returns at most.
pub const READ_LIMIT: usize = 10;

/// List the newest notes, most recent first.
pub fn handle(grant: &ReadGrant) -> Response {
    match grant.latest(READ_LIMIT) {
        Ok(notes) => match serde_json::to_string(&notes) {
            Ok(body) => Response::json(200, body),
            Err(e) => Response::json(500, format!(r#"{{"error":"{}"}}"#, e)),
        },
        Err(e) => Response::json(500, format!(r#"{{"error":"{}"}}"#, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::note::NoteInput;
    use crate::store::{MemNoteStore, NoteStore, WriteGrant};
    use std::sync::Arc;

    #[test]
    fn test_empty_table_lists_empty_array() {
        let store = Arc::new(MemNoteStore::new());
        let response = handle(&ReadGrant::new(store));

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"[]");
        assert!(response
            .headers
            .iter()
            .any(|(k, v)| k == "content-type" && v == "application/json"));
    }

    #[test]
    fn test_listing_caps_at_ten_newest_first() {
        let store = Arc::new(MemNoteStore::new());
        let writer = WriteGrant::new(store.clone());
        for i in 0..12 {
            writer
                .create(NoteInput {
                    note: format!("note {i}"),
                    subject: String::new(),
                    date: Some(format!("2026-08-{:02}T00:00:00.000Z", i + 1)),
                })
                .unwrap();
        }

        let response = handle(&ReadGrant::new(store));
        assert_eq!(response.status, 200);

        let notes: Vec<serde_json::Value> = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(notes.len(), READ_LIMIT);
        assert_eq!(notes[0]["note"], "note 11");
        assert_eq!(notes[9]["note"], "note 2");
    }

    #[test]
    fn test_store_failure_surfaces_as_server_error() {
        struct Broken;
        impl NoteStore for Broken {
            fn create(&self, _: NoteInput) -> anyhow::Result<crate::core::Note> {
                anyhow::bail!("table offline")
            }
            fn latest(&self, _: usize) -> anyhow::Result<Vec<crate::core::Note>> {
                anyhow::bail!("table offline")
            }
        }

        let response = handle(&ReadGrant::new(Arc::new(Broken)));
        assert_eq!(response.status, 500);
        assert!(String::from_utf8_lossy(&response.body).contains("table offline"));
    }
}
