//! The note record schema.
//!
//! Notes live in a composite-key table under a single partition. The sort
//! key mirrors the record's date so that a reversed range scan returns the
//! most recent records first.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Partition key value shared by all note records.
pub const NOTE_PARTITION: &str = "note";

/// Type discriminator stored on every record.
pub const NOTE_TYPE: &str = "note";

/// A stored note record.
///
/// Invariant: `sk` always equals `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Partition key, always `"note"`
    pub pk: String,

    /// Sort key, mirrors `date`
    pub sk: String,

    /// Type discriminator, always `"note"`
    #[serde(rename = "type")]
    pub kind: String,

    /// Note text
    pub note: String,

    /// Note subject
    pub subject: String,

    /// ISO-8601 timestamp supplied by the caller or generated at creation
    pub date: String,

    /// Creation timestamp
    pub created: String,

    /// Last update timestamp
    pub updated: String,
}

/// Caller-supplied fields of a new note.
///
/// Everything is optional; missing fields default so that an empty JSON
/// object still creates a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub note: String,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub date: Option<String>,
}

impl Note {
    /// Build a full record from caller input, generating key fields.
    ///
    /// A caller-supplied `date` is used verbatim as the sort key; absent
    /// dates fall back to `now`.
    pub fn from_input(input: NoteInput, now: impl Into<String>) -> Note {
        let now = now.into();
        let date = input.date.unwrap_or_else(|| now.clone());

        Note {
            pk: NOTE_PARTITION.to_string(),
            sk: date.clone(),
            kind: NOTE_TYPE.to_string(),
            note: input.note,
            subject: input.subject,
            date,
            created: now.clone(),
            updated: now,
        }
    }
}

/// Current time in the ISO-8601 millisecond format
/// (e.g. `2026-08-23T12:34:56.789Z`).
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_generates_key_fields() {
        let note = Note::from_input(NoteInput::default(), "2026-01-02T03:04:05.678Z");

        assert_eq!(note.pk, "note");
        assert_eq!(note.kind, "note");
        assert_eq!(note.date, "2026-01-02T03:04:05.678Z");
        assert_eq!(note.sk, note.date);
        assert_eq!(note.created, "2026-01-02T03:04:05.678Z");
        assert_eq!(note.note, "");
        assert_eq!(note.subject, "");
    }

    #[test]
    fn test_from_input_uses_caller_date() {
        let input = NoteInput {
            note: "hello".to_string(),
            subject: "greeting".to_string(),
            date: Some("2025-12-31T23:59:59.000Z".to_string()),
        };
        let note = Note::from_input(input, "2026-01-01T00:00:00.000Z");

        assert_eq!(note.date, "2025-12-31T23:59:59.000Z");
        assert_eq!(note.sk, "2025-12-31T23:59:59.000Z");
        assert_eq!(note.created, "2026-01-01T00:00:00.000Z");
        assert_eq!(note.note, "hello");
    }

    #[test]
    fn test_serde_uses_type_field() {
        let note = Note::from_input(NoteInput::default(), "2026-01-01T00:00:00.000Z");
        let json = serde_json::to_string(&note).unwrap();

        assert!(json.contains("\"type\":\"note\""));
        assert!(!json.contains("\"kind\""));

        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn test_input_accepts_empty_object() {
        let input: NoteInput = serde_json::from_str("{}").unwrap();
        assert_eq!(input.note, "");
        assert_eq!(input.subject, "");
        assert!(input.date.is_none());
    }

    #[test]
    fn test_input_rejects_non_object() {
        assert!(serde_json::from_str::<NoteInput>("[1, 2]").is_err());
        assert!(serde_json::from_str::<NoteInput>("\"just a string\"").is_err());
    }

    #[test]
    fn test_now_iso_format() {
        let now = now_iso();

        // 2026-08-23T12:34:56.789Z
        assert_eq!(now.len(), 24);
        assert!(now.ends_with('Z'));
        assert_eq!(&now[10..11], "T");
        assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
    }
}
