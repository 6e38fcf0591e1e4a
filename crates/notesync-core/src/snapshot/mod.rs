//! Local snapshot cache: a named slot holding the full serialized note list.

mod file;
mod memory;

use async_trait::async_trait;

use crate::models::{Note, NoteList};
use crate::{Error, Result};

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

/// Slot the controller uses unless configured otherwise.
pub const DEFAULT_SNAPSHOT_SLOT: &str = "NOTES";

/// Durable key-value slots on the device.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Raw serialized content of `name`, or `None` when never written.
    async fn read_slot(&self, name: &str) -> Result<Option<String>>;
    /// Replace the content of `name`. Must not return before the data is
    /// durable from the caller's point of view.
    async fn write_slot(&self, name: &str, serialized: &str) -> Result<()>;
}

/// Serialize a list as a compact JSON array of `{"id","text"}` objects.
pub fn encode_snapshot(notes: &NoteList) -> Result<String> {
    Ok(serde_json::to_string(notes.as_slice())?)
}

/// Parse a serialized snapshot back into a list.
pub fn decode_snapshot(serialized: &str) -> Result<NoteList> {
    let notes: Vec<Note> = serde_json::from_str(serialized)?;
    Ok(NoteList::from_notes(notes))
}

/// Slot names map to file names, so separators and empties are rejected.
pub fn validate_slot_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "Snapshot slot name must not be empty".to_string(),
        ));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::InvalidInput(format!(
            "Snapshot slot name '{name}' must not contain path separators"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn encode_matches_compact_json_array() {
        let list = NoteList::from_notes(vec![Note::new("t2", "b"), Note::new("t1", "a")]);
        assert_eq!(
            encode_snapshot(&list).unwrap(),
            r#"[{"id":"t2","text":"b"},{"id":"t1","text":"a"}]"#
        );
        assert_eq!(encode_snapshot(&NoteList::new()).unwrap(), "[]");
    }

    #[test]
    fn reencoding_decoded_snapshot_is_stable() {
        let list = NoteList::from_notes(vec![
            Note::new("1700000000001", "line one\nline \"two\""),
            Note::new("1700000000000", "ünïcødé ✓"),
            Note::new("x", ""),
        ]);
        let encoded = encode_snapshot(&list).unwrap();
        let reencoded = encode_snapshot(&decode_snapshot(&encoded).unwrap()).unwrap();
        assert_eq!(reencoded, encoded);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_snapshot("{not json"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn decode_drops_duplicate_ids() {
        let list = decode_snapshot(r#"[{"id":"a","text":"1"},{"id":"a","text":"2"}]"#).unwrap();
        assert_eq!(list.as_slice(), &[Note::new("a", "1")]);
    }

    #[test]
    fn slot_names_reject_separators() {
        assert!(validate_slot_name("NOTES").is_ok());
        assert!(validate_slot_name("").is_err());
        assert!(validate_slot_name("../etc").is_err());
        assert!(validate_slot_name("a\\b").is_err());
    }
}
