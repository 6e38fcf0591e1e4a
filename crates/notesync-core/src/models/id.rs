//! Note id generation.

use crate::util::unix_timestamp_millis_now;

use super::NoteId;

/// Source of fresh note identifiers.
///
/// Generators are only asked for candidates; the controller rejects any
/// candidate already present in the list and asks again.
pub trait IdGenerator: Send {
    fn next_id(&mut self) -> NoteId;
}

/// Millisecond Unix timestamps rendered in decimal.
///
/// Successive ids are strictly increasing within one generator even when two
/// notes are created in the same millisecond.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: i64,
}

impl TimestampIds {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&mut self) -> NoteId {
        let now = unix_timestamp_millis_now();
        self.last = if now > self.last { now } else { self.last + 1 };
        NoteId::new(self.last.to_string())
    }
}

/// Deterministic `<prefix><n>` ids, starting at 1.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NoteId {
        let id = NoteId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
