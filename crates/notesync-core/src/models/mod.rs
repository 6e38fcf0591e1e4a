//! Data models for notesync

mod id;
mod note;
mod note_list;

pub use id::{IdGenerator, SequentialIds, TimestampIds};
pub use note::{Note, NoteId};
pub use note_list::NoteList;
