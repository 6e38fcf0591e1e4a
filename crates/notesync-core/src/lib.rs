//! notesync-core - Core library for notesync
//!
//! This crate holds the note model, the local snapshot cache, the remote
//! document store clients, the identity provider and the sync controller that
//! keeps them consistent under a local-first, remote-best-effort policy.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod snapshot;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Note, NoteId, NoteList};
pub use state::SyncState;
pub use sync::{NotesController, NotesView};
