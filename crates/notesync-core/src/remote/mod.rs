//! Remote per-user document store.
//!
//! Each note lives in its own document keyed by the note id, holding the text
//! and the owning user id. The sync controller only ever queries by owner,
//! overwrites a whole document, or deletes one.

mod firestore;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Note, NoteId};

pub use firestore::{FirestoreRemoteStore, DEFAULT_FIRESTORE_URL, DEFAULT_NOTES_COLLECTION};
pub use memory::MemoryRemoteStore;

/// Document body stored remotely for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNoteDocument {
    pub text: String,
    pub owner_id: String,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    #[error("Remote access requires a signed-in user")]
    Unauthenticated,
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[async_trait]
pub trait RemoteNoteStore: Send + Sync {
    /// All notes whose document is owned by `owner_id`.
    async fn query_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<Note>>;
    /// Create or fully replace the document for `id`.
    async fn upsert(&self, id: &NoteId, document: &RemoteNoteDocument) -> RemoteResult<()>;
    /// Remove the document for `id`. Deleting a missing document succeeds.
    async fn delete(&self, id: &NoteId) -> RemoteResult<()>;
}
