//! In-process remote store with failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{RemoteError, RemoteNoteDocument, RemoteNoteStore, RemoteResult};
use crate::models::{Note, NoteId};

/// In-process document collection with failure injection.
///
/// Documents are kept ordered by id, which is also the order queries return
/// them in.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: Mutex<BTreeMap<NoteId, RemoteNoteDocument>>,
    offline: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
}

impl MemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reads keep working but upserts and deletes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Sleep before applying each write.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        if let Ok(mut guard) = self.write_delay.lock() {
            *guard = delay;
        }
    }

    /// Seed a document directly.
    pub fn insert(&self, id: impl Into<NoteId>, text: &str, owner_id: &str) {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(
                id.into(),
                RemoteNoteDocument {
                    text: text.to_string(),
                    owner_id: owner_id.to_string(),
                },
            );
        }
    }

    pub fn document(&self, id: &NoteId) -> Option<RemoteNoteDocument> {
        self.documents.lock().ok()?.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map_or(0, |documents| documents.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> RemoteResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Unavailable("network unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    async fn before_write(&self) -> RemoteResult<()> {
        let delay = self.write_delay.lock().ok().and_then(|guard| *guard);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_online()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Api("permission denied".to_string()));
        }
        Ok(())
    }

    fn lock_error() -> RemoteError {
        RemoteError::Unavailable("document map poisoned".to_string())
    }
}

#[async_trait]
impl RemoteNoteStore for MemoryRemoteStore {
    async fn query_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<Note>> {
        self.check_online()?;
        let documents = self.documents.lock().map_err(|_| Self::lock_error())?;
        Ok(documents
            .iter()
            .filter(|(_, document)| document.owner_id == owner_id)
            .map(|(id, document)| Note::new(id.clone(), document.text.clone()))
            .collect())
    }

    async fn upsert(&self, id: &NoteId, document: &RemoteNoteDocument) -> RemoteResult<()> {
        self.before_write().await?;
        let mut documents = self.documents.lock().map_err(|_| Self::lock_error())?;
        documents.insert(id.clone(), document.clone());
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> RemoteResult<()> {
        self.before_write().await?;
        let mut documents = self.documents.lock().map_err(|_| Self::lock_error())?;
        documents.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_filters_by_owner() {
        let store = MemoryRemoteStore::new();
        store.insert("1", "mine", "alice");
        store.insert("2", "theirs", "bob");
        let notes = store.query_by_owner("alice").await.unwrap();
        assert_eq!(notes, vec![Note::new("1", "mine")]);
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = MemoryRemoteStore::new();
        store.set_offline(true);
        assert!(store.query_by_owner("alice").await.is_err());
        assert!(store.delete(&NoteId::new("1")).await.is_err());
    }

    #[tokio::test]
    async fn failing_writes_keep_reads_working() {
        let store = MemoryRemoteStore::new();
        store.insert("1", "mine", "alice");
        store.set_fail_writes(true);
        let document = RemoteNoteDocument {
            text: "new".to_string(),
            owner_id: "alice".to_string(),
        };
        assert!(store.upsert(&NoteId::new("1"), &document).await.is_err());
        assert_eq!(store.query_by_owner("alice").await.unwrap().len(), 1);
        assert_eq!(store.document(&NoteId::new("1")).unwrap().text, "mine");
    }
}
