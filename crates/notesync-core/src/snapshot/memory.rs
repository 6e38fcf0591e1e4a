//! In-memory snapshot slots for tests and embedders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::SnapshotStore;
use crate::{Error, Result};

/// In-process slots with write-failure injection.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slots: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write_slot` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed or inspect a slot without going through the trait.
    pub fn insert(&self, name: &str, serialized: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(name.to_string(), serialized.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.slots.lock().ok()?.get(name).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn read_slot(&self, name: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|error| Error::Snapshot(error.to_string()))?;
        Ok(slots.get(name).cloned())
    }

    async fn write_slot(&self, name: &str, serialized: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Snapshot("storage is full".to_string()));
        }
        let mut slots = self
            .slots
            .lock()
            .map_err(|error| Error::Snapshot(error.to_string()))?;
        slots.insert(name.to_string(), serialized.to_string());
        Ok(())
    }
}
