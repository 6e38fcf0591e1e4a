//! Snapshot slots stored as JSON files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{validate_slot_name, SnapshotStore};
use crate::{Error, Result};

/// One JSON file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, name: &str) -> Result<PathBuf> {
        validate_slot_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read_slot(&self, name: &str) -> Result<Option<String>> {
        let path = self.slot_path(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(Error::Snapshot(format!(
                "Failed to read {}: {error}",
                path.display()
            ))),
        }
    }

    async fn write_slot(&self, name: &str, serialized: &str) -> Result<()> {
        let path = self.slot_path(name)?;
        let temp_path = self.dir.join(format!(".{name}.json.tmp"));

        tokio::fs::create_dir_all(&self.dir).await.map_err(|error| {
            Error::Snapshot(format!(
                "Failed to create snapshot directory {}: {error}",
                self.dir.display()
            ))
        })?;
        tokio::fs::write(&temp_path, serialized)
            .await
            .map_err(|error| {
                Error::Snapshot(format!("Failed to write {}: {error}", temp_path.display()))
            })?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|error| {
                Error::Snapshot(format!(
                    "Failed to move snapshot into place at {}: {error}",
                    path.display()
                ))
            })?;

        tracing::debug!("Wrote snapshot slot {} ({} bytes)", name, serialized.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_slot_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert_eq!(store.read_slot("NOTES").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_then_read_returns_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested"));
        store
            .write_slot("NOTES", r#"[{"id":"t1","text":"hello"}]"#)
            .await
            .unwrap();
        assert_eq!(
            store.read_slot("NOTES").await.unwrap().as_deref(),
            Some(r#"[{"id":"t1","text":"hello"}]"#)
        );
        assert!(!dir.path().join("nested").join(".NOTES.json.tmp").exists());
    }

    #[tokio::test]
    async fn write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store.write_slot("NOTES", "[1]").await.unwrap();
        store.write_slot("NOTES", "[]").await.unwrap();
        assert_eq!(store.read_slot("NOTES").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn invalid_slot_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        assert!(matches!(
            store.write_slot("../escape", "[]").await,
            Err(Error::InvalidInput(_))
        ));
    }
}
