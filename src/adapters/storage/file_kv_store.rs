//! File-based Key-Value Store Adapter
//!
//! Keeps client session values in a single JSON document on disk, so a
//! restarted watcher picks up its dedup cache and last reload time.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::ports::{KeyValueError, KeyValueStore};

/// File-backed key-value store.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Create a store backed by the JSON file at `path`.
    ///
    /// The file and its parent directory are created on first write.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileKeyValueStore::new("./data/watcher-state.json");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, KeyValueError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| KeyValueError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(KeyValueError::Io(e.to_string())),
        }
    }

    async fn save(&self, values: &BTreeMap<String, String>) -> Result<(), KeyValueError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| KeyValueError::Io(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| KeyValueError::Serialization(e.to_string()))?;

        fs::write(&self.path, json)
            .await
            .map_err(|e| KeyValueError::Io(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeyValueError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.save(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn values_survive_a_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileKeyValueStore::new(&path);
        store.set("lastReloadTime", "1700000000000").await.unwrap();

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(
            reopened.get("lastReloadTime").await.unwrap().as_deref(),
            Some("1700000000000")
        );
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_deletes_only_that_key() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("state.json"));
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();

        store.remove("a").await.unwrap();
        store.remove("never-set").await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileKeyValueStore::new(&path);
        assert!(matches!(
            store.get("a").await,
            Err(KeyValueError::Serialization(_))
        ));
    }
}
