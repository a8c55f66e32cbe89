//! Durable key-value storage for session state.
//!
//! The session store only ever needs string keys mapped to string values, so
//! the trait is deliberately small.  [`FileStore`] keeps the map as a JSON
//! object on disk and replaces it atomically on every write; [`MemoryStore`]
//! keeps it in memory.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Key holding the JSON-serialized user identity.
pub const USER_KEY: &str = "auth_user";

/// A string-to-string store that outlives the process.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read `key`, returning `None` when it is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`.  Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// A JSON object file on disk.
///
/// Reads see the file as it is on disk; a missing file is an empty store.
/// Writes go to a sibling temporary file that is renamed over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                Error::serialization(
                    format!("failed to parse {}", self.path.display()),
                    Some(Box::new(err)),
                )
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(Error::io(
                format!("failed to read {}", self.path.display()),
                err,
            )),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| Error::io(format!("failed to create {}", parent.display()), err))?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|err| Error::io(format!("failed to write {}", tmp.display()), err))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|err| Error::io(format!("failed to replace {}", self.path.display()), err))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn memory_store_basics() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await);
        store.set(TOKEN_KEY, "abc").await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("abc"));
        store.remove(TOKEN_KEY).await.unwrap();
        assert_ok!(store.remove(TOKEN_KEY).await);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        assert_eq!(store.get(USER_KEY).await.unwrap(), None);
        assert_ok!(store.remove(USER_KEY).await);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        {
            let store = FileStore::new(&path);
            store.set(TOKEN_KEY, "abc").await.unwrap();
            store.set(USER_KEY, r#"{"id":1}"#).await.unwrap();
        }
        let store = FileStore::new(&path);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap().as_deref(), Some("abc"));
        assert_eq!(
            store.get(USER_KEY).await.unwrap().as_deref(),
            Some(r#"{"id":1}"#)
        );

        store.remove(TOKEN_KEY).await.unwrap();
        let store = FileStore::new(&path);
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert!(store.get(USER_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileStore::new(&path);
        assert_err!(store.get(TOKEN_KEY).await);
    }
}
