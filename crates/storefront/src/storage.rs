//! Durable key-value storage for client state.
//!
//! The storefront persists exactly three flat string keys across restarts:
//! the active cart id, the selected region id and the customer auth token.
//! There is no schema versioning; the stores treat a missing key the same
//! as a fresh install.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

/// Keys used in durable storage.
pub mod keys {
    /// Key for the active cart id.
    pub const CART_ID: &str = "cart_id";

    /// Key for the selected region id.
    pub const REGION_ID: &str = "region_id";

    /// Key for the customer auth token.
    pub const AUTH_TOKEN: &str = "auth_token";
}

/// Errors from the durable key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not contain a valid string map.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Async get/set/remove by string key.
///
/// Implementations must tolerate concurrent callers; the stores only ever
/// write a key from one place (cart creation, region selection, login) but
/// reads can happen from anywhere.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read a value, `None` if the key has never been set.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any existing one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one JSON object of string keys to string values.
///
/// Every write persists the whole map. With three keys and writes only on
/// cart creation, region selection and login, that is plenty.
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStorage {
    /// Open the store at `path`, loading existing entries if the file is
    /// already there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for JsonFileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_file() -> PathBuf {
        std::env::temp_dir().join(format!("mj-storage-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get(keys::CART_ID).await.unwrap().is_none());

        storage.set(keys::CART_ID, "cart_01").await.unwrap();
        assert_eq!(
            storage.get(keys::CART_ID).await.unwrap().as_deref(),
            Some("cart_01")
        );

        storage.remove(keys::CART_ID).await.unwrap();
        assert!(storage.get(keys::CART_ID).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let storage = MemoryStorage::new();
        storage.remove("never_set").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let path = scratch_file();

        {
            let storage = JsonFileStorage::open(&path).await.unwrap();
            storage.set(keys::REGION_ID, "reg_01").await.unwrap();
            storage.set(keys::AUTH_TOKEN, "tok_abc").await.unwrap();
            storage.remove(keys::AUTH_TOKEN).await.unwrap();
        }

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        assert_eq!(
            reopened.get(keys::REGION_ID).await.unwrap().as_deref(),
            Some("reg_01")
        );
        assert!(reopened.get(keys::AUTH_TOKEN).await.unwrap().is_none());

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_open_missing_file_starts_empty() {
        let storage = JsonFileStorage::open(scratch_file()).await.unwrap();
        assert!(storage.get(keys::CART_ID).await.unwrap().is_none());
    }
}
