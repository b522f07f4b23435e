//! Credential storage
//!
//! Secrets are stored as a flat string map. The SDK uses three well-known
//! keys: the access token, the refresh token, and the cached user record.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;

use crate::error::{ClientError, ClientResult};

/// Key under which the access token is stored
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key under which the refresh token is stored
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key under which the last fetched user record is cached as JSON
pub const CACHED_USER_KEY: &str = "cached_user";

/// All keys cleared when a session ends
pub const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, CACHED_USER_KEY];

/// Async store for named string secrets
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a secret, `None` if absent
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;

    /// Write a secret
    async fn set(&self, key: &str, value: &str) -> ClientResult<()>;

    /// Remove the given keys; missing keys are not an error
    async fn remove_all(&self, keys: &[&str]) -> ClientResult<()>;
}

/// Credential store persisting to a JSON file
///
/// The whole map is rewritten on every mutation. A mutex serializes every
/// file access: overlapping writers cannot drop each other's entries, and
/// readers never observe a half-written file.
pub struct FileCredentialStore {
    path: PathBuf,
    io_lock: tokio::sync::Mutex<()>,
}

impl FileCredentialStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Default credentials file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("seva")
            .join("credentials.json")
    }

    async fn read_map(&self) -> ClientResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ClientError::credentials(format!("Failed to read credentials: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| ClientError::credentials(format!("Invalid credentials file: {}", e)))
    }

    async fn write_map(&self, map: &HashMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ClientError::credentials(format!("Failed to create credentials dir: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(map)
            .map_err(|e| ClientError::credentials(format!("Failed to encode credentials: {}", e)))?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| ClientError::credentials(format!("Failed to write credentials: {}", e)))
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let _guard = self.io_lock.lock().await;
        let map = self.read_map().await?;
        Ok(map.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let _guard = self.io_lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map).await
    }

    async fn remove_all(&self, keys: &[&str]) -> ClientResult<()> {
        let _guard = self.io_lock.lock().await;
        let mut map = self.read_map().await?;
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map).await
    }
}

/// In-memory credential store for tests and embedding
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ClientError::credentials("Credential store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientError::credentials("Credential store poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_all(&self, keys: &[&str]) -> ClientResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ClientError::credentials("Credential store poisoned"))?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "token-a").await.unwrap();
        store.set(REFRESH_TOKEN_KEY, "token-r").await.unwrap();

        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).await.unwrap(),
            Some("token-a".to_string())
        );
        assert_eq!(
            store.get(REFRESH_TOKEN_KEY).await.unwrap(),
            Some("token-r".to_string())
        );
    }

    #[tokio::test]
    async fn test_file_store_remove_all_with_absent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.set(ACCESS_TOKEN_KEY, "token-a").await.unwrap();
        store.remove_all(&SESSION_KEYS).await.unwrap();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(store.get(CACHED_USER_KEY).await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_reads_never_observe_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileCredentialStore::new(
            dir.path().join("credentials.json"),
        ));
        // Large values so a torn read of the file could not still parse.
        store
            .set(ACCESS_TOKEN_KEY, &"seed".repeat(500))
            .await
            .unwrap();

        let writer = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move {
                for i in 0..50 {
                    let value = format!("token-{}", i).repeat(500);
                    store.set(ACCESS_TOKEN_KEY, &value).await.unwrap();
                }
            })
        };
        let reader = {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move {
                for _ in 0..50 {
                    let value = store.get(ACCESS_TOKEN_KEY).await.unwrap();
                    assert!(value.is_some());
                }
            })
        };

        writer.await.unwrap();
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("credentials.json");
        let store = FileCredentialStore::new(&nested);

        store.set(CACHED_USER_KEY, "{}").await.unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_memory_store() {
        tokio_test::block_on(async {
            let store = MemoryCredentialStore::new();
            store.set("k", "v").await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

            store.remove_all(&["k", "missing"]).await.unwrap();
            assert_eq!(store.get("k").await.unwrap(), None);
        });
    }
}
