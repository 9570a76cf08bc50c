//! Durable client-side key/value storage and the credential store built on it.
//!
//! On wasm the entries live in `localStorage`; on native targets they are kept
//! in a small JSON file under the platform data directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};

const TOKEN_KEY: &str = "jellyfin_token";
const USER_KEY: &str = "jellyfin_user";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("failed to write entry `{key}`: {reason}")]
    Write { key: String, reason: String },
    #[error("failed to encode entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String-keyed durable storage. All access happens on the UI thread.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// `localStorage` backed store.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserStore;

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{e:?}"),
            })
    }

    fn remove(&self, key: &str) {
        LocalStorage::delete(key);
    }
}

/// JSON file backed store for desktop builds.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: std::path::PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    pub fn open(path: std::path::PathBuf) -> Self {
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str::<HashMap<String, String>>(&data).ok())
            .unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Opens `state.json` in the per-user data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        let dir = dirs::data_dir()
            .map(|dir| dir.join("flix"))
            .ok_or_else(|| StorageError::Unavailable("no data directory".to_string()))?;
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(Self::open(dir.join("state.json")))
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let data = serde_json::to_string(entries)?;
        std::fs::write(&self.path, data).map_err(|e| StorageError::Write {
            key: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_some() {
            if let Err(err) = self.flush(&entries) {
                tracing::warn!("failed to persist removal of {key}: {err}");
            }
        }
    }
}

/// Volatile store, used when no durable backend is available and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }
}

/// The platform's durable store.
pub fn default_store() -> Arc<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(BrowserStore)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        match FileStore::open_default() {
            Ok(store) => Arc::new(store),
            Err(err) => {
                tracing::warn!("falling back to in-memory storage: {err}");
                Arc::new(MemoryStore::default())
            }
        }
    }
}

/// Profile of the signed-in user as persisted next to the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Persists the session token and the user profile. Every API call reads the
/// token from here at request time, so clearing it takes effect immediately.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn save(&self, token: &str, user: &UserProfile) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set(TOKEN_KEY, token)?;
        self.backend.set(USER_KEY, &user_json)
    }

    pub fn token(&self) -> Option<String> {
        self.backend
            .get(TOKEN_KEY)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.backend.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!("discarding unreadable stored user: {err}");
                None
            }
        }
    }

    pub fn clear(&self) {
        self.backend.remove(TOKEN_KEY);
        self.backend.remove(USER_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: "u-1".to_string(),
            name: "ana".to_string(),
            email: None,
            image_url: None,
        }
    }

    #[test]
    fn credentials_round_trip_through_backend() {
        let store = CredentialStore::new(Arc::new(MemoryStore::default()));
        store.save("tok-123", &profile()).unwrap();

        assert_eq!(store.token().as_deref(), Some("tok-123"));
        assert_eq!(store.user(), Some(profile()));
    }

    #[test]
    fn clear_removes_token_and_user() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        let store = CredentialStore::new(backend.clone());
        store.save("tok-123", &profile()).unwrap();

        store.clear();

        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert!(backend.get("jellyfin_token").is_none());
    }

    #[test]
    fn blank_token_reads_as_missing() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        backend.set("jellyfin_token", "   ").unwrap();
        let store = CredentialStore::new(backend);

        assert!(store.token().is_none());
    }

    #[test]
    fn corrupt_user_entry_is_ignored() {
        let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        backend.set("jellyfin_user", "{not json").unwrap();
        let store = CredentialStore::new(backend);

        assert!(store.user().is_none());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_store_persists_across_instances() {
        let path = std::env::temp_dir().join(format!("flix-store-{}.json", uuid::Uuid::new_v4()));
        {
            let store = FileStore::open(path.clone());
            store.set("a", "1").unwrap();
        }
        let reopened = FileStore::open(path.clone());
        assert_eq!(reopened.get("a").as_deref(), Some("1"));
        reopened.remove("a");
        assert!(FileStore::open(path.clone()).get("a").is_none());
        let _ = std::fs::remove_file(path);
    }
}
