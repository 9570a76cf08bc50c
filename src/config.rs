//! Runtime configuration, persisted through the durable store.

use crate::api::models::ItemKind;
use crate::storage::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const CONFIG_KEY: &str = "flix.config";

pub const CLIENT_NAME: &str = "Flix Web";
pub const DEVICE_NAME: &str = "Browser";

fn default_server_url() -> String {
    option_env!("FLIX_SERVER_URL")
        .unwrap_or("http://localhost:8096")
        .trim_end_matches('/')
        .to_string()
}

fn default_feed_relay_url() -> String {
    option_env!("FLIX_FEED_RELAY_URL")
        .unwrap_or("/api/movies")
        .to_string()
}

fn default_feed_language() -> String {
    "pt-BR".to_string()
}

fn default_max_streaming_bitrate() -> u64 {
    140_000_000
}

fn new_device_id() -> String {
    format!("flix-web-{}", uuid::Uuid::new_v4())
}

/// Poster sizing sent with image requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSizing {
    pub fill_width: u32,
    pub fill_height: u32,
    pub quality: u8,
}

impl Default for ImageSizing {
    fn default() -> Self {
        Self {
            fill_width: 270,
            fill_height: 400,
            quality: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_feed_relay_url")]
    pub feed_relay_url: String,
    #[serde(default = "default_feed_language")]
    pub feed_language: String,
    #[serde(default = "new_device_id")]
    pub device_id: String,
    #[serde(default = "default_max_streaming_bitrate")]
    pub max_streaming_bitrate: u64,
    /// Explicit library folder for each catalog kind. Kinds without an entry
    /// are matched by the folder's collection type.
    #[serde(default)]
    pub libraries: HashMap<ItemKind, String>,
    #[serde(default)]
    pub image_sizing: ImageSizing,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            feed_relay_url: default_feed_relay_url(),
            feed_language: default_feed_language(),
            device_id: new_device_id(),
            max_streaming_bitrate: default_max_streaming_bitrate(),
            libraries: HashMap::new(),
            image_sizing: ImageSizing::default(),
        }
    }
}

impl AppConfig {
    pub fn with_server_url(mut self, url: impl AsRef<str>) -> Self {
        self.server_url = url.as_ref().trim().trim_end_matches('/').to_string();
        self
    }

    /// Loads the stored config, creating and persisting a fresh one (with a
    /// new device id) when nothing usable is stored.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Some(raw) = store.get(CONFIG_KEY) {
            match serde_json::from_str::<AppConfig>(&raw) {
                Ok(config) => return config,
                Err(err) => tracing::warn!("stored config unreadable, resetting: {err}"),
            }
        }

        let config = AppConfig::default();
        if let Err(err) = config.save(store) {
            tracing::warn!("failed to persist default config: {err}");
        }
        config
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let data = serde_json::to_string(self)?;
        store.set(CONFIG_KEY, &data)
    }

    pub fn folder_for(&self, kind: ItemKind) -> Option<&str> {
        self.libraries.get(&kind).map(String::as_str)
    }

    pub fn client_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn load_persists_generated_defaults() {
        let store = MemoryStore::default();
        let first = AppConfig::load(&store);
        let second = AppConfig::load(&store);

        assert!(first.device_id.starts_with("flix-web-"));
        assert_eq!(first.device_id, second.device_id);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let store = MemoryStore::default();
        store
            .set(CONFIG_KEY, r#"{"server_url":"http://media.lan:8096"}"#)
            .unwrap();

        let config = AppConfig::load(&store);
        assert_eq!(config.server_url, "http://media.lan:8096");
        assert_eq!(config.max_streaming_bitrate, 140_000_000);
        assert_eq!(config.image_sizing, ImageSizing::default());
    }

    #[test]
    fn server_url_is_normalized() {
        let config = AppConfig::default().with_server_url(" http://media.lan:8096/ ");
        assert_eq!(config.server_url, "http://media.lan:8096");
    }

    #[test]
    fn library_map_round_trips() {
        let store = MemoryStore::default();
        let mut config = AppConfig::default();
        config.libraries.insert(ItemKind::Movie, "f-movies".to_string());
        config.save(&store).unwrap();

        let loaded = AppConfig::load(&store);
        assert_eq!(loaded.folder_for(ItemKind::Movie), Some("f-movies"));
        assert_eq!(loaded.folder_for(ItemKind::Series), None);
    }
}
