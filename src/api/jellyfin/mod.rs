//! Media-server gateway. Every request carries the client identification
//! header; authenticated requests also carry the token read from the
//! credential store at send time.

use crate::api::error::ApiError;
use crate::config::{AppConfig, CLIENT_NAME, DEVICE_NAME};
use crate::storage::CredentialStore;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;

mod auth;
mod library_browsing;
mod playback;

pub use auth::SignedIn;
pub use library_browsing::{ItemQuery, SortOrder};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

pub const TOKEN_HEADER: &str = "X-MediaBrowser-Token";
pub const AUTHORIZATION_HEADER: &str = "X-Emby-Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Primary,
    Backdrop,
}

impl ImageType {
    fn as_path(self) -> &'static str {
        match self {
            Self::Primary => "Primary",
            Self::Backdrop => "Backdrop",
        }
    }
}

/// Token and user id of the stored session.
struct SessionKeys {
    token: String,
    user_id: String,
}

#[derive(Clone)]
pub struct JellyfinClient {
    config: AppConfig,
    credentials: CredentialStore,
}

impl JellyfinClient {
    pub fn new(config: AppConfig, credentials: CredentialStore) -> Self {
        Self {
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn server_url(&self) -> &str {
        self.config.server_url.trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.server_url(), path.trim_start_matches('/'))
    }

    fn authorization_value(&self, token: Option<&str>) -> String {
        let mut value = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            CLIENT_NAME,
            DEVICE_NAME,
            self.config.device_id,
            self.config.client_version()
        );
        if let Some(token) = token {
            value.push_str(&format!(", Token=\"{token}\""));
        }
        value
    }

    fn session_keys(&self) -> Result<SessionKeys, ApiError> {
        let token = self.credentials.token().ok_or(ApiError::NotAuthenticated)?;
        let user_id = self
            .credentials
            .user()
            .map(|user| user.id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(ApiError::NotAuthenticated)?;
        Ok(SessionKeys { token, user_id })
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut builder = HTTP_CLIENT
            .request(method, self.endpoint(path))
            .header(AUTHORIZATION_HEADER, self.authorization_value(token));
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let token = self.credentials.token().ok_or(ApiError::NotAuthenticated)?;
        tracing::debug!(path, params = query.len(), "GET");

        let response = self
            .request(reqwest::Method::GET, path, Some(&token))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(ApiError::from)
    }

    /// Image URL for an item, or `None` for an empty id so callers render
    /// their placeholder.
    pub fn image_url(&self, item_id: &str, image_type: ImageType) -> Option<String> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            tracing::debug!("no image for empty item id");
            return None;
        }

        let sizing = self.config.image_sizing;
        let mut url = format!(
            "{}/Items/{}/Images/{}?fillHeight={}&fillWidth={}&quality={}",
            self.server_url(),
            urlencoding::encode(item_id),
            image_type.as_path(),
            sizing.fill_height,
            sizing.fill_width,
            sizing.quality
        );
        if let Some(token) = self.credentials.token() {
            url.push_str(&format!("&api_key={}", urlencoding::encode(&token)));
        }
        Some(url)
    }
}
