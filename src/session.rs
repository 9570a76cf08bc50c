//! Tab-lifetime session state: who is signed in, and the gateway client
//! bound to the persisted credentials.

use crate::api::{ApiError, JellyfinClient};
use crate::config::AppConfig;
use crate::storage::{CredentialStore, KeyValueStore, StorageError, UserProfile};
use dioxus::prelude::*;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn KeyValueStore>,
    credentials: CredentialStore,
    client: JellyfinClient,
    user: Option<UserProfile>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let config = AppConfig::load(store.as_ref());
        let credentials = CredentialStore::new(store.clone());
        let client = JellyfinClient::new(config, credentials.clone());
        Self {
            store,
            credentials,
            client,
            user: None,
        }
    }

    pub fn client(&self) -> &JellyfinClient {
        &self.client
    }

    pub fn config(&self) -> &AppConfig {
        self.client.config()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.credentials.token().is_some()
    }

    /// Re-verifies stored credentials against the server. Anything short of
    /// a confirmed user clears them.
    pub async fn restore(&mut self) -> Option<UserProfile> {
        if self.credentials.token().is_none() {
            self.user = None;
            return None;
        }

        match self.client.get_user_info().await {
            Ok(user) => {
                tracing::info!(user = %user.name, "session restored");
                self.user = Some(user.clone());
                Some(user)
            }
            Err(err) => {
                tracing::warn!("stored session rejected: {err}");
                self.logout();
                None
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        let signed_in = self.client.authenticate_by_name(username, password).await?;
        self.credentials
            .save(&signed_in.token, &signed_in.user)
            .map_err(|err| ApiError::AuthenticationFailed(err.to_string()))?;
        tracing::info!(user = %signed_in.user.name, "signed in");
        self.user = Some(signed_in.user.clone());
        Ok(signed_in.user)
    }

    pub fn logout(&mut self) {
        self.credentials.clear();
        if self.user.take().is_some() {
            tracing::info!("signed out");
        }
    }

    /// Points the session at another server. Existing credentials belong to
    /// the old server and are dropped.
    pub fn set_server_url(&mut self, url: &str) -> Result<(), StorageError> {
        let config = self.client.config().clone().with_server_url(url);
        if config.server_url == self.client.config().server_url {
            return Ok(());
        }
        config.save(self.store.as_ref())?;
        self.logout();
        self.client = JellyfinClient::new(config, self.credentials.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Restoring,
    SignedOut,
    SignedIn,
}

/// Reactive handle shared through context.
#[derive(Clone, Copy)]
pub struct Session {
    pub state: Signal<SessionContext>,
    pub status: Signal<SessionStatus>,
}

impl Session {
    pub fn client(&self) -> JellyfinClient {
        self.state.read().client().clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.state.read().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        (self.status)() == SessionStatus::SignedIn
    }

    pub async fn login(mut self, username: String, password: String) -> Result<(), ApiError> {
        let mut context = self.state.peek().clone();
        let result = context.login(&username, &password).await;
        let signed_in = context.is_authenticated();
        self.state.set(context);
        self.status.set(if signed_in {
            SessionStatus::SignedIn
        } else {
            SessionStatus::SignedOut
        });
        result.map(|_| ())
    }

    pub fn logout(mut self) {
        self.state.write().logout();
        self.status.set(SessionStatus::SignedOut);
    }

    pub fn set_server_url(mut self, url: &str) -> Result<(), StorageError> {
        let result = self.state.write().set_server_url(url);
        if !self.state.peek().is_authenticated() {
            self.status.set(SessionStatus::SignedOut);
        }
        result
    }
}

/// Creates the session for this tab and starts verifying stored credentials.
pub fn use_session_provider(
    open_store: impl FnOnce() -> Arc<dyn KeyValueStore>,
) -> Session {
    let state = use_signal(move || SessionContext::new(open_store()));
    let status = use_signal(|| SessionStatus::Restoring);
    let session = use_context_provider(|| Session { state, status });

    use_hook(move || {
        let mut session = session;
        spawn(async move {
            let mut context = session.state.peek().clone();
            let restored = context.restore().await;
            session.state.set(context);
            session.status.set(if restored.is_some() {
                SessionStatus::SignedIn
            } else {
                SessionStatus::SignedOut
            });
        });
    });

    session
}

pub fn use_session() -> Session {
    use_context::<Session>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ItemQuery;
    use crate::storage::MemoryStore;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context_for(server: &MockServer) -> SessionContext {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        AppConfig::default()
            .with_server_url(server.uri())
            .save(store.as_ref())
            .unwrap();
        SessionContext::new(store)
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessToken": "tok-live",
                "User": {"Id": "user-1", "Name": "ana"}
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn login_persists_and_authorizes_catalog_requests() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/Users/user-1/Items"))
            .and(header("X-MediaBrowser-Token", "tok-live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Items": [{"Id": "movie-42", "Type": "Movie"}]
            })))
            .mount(&server)
            .await;

        let mut session = context_for(&server);
        assert!(!session.is_authenticated());

        let user = session.login("ana", "secret").await.unwrap();
        assert_eq!(user.id, "user-1");
        assert!(session.is_authenticated());
        assert_eq!(session.credentials.token().as_deref(), Some("tok-live"));
        assert_eq!(session.credentials.user(), Some(user));

        let items = session
            .client()
            .get_items(ItemQuery::continue_watching())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn logout_prevents_stale_token_use() {
        let server = MockServer::start().await;
        mount_login(&server).await;

        let mut session = context_for(&server);
        session.login("ana", "secret").await.unwrap();
        let client = session.client().clone();
        let before = server.received_requests().await.unwrap_or_default().len();

        session.logout();

        assert!(!session.is_authenticated());
        assert!(session.credentials.token().is_none());
        let err = client
            .get_items(ItemQuery::continue_watching())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotAuthenticated);
        assert_eq!(
            server.received_requests().await.unwrap_or_default().len(),
            before
        );
    }

    #[tokio::test]
    async fn restore_clears_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/Me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut session = context_for(&server);
        session
            .credentials
            .save(
                "tok-old",
                &UserProfile {
                    id: "user-1".to_string(),
                    name: "ana".to_string(),
                    email: None,
                    image_url: None,
                },
            )
            .unwrap();

        assert!(session.restore().await.is_none());
        assert!(session.credentials.token().is_none());
        assert!(session.credentials.user().is_none());
    }

    #[tokio::test]
    async fn restore_without_token_skips_network() {
        let server = MockServer::start().await;
        let mut session = context_for(&server);

        assert!(session.restore().await.is_none());
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn failed_login_leaves_session_signed_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let mut session = context_for(&server);
        let err = session.login("ana", "nope").await.unwrap_err();

        assert!(matches!(err, ApiError::AuthenticationFailed(_)));
        assert!(!session.is_authenticated());
        assert!(session.credentials.token().is_none());
    }

    #[test]
    fn changing_server_drops_credentials() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        let mut session = SessionContext::new(store.clone());
        session
            .credentials
            .save(
                "tok",
                &UserProfile {
                    id: "u".to_string(),
                    name: "n".to_string(),
                    email: None,
                    image_url: None,
                },
            )
            .unwrap();

        session.set_server_url("http://other.lan:8096/").unwrap();

        assert_eq!(session.config().server_url, "http://other.lan:8096");
        assert!(session.credentials.token().is_none());
        assert_eq!(
            AppConfig::load(store.as_ref()).server_url,
            "http://other.lan:8096"
        );
    }
}
