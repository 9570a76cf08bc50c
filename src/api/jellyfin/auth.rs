use super::JellyfinClient;
use crate::api::error::ApiError;
use crate::api::models::{AuthenticateByName, AuthenticationResult, ServerUser};
use crate::storage::UserProfile;

/// Token and profile returned by a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub token: String,
    pub user: UserProfile,
}

impl JellyfinClient {
    fn profile_from(&self, user: ServerUser) -> UserProfile {
        let image_url = user.primary_image_tag.as_deref().map(|tag| {
            format!(
                "{}/Users/{}/Images/Primary?tag={}",
                self.server_url(),
                urlencoding::encode(&user.id),
                urlencoding::encode(tag)
            )
        });
        UserProfile {
            id: user.id,
            name: user.name,
            email: None,
            image_url,
        }
    }

    /// Exchanges a username and password for a session token. The caller
    /// decides whether to persist the result.
    pub async fn authenticate_by_name(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SignedIn, ApiError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ApiError::AuthenticationFailed(
                "username is required".to_string(),
            ));
        }

        tracing::info!(username, "signing in");
        let response = self
            .request(reqwest::Method::POST, "/Users/AuthenticateByName", None)
            .json(&AuthenticateByName {
                username,
                pw: password,
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ApiError::AuthenticationFailed(
                "invalid username or password".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: "/Users/AuthenticateByName".to_string(),
                status: status.as_u16(),
            });
        }

        let result: AuthenticationResult = response.json().await?;
        let token = result
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ApiError::AuthenticationFailed("server returned no token".to_string()))?;
        let user = result
            .user
            .ok_or_else(|| ApiError::AuthenticationFailed("server returned no user".to_string()))?;

        Ok(SignedIn {
            token,
            user: self.profile_from(user),
        })
    }

    /// Current user for the stored token. Used to verify a restored session.
    pub async fn get_user_info(&self) -> Result<UserProfile, ApiError> {
        let user: ServerUser = self.get_json("/Users/Me", &[]).await?;
        Ok(self.profile_from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn authenticate_returns_token_and_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .and(header_exists("X-Emby-Authorization"))
            .and(body_json(serde_json::json!({"Username": "ana", "Pw": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessToken": "tok-new",
                "User": {"Id": "user-9", "Name": "ana", "PrimaryImageTag": "img1"}
            })))
            .mount(&server)
            .await;

        let client = signed_out_client(&server.uri());
        let signed_in = client.authenticate_by_name(" ana ", "secret").await.unwrap();

        assert_eq!(signed_in.token, "tok-new");
        assert_eq!(signed_in.user.id, "user-9");
        assert_eq!(
            signed_in.user.image_url.as_deref(),
            Some(format!("{}/Users/user-9/Images/Primary?tag=img1", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn rejected_credentials_are_an_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Users/AuthenticateByName"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = signed_out_client(&server.uri());
        let err = client.authenticate_by_name("ana", "wrong").await.unwrap_err();

        assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn blank_username_is_rejected_locally() {
        let server = MockServer::start().await;
        let client = signed_out_client(&server.uri());

        let err = client.authenticate_by_name("  ", "pw").await.unwrap_err();

        assert!(matches!(err, ApiError::AuthenticationFailed(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn user_info_sends_stored_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/Me"))
            .and(header("X-MediaBrowser-Token", "tok-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": "user-1", "Name": "ana"
            })))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let user = client.get_user_info().await.unwrap();

        assert_eq!(user.name, "ana");
        assert!(user.image_url.is_none());
    }

    #[tokio::test]
    async fn expired_token_reports_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/Me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let err = client.get_user_info().await.unwrap_err();

        assert!(err.is_unauthorized());
    }
}
