#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No session token is stored; the request was not sent.
    #[error("not signed in")]
    NotAuthenticated,
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid item id")]
    InvalidItemId,
}

impl ApiError {
    /// Whether the server rejected the session (token expired or revoked).
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated
                | Self::AuthenticationFailed(_)
                | Self::Status {
                    status: 401 | 403,
                    ..
                }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
