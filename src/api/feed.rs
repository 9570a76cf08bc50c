//! Popular-movies feed fetched through the same-origin relay. Cosmetic only:
//! failures degrade to an empty list.

use crate::api::error::ApiError;
use crate::config::AppConfig;
use once_cell::sync::Lazy;
use serde::Deserialize;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

/// Seconds each backdrop stays on screen.
pub const BACKDROP_ROTATION_SECS: u64 = 8;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedPage {
    #[serde(default)]
    results: Vec<FeedMovie>,
}

/// Absolute image URL for a feed path fragment such as `/abc.jpg`.
pub fn backdrop_url(path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with('/') {
        Some(format!("{IMAGE_BASE_URL}{path}"))
    } else {
        Some(format!("{IMAGE_BASE_URL}/{path}"))
    }
}

fn resolve_relay_url(relay: &str, origin: Option<&str>) -> Result<String, ApiError> {
    if relay.starts_with("http://") || relay.starts_with("https://") {
        return Ok(relay.to_string());
    }
    match origin {
        Some(origin) => Ok(format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            relay.trim_start_matches('/')
        )),
        None => Err(ApiError::Network(format!(
            "relay url `{relay}` is relative and no origin is known"
        ))),
    }
}

#[cfg(target_arch = "wasm32")]
fn page_origin() -> Option<String> {
    web_sys::window()?.location().origin().ok()
}

#[cfg(not(target_arch = "wasm32"))]
fn page_origin() -> Option<String> {
    None
}

/// First page of the popularity-sorted discovery list, keeping only movies
/// with a backdrop.
pub async fn fetch_popular_movies(config: &AppConfig) -> Result<Vec<FeedMovie>, ApiError> {
    let url = resolve_relay_url(&config.feed_relay_url, page_origin().as_deref())?;

    let response = HTTP_CLIENT
        .get(&url)
        .query(&[
            ("endpoint", "discover/movie"),
            ("language", config.feed_language.as_str()),
            ("page", "1"),
            ("sort_by", "popularity.desc"),
            ("include_adult", "false"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: url,
            status: status.as_u16(),
        });
    }

    let page: FeedPage = response.json().await?;
    let movies: Vec<FeedMovie> = page
        .results
        .into_iter()
        .filter(|movie| {
            movie
                .backdrop_path
                .as_deref()
                .is_some_and(|path| !path.trim().is_empty())
        })
        .collect();
    tracing::debug!(count = movies.len(), "feed loaded");
    Ok(movies)
}

/// Index into a fixed list of backdrops, advanced on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackdropCycle {
    len: usize,
    index: usize,
}

impl BackdropCycle {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn current(&self) -> Option<usize> {
        (self.len > 0).then_some(self.index)
    }

    /// Moves to the next backdrop, wrapping at the end.
    pub fn advance(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.index = (self.index + 1) % self.len;
        Some(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn backdrop_url_composes_absolute_url() {
        assert_eq!(
            backdrop_url("/xyz.jpg").as_deref(),
            Some("https://image.tmdb.org/t/p/original/xyz.jpg")
        );
        assert_eq!(backdrop_url("  "), None);
    }

    #[test]
    fn cycle_wraps_and_handles_empty() {
        let mut cycle = BackdropCycle::new(3);
        assert_eq!(cycle.current(), Some(0));
        assert_eq!(cycle.advance(), Some(1));
        assert_eq!(cycle.advance(), Some(2));
        assert_eq!(cycle.advance(), Some(0));

        let mut empty = BackdropCycle::new(0);
        assert_eq!(empty.current(), None);
        assert_eq!(empty.advance(), None);
    }

    #[test]
    fn relative_relay_needs_origin() {
        assert_eq!(
            resolve_relay_url("/api/movies", Some("http://localhost:8080/")).unwrap(),
            "http://localhost:8080/api/movies"
        );
        assert!(resolve_relay_url("/api/movies", None).is_err());
    }

    #[tokio::test]
    async fn feed_keeps_movies_with_backdrops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/movies"))
            .and(query_param("endpoint", "discover/movie"))
            .and(query_param("language", "pt-BR"))
            .and(query_param("sort_by", "popularity.desc"))
            .and(query_param("include_adult", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1,
                "results": [
                    {"id": 1, "title": "Duna", "backdrop_path": "/duna.jpg"},
                    {"id": 2, "title": "Sem fundo", "backdrop_path": null},
                    {"id": 3, "title": "Vazio", "backdrop_path": ""}
                ]
            })))
            .mount(&server)
            .await;

        let config = AppConfig {
            feed_relay_url: format!("{}/api/movies", server.uri()),
            ..AppConfig::default()
        };
        let movies = fetch_popular_movies(&config).await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Duna");
    }

    #[tokio::test]
    async fn relay_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let config = AppConfig {
            feed_relay_url: format!("{}/api/movies", server.uri()),
            ..AppConfig::default()
        };

        assert!(fetch_popular_movies(&config).await.is_err());
    }
}
