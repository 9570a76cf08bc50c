//! Playback session: stream negotiation, the controller state machine and
//! the seams it drives (media surface, adaptive-streaming runtime).

use crate::api::{ApiError, ItemDetails, JellyfinClient, StreamNegotiation, SubtitleTrack};
use async_trait::async_trait;
use std::collections::HashMap;

mod controller;
mod url;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use controller::*;
pub use url::direct_file_url;

pub const VIDEO_ELEMENT_ID: &str = "flix-video";

/// Delay before a freshly attached caption track is forced to showing.
pub const SUBTITLE_REVEAL_DELAY_MS: u32 = 500;
/// Time-update sync stays suspended this long after a seek is released.
pub const SCRUB_SETTLE_MS: u32 = 500;
pub const SKIP_SECONDS: f64 = 10.0;
pub const VOLUME_STEP: u8 = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("could not prepare playback: {0}")]
    Negotiation(#[from] ApiError),
    #[error("playback session was torn down")]
    Superseded,
    #[error("no playable stream for this item")]
    NoPlayableSource,
}

/// The media surface (an HTML video element in the browser). Calls are
/// fire-and-forget; resulting state comes back as [`SurfaceEvent`]s.
pub trait MediaSurface {
    fn set_src(&self, url: &str);
    fn clear_src(&self);
    fn play(&self);
    fn pause(&self);
    fn seek(&self, seconds: f64);
    /// `volume` in `0.0..=1.0`.
    fn set_volume(&self, volume: f64);
    fn set_muted(&self, muted: bool);
    /// Whether the surface plays adaptive manifests without a runtime.
    fn can_play_manifest(&self) -> bool;
    fn clear_text_tracks(&self);
    fn attach_text_track(&self, url: &str, label: &str, language: &str);
    fn show_text_track(&self);
}

/// Factory for adaptive-streaming clients bound to one surface.
pub trait AdaptiveRuntime {
    fn is_supported(&self) -> bool;
    /// Creates a client whose events are reported tagged with `generation`.
    fn create(&self, generation: u64) -> Option<Box<dyn AdaptiveClient>>;
}

pub trait AdaptiveClient {
    /// Loads the manifest and binds the client to its surface.
    fn load(&mut self, url: &str);
    fn start_load(&mut self);
    fn recover_media_error(&mut self);
    fn destroy(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptiveErrorDetail {
    ManifestLoadTimeout,
    ManifestLoadError,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveErrorKind {
    Network,
    Media,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdaptiveEvent {
    ManifestParsed,
    Error {
        fatal: bool,
        kind: AdaptiveErrorKind,
        detail: AdaptiveErrorDetail,
    },
}

impl AdaptiveEvent {
    /// Classifies an hls.js error payload (`type`, `details`, `fatal`).
    pub fn from_hls_error(fatal: bool, error_type: &str, details: &str) -> Self {
        let kind = match error_type {
            "networkError" => AdaptiveErrorKind::Network,
            "mediaError" => AdaptiveErrorKind::Media,
            _ => AdaptiveErrorKind::Other,
        };
        let detail = match details {
            "manifestLoadTimeOut" => AdaptiveErrorDetail::ManifestLoadTimeout,
            "manifestLoadError" => AdaptiveErrorDetail::ManifestLoadError,
            other => AdaptiveErrorDetail::Other(other.to_string()),
        };
        Self::Error {
            fatal,
            kind,
            detail,
        }
    }
}

/// Player keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    TogglePlay,
    SkipBack,
    SkipForward,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    ToggleFullscreen,
    ToggleSubtitleMenu,
    ClosePanels,
}

impl Shortcut {
    /// Maps a `KeyboardEvent.code` value.
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "Space" => Some(Self::TogglePlay),
            "ArrowLeft" => Some(Self::SkipBack),
            "ArrowRight" => Some(Self::SkipForward),
            "ArrowUp" => Some(Self::VolumeUp),
            "ArrowDown" => Some(Self::VolumeDown),
            "KeyM" => Some(Self::ToggleMute),
            "KeyF" => Some(Self::ToggleFullscreen),
            "KeyS" => Some(Self::ToggleSubtitleMenu),
            "Escape" => Some(Self::ClosePanels),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    CanPlay,
    DurationChange(f64),
    TimeUpdate(f64),
    /// End of the buffered range containing the playhead.
    Progress(f64),
    Play,
    Pause,
    VolumeChange { volume: f64, muted: bool },
    Ended,
    Error(String),
}

/// Everything fetched before a stream is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPlayback {
    pub details: ItemDetails,
    pub negotiation: StreamNegotiation,
    pub subtitles: Vec<SubtitleTrack>,
    /// Caption resource per subtitle track id.
    pub caption_urls: HashMap<String, String>,
}

/// Server calls needed to prepare a playback session.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PlaybackSource {
    async fn item_details(&self, item_id: &str) -> Result<ItemDetails, ApiError>;
    async fn stream_negotiation(&self, item_id: &str) -> Result<StreamNegotiation, ApiError>;
    async fn subtitle_tracks(&self, item_id: &str) -> Result<Vec<SubtitleTrack>, ApiError>;
    fn caption_url(&self, item_id: &str, media_source_id: &str, track_id: &str) -> String;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PlaybackSource for JellyfinClient {
    async fn item_details(&self, item_id: &str) -> Result<ItemDetails, ApiError> {
        self.get_item_details(item_id).await
    }

    async fn stream_negotiation(&self, item_id: &str) -> Result<StreamNegotiation, ApiError> {
        self.negotiate_stream(item_id).await
    }

    async fn subtitle_tracks(&self, item_id: &str) -> Result<Vec<SubtitleTrack>, ApiError> {
        self.get_subtitle_streams(item_id).await
    }

    fn caption_url(&self, item_id: &str, media_source_id: &str, track_id: &str) -> String {
        self.subtitle_url(item_id, media_source_id, track_id)
    }
}

/// Fetches metadata, negotiation and subtitles concurrently. Metadata and
/// negotiation are required; a failed subtitle fetch leaves the list empty.
pub async fn negotiate<P>(source: &P, item_id: &str) -> Result<PreparedPlayback, PlaybackError>
where
    P: PlaybackSource + ?Sized,
{
    let (details, negotiation, subtitles) = futures_util::join!(
        source.item_details(item_id),
        source.stream_negotiation(item_id),
        source.subtitle_tracks(item_id)
    );

    let details = details?;
    let negotiation = negotiation?;
    if negotiation.candidate_urls.is_empty() {
        return Err(PlaybackError::NoPlayableSource);
    }

    let subtitles = subtitles.unwrap_or_else(|err| {
        tracing::warn!(item_id, "subtitle list unavailable: {err}");
        Vec::new()
    });
    let caption_urls = subtitles
        .iter()
        .map(|track| {
            (
                track.id.clone(),
                source.caption_url(item_id, &negotiation.media_source_id, &track.id),
            )
        })
        .collect();

    Ok(PreparedPlayback {
        details,
        negotiation,
        subtitles,
        caption_urls,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::api::Item;

    pub struct StubSource {
        pub details: Result<ItemDetails, ApiError>,
        pub negotiation: Result<StreamNegotiation, ApiError>,
        pub subtitles: Result<Vec<SubtitleTrack>, ApiError>,
    }

    pub fn details(item_id: &str) -> ItemDetails {
        ItemDetails {
            item: Item {
                id: item_id.to_string(),
                name: "Arrival".to_string(),
                ..Item::default()
            },
            primary_image_url: None,
            backdrop_image_url: None,
        }
    }

    pub fn manifest_negotiation(url: &str) -> StreamNegotiation {
        StreamNegotiation {
            supports_direct_stream: false,
            media_source_id: "src-1".to_string(),
            candidate_urls: vec![url.to_string(), direct_file_url(url)],
        }
    }

    pub fn track(id: &str, is_default: bool) -> SubtitleTrack {
        SubtitleTrack {
            id: id.to_string(),
            display_title: format!("Track {id}"),
            language: "por".to_string(),
            is_default,
        }
    }

    #[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
    #[cfg_attr(not(target_arch = "wasm32"), async_trait)]
    impl PlaybackSource for StubSource {
        async fn item_details(&self, _item_id: &str) -> Result<ItemDetails, ApiError> {
            self.details.clone()
        }

        async fn stream_negotiation(&self, _item_id: &str) -> Result<StreamNegotiation, ApiError> {
            self.negotiation.clone()
        }

        async fn subtitle_tracks(&self, _item_id: &str) -> Result<Vec<SubtitleTrack>, ApiError> {
            self.subtitles.clone()
        }

        fn caption_url(&self, item_id: &str, media_source_id: &str, track_id: &str) -> String {
            format!("http://media.lan/Videos/{item_id}/{media_source_id}/Subtitles/{track_id}/Stream.vtt")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn hls_errors_are_classified() {
        assert_eq!(
            AdaptiveEvent::from_hls_error(true, "networkError", "manifestLoadTimeOut"),
            AdaptiveEvent::Error {
                fatal: true,
                kind: AdaptiveErrorKind::Network,
                detail: AdaptiveErrorDetail::ManifestLoadTimeout,
            }
        );
        assert_eq!(
            AdaptiveEvent::from_hls_error(false, "mediaError", "bufferStalledError"),
            AdaptiveEvent::Error {
                fatal: false,
                kind: AdaptiveErrorKind::Media,
                detail: AdaptiveErrorDetail::Other("bufferStalledError".to_string()),
            }
        );
    }

    #[test]
    fn shortcut_keys() {
        assert_eq!(Shortcut::from_key_code("Space"), Some(Shortcut::TogglePlay));
        assert_eq!(Shortcut::from_key_code("ArrowUp"), Some(Shortcut::VolumeUp));
        assert_eq!(Shortcut::from_key_code("KeyS"), Some(Shortcut::ToggleSubtitleMenu));
        assert_eq!(Shortcut::from_key_code("KeyQ"), None);
    }

    #[tokio::test]
    async fn negotiate_collects_all_three_fetches() {
        let source = StubSource {
            details: Ok(details("movie-42")),
            negotiation: Ok(manifest_negotiation("http://h/Videos/movie-42/master.m3u8?k=v")),
            subtitles: Ok(vec![track("2", true)]),
        };

        let prepared = negotiate(&source, "movie-42").await.unwrap();

        assert_eq!(prepared.details.item.id, "movie-42");
        assert_eq!(prepared.subtitles.len(), 1);
        assert_eq!(
            prepared.caption_urls.get("2").map(String::as_str),
            Some("http://media.lan/Videos/movie-42/src-1/Subtitles/2/Stream.vtt")
        );
    }

    #[tokio::test]
    async fn subtitle_failure_is_not_fatal() {
        let source = StubSource {
            details: Ok(details("movie-42")),
            negotiation: Ok(manifest_negotiation("http://h/Videos/movie-42/master.m3u8")),
            subtitles: Err(ApiError::Network("reset".to_string())),
        };

        let prepared = negotiate(&source, "movie-42").await.unwrap();
        assert!(prepared.subtitles.is_empty());
    }

    #[tokio::test]
    async fn negotiation_failure_is_reported() {
        let source = StubSource {
            details: Ok(details("movie-42")),
            negotiation: Err(ApiError::Status {
                endpoint: "/Items/movie-42/PlaybackInfo".to_string(),
                status: 500,
            }),
            subtitles: Ok(Vec::new()),
        };

        let err = negotiate(&source, "movie-42").await.unwrap_err();
        assert!(matches!(err, PlaybackError::Negotiation(_)));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_unplayable() {
        let source = StubSource {
            details: Ok(details("movie-42")),
            negotiation: Ok(StreamNegotiation {
                supports_direct_stream: false,
                media_source_id: "movie-42".to_string(),
                candidate_urls: Vec::new(),
            }),
            subtitles: Ok(Vec::new()),
        };

        assert_eq!(
            negotiate(&source, "movie-42").await.unwrap_err(),
            PlaybackError::NoPlayableSource
        );
    }
}
