use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Catalog item kind as reported in the server's `Type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemKind {
    Movie,
    Series,
    Season,
    Episode,
    CollectionFolder,
    #[default]
    #[serde(other)]
    Other,
}

impl ItemKind {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "Series",
            Self::Season => "Season",
            Self::Episode => "Episode",
            Self::CollectionFolder => "CollectionFolder",
            Self::Other => "",
        }
    }

    /// Library `CollectionType` that holds items of this kind.
    pub fn collection_type(self) -> Option<&'static str> {
        match self {
            Self::Movie => Some("movies"),
            Self::Series | Self::Season | Self::Episode => Some("tvshows"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct UserItemData {
    #[serde(default)]
    pub playback_position_ticks: i64,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub played: bool,
}

/// Video, audio or subtitle stream descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStreamInfo {
    #[serde(default)]
    pub index: i32,
    #[serde(rename = "Type", default)]
    pub stream_type: String,
    #[serde(default)]
    pub codec: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "Type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub premiere_date: Option<String>,
    #[serde(default)]
    pub production_year: Option<i32>,
    #[serde(default)]
    pub run_time_ticks: Option<i64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub community_rating: Option<f32>,
    #[serde(default)]
    pub official_rating: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub media_streams: Vec<MediaStreamInfo>,
    #[serde(default)]
    pub image_tags: HashMap<String, String>,
    #[serde(default)]
    pub backdrop_image_tags: Vec<String>,
    #[serde(default)]
    pub collection_type: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub season_id: Option<String>,
    #[serde(default)]
    pub index_number: Option<i32>,
    #[serde(default)]
    pub user_data: Option<UserItemData>,
    #[serde(default)]
    pub server_id: Option<String>,
}

impl Item {
    /// Production year, falling back to the premiere date.
    pub fn year(&self) -> Option<i32> {
        self.production_year.or_else(|| {
            let date = self.premiere_date.as_deref()?;
            chrono::DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|parsed| chrono::Datelike::year(&parsed))
        })
    }

    pub fn runtime_label(&self) -> Option<String> {
        self.run_time_ticks
            .filter(|ticks| *ticks > 0)
            .map(format_runtime)
    }

    pub fn has_backdrop(&self) -> bool {
        !self.backdrop_image_tags.is_empty()
    }

    /// Fraction of the item already watched, for resume bars.
    pub fn resume_fraction(&self) -> Option<f64> {
        let position = self.user_data.as_ref()?.playback_position_ticks;
        let total = self.run_time_ticks?;
        if position <= 0 || total <= 0 {
            return None;
        }
        Some((position as f64 / total as f64).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub total_record_count: u32,
}

/// Item metadata plus the image URLs the views render.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDetails {
    pub item: Item,
    pub primary_image_url: Option<String>,
    pub backdrop_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub primary_image_tag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user: Option<ServerUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AuthenticateByName<'a> {
    pub username: &'a str,
    pub pw: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSourceInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub supports_direct_play: bool,
    #[serde(default)]
    pub supports_direct_stream: bool,
    #[serde(default)]
    pub supports_transcoding: bool,
    #[serde(default)]
    pub media_streams: Vec<MediaStreamInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackInfo {
    #[serde(default)]
    pub media_sources: Vec<MediaSourceInfo>,
    #[serde(default)]
    pub play_session_id: Option<String>,
}

/// Subtitle stream offered for an item. `id` is the stream index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub id: String,
    pub display_title: String,
    pub language: String,
    pub is_default: bool,
}

impl SubtitleTrack {
    pub fn from_stream(stream: &MediaStreamInfo) -> Self {
        let display_title = stream
            .display_title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{} {}",
                    stream.language.as_deref().unwrap_or("Unknown"),
                    stream.title.as_deref().unwrap_or("")
                )
                .trim()
                .to_string()
            });
        Self {
            id: stream.index.to_string(),
            display_title,
            language: stream
                .language
                .clone()
                .unwrap_or_else(|| "und".to_string()),
            is_default: stream.is_default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamingMode {
    AdaptiveManifest,
    DirectFile,
}

impl StreamingMode {
    /// Mode implied by a stream URL's filename.
    pub fn for_url(url: &str) -> Self {
        let path = url.split('?').next().unwrap_or(url);
        if path.ends_with(".m3u8") {
            Self::AdaptiveManifest
        } else {
            Self::DirectFile
        }
    }
}

/// Outcome of one playback negotiation. `candidate_urls` is ordered by
/// preference; the first entry is attached initially.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamNegotiation {
    pub supports_direct_stream: bool,
    pub media_source_id: String,
    pub candidate_urls: Vec<String>,
}

impl StreamNegotiation {
    pub fn initial_mode(&self) -> StreamingMode {
        if self.supports_direct_stream {
            StreamingMode::DirectFile
        } else {
            StreamingMode::AdaptiveManifest
        }
    }

    pub fn initial_url(&self) -> Option<&str> {
        self.candidate_urls.first().map(String::as_str)
    }
}

/// `1h 52m` style label for a runtime in server ticks.
pub fn format_runtime(ticks: i64) -> String {
    let total_minutes = ticks / TICKS_PER_SECOND / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Player clock label: `m:ss`, or `h:mm:ss` past the hour.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
