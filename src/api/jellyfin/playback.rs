use super::JellyfinClient;
use crate::api::error::ApiError;
use crate::api::models::{Item, PlaybackInfo, StreamNegotiation, SubtitleTrack};

impl JellyfinClient {
    pub async fn get_playback_info(&self, item_id: &str) -> Result<PlaybackInfo, ApiError> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(ApiError::InvalidItemId);
        }
        let keys = self.session_keys()?;
        let path = format!("/Items/{}/PlaybackInfo", urlencoding::encode(item_id));
        self.get_json(
            &path,
            &[
                ("userId", keys.user_id),
                ("startTimeTicks", "0".to_string()),
                ("autoOpenLiveStream", "true".to_string()),
                ("mediaSourceId", item_id.to_string()),
                ("deviceId", self.config.device_id.clone()),
                (
                    "maxStreamingBitrate",
                    self.config.max_streaming_bitrate.to_string(),
                ),
            ],
        )
        .await
    }

    /// Subtitle streams of an item in server order.
    pub async fn get_subtitle_streams(&self, item_id: &str) -> Result<Vec<SubtitleTrack>, ApiError> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(ApiError::InvalidItemId);
        }
        let keys = self.session_keys()?;
        let path = format!("/Items/{}", urlencoding::encode(item_id));
        let item: Item = self.get_json(&path, &[("userId", keys.user_id)]).await?;

        Ok(item
            .media_streams
            .iter()
            .filter(|stream| stream.stream_type == "Subtitle")
            .map(SubtitleTrack::from_stream)
            .collect())
    }

    fn stream_query(&self, media_source_id: &str, token: &str) -> String {
        format!(
            "static=true&MediaSourceId={}&DeviceId={}&api_key={}",
            urlencoding::encode(media_source_id),
            urlencoding::encode(&self.config.device_id),
            urlencoding::encode(token)
        )
    }

    /// Candidate stream URLs for an item. Direct-capable sources prefer the
    /// static file; everything else, including items without any source,
    /// starts on the adaptive manifest.
    pub async fn negotiate_stream(&self, item_id: &str) -> Result<StreamNegotiation, ApiError> {
        let info = self.get_playback_info(item_id).await?;
        let token = self.credentials.token().ok_or(ApiError::NotAuthenticated)?;

        let source = info.media_sources.first();
        let supports_direct_stream = source.is_some_and(|source| source.supports_direct_stream);
        let media_source_id = source
            .map(|source| source.id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| item_id.to_string());

        let base = format!("{}/Videos/{}", self.server_url(), urlencoding::encode(item_id));
        let query = self.stream_query(&media_source_id, &token);
        let direct = format!("{base}/stream.mp4?{query}");
        let manifest = format!("{base}/master.m3u8?{query}");

        let candidate_urls = if supports_direct_stream {
            vec![direct, manifest]
        } else {
            vec![manifest, direct]
        };

        tracing::debug!(
            item_id,
            supports_direct_stream,
            sources = info.media_sources.len(),
            "stream negotiated"
        );

        Ok(StreamNegotiation {
            supports_direct_stream,
            media_source_id,
            candidate_urls,
        })
    }

    /// WebVTT caption resource for one subtitle stream.
    pub fn subtitle_url(&self, item_id: &str, media_source_id: &str, track_id: &str) -> String {
        let mut url = format!(
            "{}/Videos/{}/{}/Subtitles/{}/Stream.vtt",
            self.server_url(),
            urlencoding::encode(item_id),
            urlencoding::encode(media_source_id),
            urlencoding::encode(track_id)
        );
        if let Some(token) = self.credentials.token() {
            url.push_str(&format!("?api_key={}", urlencoding::encode(&token)));
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::api::models::StreamingMode;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_playback_info(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/Items/movie-42/PlaybackInfo"))
            .and(query_param("userId", "user-1"))
            .and(query_param("mediaSourceId", "movie-42"))
            .and(query_param("maxStreamingBitrate", "140000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn transcode_only_source_starts_on_manifest() {
        let server = MockServer::start().await;
        mount_playback_info(
            &server,
            serde_json::json!({
                "MediaSources": [{"Id": "src-1", "SupportsDirectStream": false}]
            }),
        )
        .await;

        let client = signed_in_client(&server.uri());
        let negotiation = client.negotiate_stream("movie-42").await.unwrap();

        assert_eq!(negotiation.initial_mode(), StreamingMode::AdaptiveManifest);
        assert_eq!(negotiation.media_source_id, "src-1");
        let first = negotiation.initial_url().unwrap();
        assert!(first.starts_with(&format!("{}/Videos/movie-42/master.m3u8?", server.uri())));
        assert!(first.contains("static=true"));
        assert!(first.ends_with("api_key=tok-abc"));
        assert!(negotiation.candidate_urls[1].contains("/stream.mp4?"));
    }

    #[tokio::test]
    async fn direct_capable_source_starts_on_file() {
        let server = MockServer::start().await;
        mount_playback_info(
            &server,
            serde_json::json!({
                "MediaSources": [{"Id": "src-1", "SupportsDirectStream": true}]
            }),
        )
        .await;

        let client = signed_in_client(&server.uri());
        let negotiation = client.negotiate_stream("movie-42").await.unwrap();

        assert_eq!(negotiation.initial_mode(), StreamingMode::DirectFile);
        assert!(negotiation.initial_url().unwrap().contains("/stream.mp4?"));
    }

    #[tokio::test]
    async fn missing_sources_start_on_manifest() {
        let server = MockServer::start().await;
        mount_playback_info(&server, serde_json::json!({"MediaSources": []})).await;

        let client = signed_in_client(&server.uri());
        let negotiation = client.negotiate_stream("movie-42").await.unwrap();

        assert_eq!(negotiation.initial_mode(), StreamingMode::AdaptiveManifest);
        assert_eq!(negotiation.media_source_id, "movie-42");
    }

    #[tokio::test]
    async fn negotiation_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Items/movie-42/PlaybackInfo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let err = client.negotiate_stream("movie-42").await.unwrap_err();

        assert_eq!(
            err,
            ApiError::Status {
                endpoint: "/Items/movie-42/PlaybackInfo".to_string(),
                status: 500
            }
        );
    }

    #[tokio::test]
    async fn subtitle_streams_are_filtered_and_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Items/movie-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": "movie-42",
                "MediaStreams": [
                    {"Index": 0, "Type": "Video", "Codec": "h264"},
                    {"Index": 1, "Type": "Audio", "Language": "eng"},
                    {"Index": 2, "Type": "Subtitle", "Language": "por", "DisplayTitle": "Português", "IsDefault": true},
                    {"Index": 3, "Type": "Subtitle"}
                ]
            })))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let tracks = client.get_subtitle_streams("movie-42").await.unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "2");
        assert_eq!(tracks[0].display_title, "Português");
        assert!(tracks[0].is_default);
        assert_eq!(tracks[1].language, "und");
    }

    #[test]
    fn subtitle_url_points_at_webvtt_stream() {
        let client = signed_in_client("http://media.lan:8096");
        assert_eq!(
            client.subtitle_url("movie-42", "src-1", "2"),
            "http://media.lan:8096/Videos/movie-42/src-1/Subtitles/2/Stream.vtt?api_key=tok-abc"
        );
    }
}
