use super::{
    direct_file_url, AdaptiveClient, AdaptiveErrorDetail, AdaptiveErrorKind, AdaptiveEvent,
    AdaptiveRuntime, MediaSurface, PlaybackError, PreparedPlayback, SurfaceEvent, SKIP_SECONDS,
};
use crate::api::{StreamingMode, SubtitleTrack};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Failed,
}

/// Snapshot the player chrome renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub item_id: String,
    pub title: String,
    pub stream_url: Option<String>,
    pub streaming_mode: Option<StreamingMode>,
    pub subtitles: Vec<SubtitleTrack>,
    pub subtitle_track_id: Option<String>,
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    /// 0 to 100.
    pub volume: u8,
    pub is_muted: bool,
    pub current_time: f64,
    pub duration: f64,
    pub buffered: f64,
    pub has_fatal_error: bool,
    pub error_message: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            item_id: String::new(),
            title: String::new(),
            stream_url: None,
            streaming_mode: None,
            subtitles: Vec::new(),
            subtitle_track_id: None,
            phase: PlaybackPhase::Idle,
            is_playing: false,
            volume: 100,
            is_muted: false,
            current_time: 0.0,
            duration: 0.0,
            buffered: 0.0,
            has_fatal_error: false,
            error_message: None,
        }
    }
}

impl PlaybackState {
    pub fn progress_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn buffered_fraction(&self) -> f64 {
        if self.duration > 0.0 {
            (self.buffered / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Identifies one seek; only the latest seek's settle timer ends scrubbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrubToken(u64);

/// Identifies one subtitle attachment for the delayed reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrubState {
    Idle,
    Dragging,
    Settling(u64),
}

/// Drives one playback session over a media surface and an optional
/// adaptive-streaming runtime. Browser events are fed back in through
/// [`handle_surface_event`](Self::handle_surface_event) and
/// [`handle_adaptive_event`](Self::handle_adaptive_event).
pub struct PlaybackController<S: MediaSurface, R: AdaptiveRuntime> {
    surface: S,
    runtime: R,
    client: Option<Box<dyn AdaptiveClient>>,
    generation: u64,
    torn_down: bool,
    fallback_used: bool,
    media_recovery_attempted: bool,
    scrub: ScrubState,
    scrub_counter: u64,
    reveal_counter: u64,
    caption_urls: HashMap<String, String>,
    state: PlaybackState,
}

impl<S: MediaSurface, R: AdaptiveRuntime> PlaybackController<S, R> {
    pub fn new(surface: S, runtime: R) -> Self {
        Self {
            surface,
            runtime,
            client: None,
            generation: 0,
            torn_down: false,
            fallback_used: false,
            media_recovery_attempted: false,
            scrub: ScrubState::Idle,
            scrub_counter: 0,
            reveal_counter: 0,
            caption_urls: HashMap::new(),
            state: PlaybackState::default(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Generation of the current stream attachment.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_adaptive_client(&self) -> bool {
        self.client.is_some()
    }

    /// Starts the session from a finished negotiation: the initial stream is
    /// attached and the default subtitle, if any, selected. Returns the
    /// reveal token of that subtitle.
    pub fn initialize(
        &mut self,
        prepared: PreparedPlayback,
    ) -> Result<Option<RevealToken>, PlaybackError> {
        if self.torn_down {
            return Err(PlaybackError::Superseded);
        }

        let mode = prepared.negotiation.initial_mode();
        let url = prepared
            .negotiation
            .initial_url()
            .ok_or(PlaybackError::NoPlayableSource)?
            .to_string();

        self.state.item_id = prepared.details.item.id.clone();
        self.state.title = prepared.details.item.name.clone();
        self.state.subtitles = prepared.subtitles;
        self.caption_urls = prepared.caption_urls;
        self.state.phase = PlaybackPhase::Loading;

        tracing::info!(item_id = %self.state.item_id, ?mode, "starting playback");
        self.attach_stream(&url, mode);

        let default_track = self
            .state
            .subtitles
            .iter()
            .find(|track| track.is_default)
            .map(|track| track.id.clone());
        Ok(default_track.and_then(|id| self.select_subtitle(Some(&id))))
    }

    /// Attaches `url` in `mode`, releasing any previous adaptive client first.
    pub fn attach_stream(&mut self, url: &str, mode: StreamingMode) {
        if self.torn_down || self.state.phase == PlaybackPhase::Failed {
            return;
        }

        self.release_client();
        self.generation += 1;
        self.state.stream_url = Some(url.to_string());
        self.state.streaming_mode = Some(mode);

        match mode {
            StreamingMode::AdaptiveManifest if self.runtime.is_supported() => {
                match self.runtime.create(self.generation) {
                    Some(mut client) => {
                        client.load(url);
                        self.client = Some(client);
                    }
                    None => self.fail("adaptive streaming client could not be created"),
                }
            }
            StreamingMode::AdaptiveManifest if self.surface.can_play_manifest() => {
                tracing::debug!("playing manifest natively");
                self.surface.set_src(url);
                self.surface.play();
            }
            StreamingMode::AdaptiveManifest => {
                tracing::warn!("manifest playback unavailable, switching to direct file");
                self.fall_back_to_direct_file();
            }
            StreamingMode::DirectFile => {
                self.surface.set_src(url);
                self.surface.play();
            }
        }
    }

    pub fn handle_adaptive_event(&mut self, generation: u64, event: AdaptiveEvent) {
        if self.torn_down || generation != self.generation {
            tracing::debug!(generation, current = self.generation, "stale adaptive event");
            return;
        }
        if self.state.phase == PlaybackPhase::Failed {
            return;
        }

        match event {
            AdaptiveEvent::ManifestParsed => {
                if self.state.phase == PlaybackPhase::Loading {
                    self.state.phase = PlaybackPhase::Ready;
                }
                self.surface.play();
            }
            AdaptiveEvent::Error { fatal: false, kind, detail } => {
                tracing::debug!(?kind, ?detail, "non-fatal streaming error");
            }
            AdaptiveEvent::Error {
                fatal: true,
                kind: AdaptiveErrorKind::Network,
                detail: AdaptiveErrorDetail::ManifestLoadTimeout | AdaptiveErrorDetail::ManifestLoadError,
            } => {
                tracing::warn!("manifest could not be loaded");
                self.fall_back_to_direct_file();
            }
            AdaptiveEvent::Error {
                fatal: true,
                kind: AdaptiveErrorKind::Network,
                detail,
            } => {
                tracing::warn!(?detail, "network error, restarting load");
                if let Some(client) = self.client.as_mut() {
                    client.start_load();
                }
            }
            AdaptiveEvent::Error {
                fatal: true,
                kind: AdaptiveErrorKind::Media,
                detail,
            } => {
                if self.media_recovery_attempted {
                    self.fail(&format!("media error after recovery: {detail:?}"));
                } else {
                    tracing::warn!(?detail, "media error, attempting recovery");
                    self.media_recovery_attempted = true;
                    if let Some(client) = self.client.as_mut() {
                        client.recover_media_error();
                    }
                }
            }
            AdaptiveEvent::Error {
                fatal: true,
                kind: AdaptiveErrorKind::Other,
                detail,
            } => {
                self.fail(&format!("streaming error: {detail:?}"));
            }
        }
    }

    pub fn handle_surface_event(&mut self, event: SurfaceEvent) {
        if self.torn_down || self.state.phase == PlaybackPhase::Failed {
            return;
        }

        match event {
            SurfaceEvent::CanPlay => {
                if self.state.phase == PlaybackPhase::Loading {
                    self.state.phase = PlaybackPhase::Ready;
                }
            }
            SurfaceEvent::DurationChange(duration) => {
                if duration.is_finite() && duration >= 0.0 {
                    self.state.duration = duration;
                }
            }
            SurfaceEvent::TimeUpdate(time) => {
                if self.scrub == ScrubState::Idle && time.is_finite() {
                    self.state.current_time = time;
                }
            }
            SurfaceEvent::Progress(buffered) => {
                if buffered.is_finite() {
                    self.state.buffered = buffered;
                }
            }
            SurfaceEvent::Play => {
                self.state.is_playing = true;
                self.state.phase = PlaybackPhase::Playing;
            }
            SurfaceEvent::Pause => {
                self.state.is_playing = false;
                if self.state.phase != PlaybackPhase::Ended {
                    self.state.phase = PlaybackPhase::Paused;
                }
            }
            SurfaceEvent::VolumeChange { volume, muted } => {
                self.state.volume = (volume.clamp(0.0, 1.0) * 100.0).round() as u8;
                self.state.is_muted = muted;
            }
            SurfaceEvent::Ended => {
                self.state.is_playing = false;
                self.state.phase = PlaybackPhase::Ended;
            }
            SurfaceEvent::Error(message) if self.state.phase == PlaybackPhase::Ended => {
                tracing::debug!("surface error after playback ended: {message}");
            }
            SurfaceEvent::Error(message) => {
                let native_manifest = self.client.is_none()
                    && self.state.streaming_mode == Some(StreamingMode::AdaptiveManifest);
                if native_manifest {
                    tracing::warn!("native manifest playback failed: {message}");
                    self.fall_back_to_direct_file();
                } else if self.client.is_none() {
                    self.fail(&message);
                } else {
                    // The adaptive client reports its own errors.
                    tracing::debug!("surface error under adaptive client: {message}");
                }
            }
        }
    }

    /// Suspends time-update sync while the user drags the progress bar.
    pub fn begin_scrub(&mut self) {
        self.scrub = ScrubState::Dragging;
    }

    /// Preview position while dragging.
    pub fn update_scrub(&mut self, seconds: f64) {
        if self.scrub == ScrubState::Dragging {
            self.state.current_time = self.clamp_position(seconds);
        }
    }

    /// Seeks to the released position. Sync stays suspended until
    /// [`settle_scrub`](Self::settle_scrub) is called with the returned token.
    pub fn commit_scrub(&mut self, seconds: f64) -> ScrubToken {
        let position = self.clamp_position(seconds);
        self.state.current_time = position;
        if !self.torn_down {
            self.surface.seek(position);
        }
        self.scrub_counter += 1;
        self.scrub = ScrubState::Settling(self.scrub_counter);
        ScrubToken(self.scrub_counter)
    }

    pub fn settle_scrub(&mut self, token: ScrubToken) {
        if self.scrub == ScrubState::Settling(token.0) {
            self.scrub = ScrubState::Idle;
        }
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub != ScrubState::Idle
    }

    pub fn seek(&mut self, seconds: f64) -> ScrubToken {
        self.begin_scrub();
        self.commit_scrub(seconds)
    }

    pub fn skip(&mut self, delta_seconds: f64) -> ScrubToken {
        self.seek(self.state.current_time + delta_seconds)
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.state.duration > 0.0 {
            seconds.min(self.state.duration)
        } else {
            seconds
        }
    }

    /// Sets volume (0 to 100). Zero mutes; anything above unmutes.
    pub fn set_volume(&mut self, volume: u8) {
        if self.torn_down {
            return;
        }
        let volume = volume.min(100);
        self.surface.set_volume(f64::from(volume) / 100.0);
        if volume == 0 {
            self.surface.set_muted(true);
        } else if self.state.is_muted {
            self.surface.set_muted(false);
        }
    }

    pub fn change_volume(&mut self, delta: i16) {
        let volume = (i16::from(self.state.volume) + delta).clamp(0, 100) as u8;
        self.set_volume(volume);
    }

    pub fn toggle_mute(&mut self) {
        if !self.torn_down {
            self.surface.set_muted(!self.state.is_muted);
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.torn_down {
            return;
        }
        match self.state.phase {
            PlaybackPhase::Failed | PlaybackPhase::Idle => {}
            PlaybackPhase::Ended => {
                self.seek(0.0);
                self.surface.play();
            }
            _ if self.state.is_playing => self.surface.pause(),
            _ => self.surface.play(),
        }
    }

    /// Replaces the caption track. All existing tracks are detached before
    /// the new one is attached; the returned token is passed to
    /// [`reveal_subtitle`](Self::reveal_subtitle) after a short delay.
    pub fn select_subtitle(&mut self, track_id: Option<&str>) -> Option<RevealToken> {
        if self.torn_down {
            return None;
        }

        self.reveal_counter += 1;
        self.surface.clear_text_tracks();

        let Some(track_id) = track_id else {
            self.state.subtitle_track_id = None;
            return None;
        };
        let Some(track) = self
            .state
            .subtitles
            .iter()
            .find(|track| track.id == track_id)
            .cloned()
        else {
            tracing::warn!(track_id, "unknown subtitle track");
            self.state.subtitle_track_id = None;
            return None;
        };
        let Some(url) = self.caption_urls.get(&track.id) else {
            tracing::warn!(track_id, "no caption resource for track");
            self.state.subtitle_track_id = None;
            return None;
        };

        self.surface
            .attach_text_track(url, &track.display_title, &track.language);
        self.state.subtitle_track_id = Some(track.id);
        Some(RevealToken(self.reveal_counter))
    }

    pub fn reveal_subtitle(&mut self, token: RevealToken) {
        if !self.torn_down && token.0 == self.reveal_counter {
            self.surface.show_text_track();
        }
    }

    /// Releases the adaptive client and the surface. Safe to call more than
    /// once and before initialization.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.generation += 1;
        self.release_client();
        self.surface.clear_text_tracks();
        self.surface.pause();
        self.surface.clear_src();
        self.state.is_playing = false;
        tracing::debug!(item_id = %self.state.item_id, "playback torn down");
    }

    fn release_client(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.destroy();
        }
    }

    fn fall_back_to_direct_file(&mut self) {
        if self.fallback_used {
            self.fail("direct-file fallback also failed");
            return;
        }
        let Some(current) = self.state.stream_url.clone() else {
            self.fail("no stream to fall back from");
            return;
        };
        self.fallback_used = true;
        let direct = direct_file_url(&current);
        tracing::info!(url = %direct, "falling back to direct file");
        self.attach_stream(&direct, StreamingMode::DirectFile);
    }

    fn fail(&mut self, reason: &str) {
        tracing::error!(item_id = %self.state.item_id, "playback failed: {reason}");
        self.release_client();
        self.state.phase = PlaybackPhase::Failed;
        self.state.has_fatal_error = true;
        self.state.is_playing = false;
        self.state.error_message = Some(reason.to_string());
    }
}
