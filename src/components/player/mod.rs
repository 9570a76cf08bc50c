//! Watch-page chrome: the overlay controls drawn over the video element and
//! the small state machine deciding which of them are visible.

use crate::api::format_time;
use crate::components::Icon;
use crate::playback::{PlaybackPhase, PlaybackState, Shortcut, SKIP_SECONDS, VOLUME_STEP};
use dioxus::prelude::*;

mod controls;

use controls::{
    FullscreenButton, InfoPanel, PlayPauseButton, ProgressBar, SkipButton, SubtitleMenu,
    VolumeControl,
};

/// Mouse inactivity before the controls fade while playing.
pub const CONTROLS_HIDE_MS: u32 = 3000;
pub const PLAYER_CONTAINER_ID: &str = "flix-player";

/// Requests the chrome sends to the player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    TogglePlay,
    BeginScrub,
    UpdateScrub(f64),
    CommitScrub(f64),
    Skip(f64),
    SetVolume(u8),
    ChangeVolume(i16),
    ToggleMute,
    SelectSubtitle(Option<String>),
    ToggleFullscreen,
}

/// Visibility of the overlay and its panels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeState {
    pub controls_visible: bool,
    pub info_open: bool,
    pub subtitle_menu_open: bool,
    activity: u64,
}

impl Default for ChromeState {
    fn default() -> Self {
        Self {
            controls_visible: true,
            info_open: false,
            subtitle_menu_open: false,
            activity: 0,
        }
    }
}

impl ChromeState {
    pub fn any_panel_open(&self) -> bool {
        self.info_open || self.subtitle_menu_open
    }

    /// Shows the controls and returns the activity mark a later hide check
    /// must still match.
    pub fn note_activity(&mut self) -> u64 {
        self.activity = self.activity.wrapping_add(1);
        self.controls_visible = true;
        self.activity
    }

    pub fn hide_if_idle(&mut self, activity: u64, is_playing: bool) {
        if activity == self.activity && is_playing && !self.any_panel_open() {
            self.controls_visible = false;
        }
    }

    pub fn toggle_info(&mut self) {
        self.info_open = !self.info_open;
        if self.info_open {
            self.subtitle_menu_open = false;
        }
    }

    pub fn toggle_subtitle_menu(&mut self) {
        self.subtitle_menu_open = !self.subtitle_menu_open;
        if self.subtitle_menu_open {
            self.info_open = false;
        }
    }

    pub fn close_panels(&mut self) {
        self.info_open = false;
        self.subtitle_menu_open = false;
    }

    /// Applies a keyboard shortcut. Panel shortcuts are handled here; the rest
    /// become player commands.
    pub fn apply_shortcut(&mut self, shortcut: Shortcut) -> Option<PlayerCommand> {
        match shortcut {
            Shortcut::TogglePlay => Some(PlayerCommand::TogglePlay),
            Shortcut::SkipBack => Some(PlayerCommand::Skip(-SKIP_SECONDS)),
            Shortcut::SkipForward => Some(PlayerCommand::Skip(SKIP_SECONDS)),
            Shortcut::VolumeUp => Some(PlayerCommand::ChangeVolume(i16::from(VOLUME_STEP))),
            Shortcut::VolumeDown => Some(PlayerCommand::ChangeVolume(-i16::from(VOLUME_STEP))),
            Shortcut::ToggleMute => Some(PlayerCommand::ToggleMute),
            Shortcut::ToggleFullscreen => Some(PlayerCommand::ToggleFullscreen),
            Shortcut::ToggleSubtitleMenu => {
                self.toggle_subtitle_menu();
                None
            }
            Shortcut::ClosePanels => {
                self.close_panels();
                None
            }
        }
    }
}

/// Overlay drawn over the video: top bar, center play button and the bottom
/// control row.
#[component]
pub fn PlayerChrome(
    state: Signal<PlaybackState>,
    chrome: Signal<ChromeState>,
    is_fullscreen: bool,
    on_command: EventHandler<PlayerCommand>,
    on_back: EventHandler<()>,
) -> Element {
    let mut chrome = chrome;
    let snapshot = state();
    let view = chrome();
    let show_center_play = !snapshot.is_playing
        && matches!(
            snapshot.phase,
            PlaybackPhase::Ready | PlaybackPhase::Paused | PlaybackPhase::Ended
        );
    let is_loading = matches!(snapshot.phase, PlaybackPhase::Idle | PlaybackPhase::Loading);
    let overlay_class = if view.controls_visible {
        "absolute inset-0 flex flex-col justify-between opacity-100 transition-opacity duration-300"
    } else {
        "absolute inset-0 flex flex-col justify-between opacity-0 transition-opacity duration-300 cursor-none"
    };
    let current = format_time(snapshot.current_time);
    let total = format_time(snapshot.duration);

    rsx! {
        if is_loading {
            div { class: "absolute inset-0 flex items-center justify-center pointer-events-none",
                Icon { name: "loader".to_string(), class: "w-14 h-14 text-red-600".to_string() }
            }
        }
        div { class: overlay_class,
            // Top bar
            div { class: "flex items-center justify-between gap-4 px-4 md:px-8 py-4 bg-gradient-to-b from-black/80 to-transparent",
                div { class: "flex items-center gap-4 min-w-0",
                    button {
                        r#type: "button",
                        class: "p-2 rounded-full text-white hover:bg-white/10 transition-colors",
                        onclick: move |_| on_back.call(()),
                        Icon { name: "arrow-left".to_string(), class: "w-6 h-6".to_string() }
                    }
                    h1 { class: "text-lg md:text-xl font-semibold text-white truncate", "{snapshot.title}" }
                }
                div { class: "relative flex items-center gap-2",
                    if !snapshot.subtitles.is_empty() {
                        button {
                            r#type: "button",
                            class: if view.subtitle_menu_open { "p-2 rounded-full text-red-500 bg-white/10" } else { "p-2 rounded-full text-white hover:bg-white/10 transition-colors" },
                            onclick: move |_| chrome.write().toggle_subtitle_menu(),
                            Icon { name: "subtitles".to_string(), class: "w-6 h-6".to_string() }
                        }
                    }
                    button {
                        r#type: "button",
                        class: if view.info_open { "p-2 rounded-full text-red-500 bg-white/10" } else { "p-2 rounded-full text-white hover:bg-white/10 transition-colors" },
                        onclick: move |_| chrome.write().toggle_info(),
                        Icon { name: "info".to_string(), class: "w-6 h-6".to_string() }
                    }
                    if view.subtitle_menu_open {
                        SubtitleMenu {
                            tracks: snapshot.subtitles.clone(),
                            selected: snapshot.subtitle_track_id.clone(),
                            on_select: move |track: Option<String>| {
                                on_command.call(PlayerCommand::SelectSubtitle(track));
                                chrome.write().close_panels();
                            },
                        }
                    }
                    if view.info_open {
                        InfoPanel { state: snapshot.clone() }
                    }
                }
            }

            // Center
            div { class: "flex-1 flex items-center justify-center",
                onclick: move |_| on_command.call(PlayerCommand::TogglePlay),
                if show_center_play {
                    div { class: "w-20 h-20 rounded-full bg-black/60 flex items-center justify-center",
                        Icon { name: "play".to_string(), class: "w-10 h-10 text-white".to_string() }
                    }
                }
            }

            // Bottom controls
            div { class: "px-4 md:px-8 pb-4 pt-10 space-y-3 bg-gradient-to-t from-black/90 to-transparent",
                ProgressBar {
                    current_time: snapshot.current_time,
                    duration: snapshot.duration,
                    played_fraction: snapshot.progress_fraction(),
                    buffered_fraction: snapshot.buffered_fraction(),
                    on_command,
                }
                div { class: "flex items-center justify-between gap-4",
                    div { class: "flex items-center gap-2 md:gap-4",
                        PlayPauseButton { is_playing: snapshot.is_playing, on_command }
                        SkipButton { delta: -SKIP_SECONDS, on_command }
                        SkipButton { delta: SKIP_SECONDS, on_command }
                        VolumeControl {
                            volume: snapshot.volume,
                            is_muted: snapshot.is_muted,
                            on_command,
                        }
                        span { class: "text-sm tabular-nums text-zinc-200", "{current} / {total}" }
                    }
                    FullscreenButton { is_fullscreen, on_command }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_hide_only_after_latest_activity_while_playing() {
        let mut chrome = ChromeState::default();
        let first = chrome.note_activity();
        let second = chrome.note_activity();

        chrome.hide_if_idle(first, true);
        assert!(chrome.controls_visible);

        chrome.hide_if_idle(second, false);
        assert!(chrome.controls_visible);

        chrome.hide_if_idle(second, true);
        assert!(!chrome.controls_visible);

        chrome.note_activity();
        assert!(chrome.controls_visible);
    }

    #[test]
    fn open_panel_keeps_controls_visible() {
        let mut chrome = ChromeState::default();
        chrome.toggle_subtitle_menu();
        let mark = chrome.note_activity();

        chrome.hide_if_idle(mark, true);
        assert!(chrome.controls_visible);
    }

    #[test]
    fn panels_are_mutually_exclusive() {
        let mut chrome = ChromeState::default();
        chrome.toggle_info();
        chrome.toggle_subtitle_menu();
        assert!(chrome.subtitle_menu_open);
        assert!(!chrome.info_open);

        chrome.toggle_info();
        assert!(chrome.info_open);
        assert!(!chrome.subtitle_menu_open);
    }

    #[test]
    fn shortcuts_map_to_commands() {
        let mut chrome = ChromeState::default();
        assert_eq!(
            chrome.apply_shortcut(Shortcut::TogglePlay),
            Some(PlayerCommand::TogglePlay)
        );
        assert_eq!(
            chrome.apply_shortcut(Shortcut::SkipBack),
            Some(PlayerCommand::Skip(-10.0))
        );
        assert_eq!(
            chrome.apply_shortcut(Shortcut::VolumeUp),
            Some(PlayerCommand::ChangeVolume(5))
        );
        assert_eq!(
            chrome.apply_shortcut(Shortcut::VolumeDown),
            Some(PlayerCommand::ChangeVolume(-5))
        );
        assert_eq!(
            chrome.apply_shortcut(Shortcut::ToggleFullscreen),
            Some(PlayerCommand::ToggleFullscreen)
        );
    }

    #[test]
    fn panel_shortcuts_stay_in_the_chrome() {
        let mut chrome = ChromeState::default();
        assert_eq!(chrome.apply_shortcut(Shortcut::ToggleSubtitleMenu), None);
        assert!(chrome.subtitle_menu_open);

        chrome.toggle_info();
        assert_eq!(chrome.apply_shortcut(Shortcut::ClosePanels), None);
        assert!(!chrome.any_panel_open());
    }
}
