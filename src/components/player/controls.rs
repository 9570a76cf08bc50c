use super::PlayerCommand;
use crate::api::{format_time, StreamingMode, SubtitleTrack};
use crate::components::Icon;
use crate::playback::PlaybackState;
use dioxus::prelude::*;

const CONTROL_BUTTON: &str =
    "p-2 rounded-full text-white hover:bg-white/10 transition-colors flex items-center justify-center";

#[component]
pub(super) fn PlayPauseButton(is_playing: bool, on_command: EventHandler<PlayerCommand>) -> Element {
    rsx! {
        button {
            r#type: "button",
            class: CONTROL_BUTTON,
            onclick: move |_| on_command.call(PlayerCommand::TogglePlay),
            if is_playing {
                Icon { name: "pause".to_string(), class: "w-7 h-7".to_string() }
            } else {
                Icon { name: "play".to_string(), class: "w-7 h-7".to_string() }
            }
        }
    }
}

#[component]
pub(super) fn SkipButton(delta: f64, on_command: EventHandler<PlayerCommand>) -> Element {
    let icon = if delta < 0.0 { "skip-back" } else { "skip-forward" };
    let label = format!("{:.0}", delta.abs());
    let title = if delta < 0.0 {
        format!("Back {label} seconds")
    } else {
        format!("Forward {label} seconds")
    };

    rsx! {
        button {
            r#type: "button",
            class: "{CONTROL_BUTTON} relative",
            title,
            onclick: move |_| on_command.call(PlayerCommand::Skip(delta)),
            Icon { name: icon.to_string(), class: "w-6 h-6".to_string() }
            span { class: "absolute -bottom-1 text-[10px] font-semibold", "{label}" }
        }
    }
}

#[component]
pub(super) fn VolumeControl(
    volume: u8,
    is_muted: bool,
    on_command: EventHandler<PlayerCommand>,
) -> Element {
    let shown = if is_muted { 0 } else { volume };

    rsx! {
        div { class: "group flex items-center gap-2",
            button {
                r#type: "button",
                class: CONTROL_BUTTON,
                onclick: move |_| on_command.call(PlayerCommand::ToggleMute),
                if is_muted || volume == 0 {
                    Icon { name: "volume-x".to_string(), class: "w-6 h-6".to_string() }
                } else {
                    Icon { name: "volume".to_string(), class: "w-6 h-6".to_string() }
                }
            }
            input {
                r#type: "range",
                min: "0",
                max: "100",
                step: "1",
                value: "{shown}",
                class: "w-0 group-hover:w-24 transition-all duration-200 accent-red-600",
                oninput: move |e| {
                    if let Ok(value) = e.value().parse::<f64>() {
                        on_command.call(PlayerCommand::SetVolume(value.clamp(0.0, 100.0).round() as u8));
                    }
                },
            }
        }
    }
}

/// Seek bar with the buffered range behind the played range.
#[component]
pub(super) fn ProgressBar(
    current_time: f64,
    duration: f64,
    played_fraction: f64,
    buffered_fraction: f64,
    on_command: EventHandler<PlayerCommand>,
) -> Element {
    let played = played_fraction * 100.0;
    let buffered = buffered_fraction * 100.0;
    let max = duration.max(0.0);

    let parse = |e: &Event<FormData>| e.value().parse::<f64>().ok().filter(|v| v.is_finite());

    rsx! {
        div { class: "relative h-4 flex items-center group",
            div { class: "absolute inset-x-0 h-1 group-hover:h-1.5 rounded bg-white/20 transition-all",
                div { class: "absolute inset-y-0 left-0 rounded bg-white/40", style: "width: {buffered:.2}%" }
                div { class: "absolute inset-y-0 left-0 rounded bg-red-600", style: "width: {played:.2}%" }
            }
            input {
                r#type: "range",
                min: "0",
                max: "{max}",
                step: "0.1",
                value: "{current_time}",
                disabled: duration <= 0.0,
                class: "relative w-full h-4 opacity-0 cursor-pointer",
                onpointerdown: move |_| on_command.call(PlayerCommand::BeginScrub),
                oninput: move |e| {
                    if let Some(seconds) = parse(&e) {
                        on_command.call(PlayerCommand::UpdateScrub(seconds));
                    }
                },
                onchange: move |e| {
                    if let Some(seconds) = parse(&e) {
                        on_command.call(PlayerCommand::CommitScrub(seconds));
                    }
                },
            }
        }
    }
}

#[component]
pub(super) fn FullscreenButton(is_fullscreen: bool, on_command: EventHandler<PlayerCommand>) -> Element {
    rsx! {
        button {
            r#type: "button",
            class: CONTROL_BUTTON,
            onclick: move |_| on_command.call(PlayerCommand::ToggleFullscreen),
            if is_fullscreen {
                Icon { name: "minimize".to_string(), class: "w-6 h-6".to_string() }
            } else {
                Icon { name: "maximize".to_string(), class: "w-6 h-6".to_string() }
            }
        }
    }
}

#[component]
pub(super) fn SubtitleMenu(
    tracks: Vec<SubtitleTrack>,
    selected: Option<String>,
    on_select: EventHandler<Option<String>>,
) -> Element {
    let off_selected = selected.is_none();

    rsx! {
        div { class: "absolute right-0 top-12 z-20 w-64 max-h-80 overflow-y-auto rounded-lg bg-zinc-900/95 border border-zinc-800 py-2 shadow-2xl",
            p { class: "px-4 pb-2 text-xs uppercase tracking-wider text-zinc-500", "Subtitles" }
            button {
                r#type: "button",
                class: "w-full flex items-center justify-between px-4 py-2 text-sm text-left text-white hover:bg-zinc-800",
                onclick: move |_| on_select.call(None),
                "Off"
                if off_selected {
                    Icon { name: "check".to_string(), class: "w-4 h-4 text-red-500".to_string() }
                }
            }
            for track in tracks {
                {
                    let is_selected = selected.as_deref() == Some(track.id.as_str());
                    let id = track.id.clone();
                    rsx! {
                        button {
                            key: "{track.id}",
                            r#type: "button",
                            class: "w-full flex items-center justify-between px-4 py-2 text-sm text-left text-white hover:bg-zinc-800",
                            onclick: move |_| on_select.call(Some(id.clone())),
                            span { class: "truncate", "{track.display_title}" }
                            if is_selected {
                                Icon { name: "check".to_string(), class: "w-4 h-4 text-red-500 flex-none".to_string() }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Stream diagnostics shown from the top bar.
#[component]
pub(super) fn InfoPanel(state: PlaybackState) -> Element {
    let mode = match state.streaming_mode {
        Some(StreamingMode::AdaptiveManifest) => "Adaptive (HLS)",
        Some(StreamingMode::DirectFile) => "Direct file",
        None => "Not attached",
    };
    let subtitle = state
        .subtitle_track_id
        .as_deref()
        .and_then(|id| state.subtitles.iter().find(|track| track.id == id))
        .map(|track| track.display_title.clone())
        .unwrap_or_else(|| "Off".to_string());
    let buffered = format_time(state.buffered);

    rsx! {
        div { class: "absolute right-0 top-12 z-20 w-80 rounded-lg bg-zinc-900/95 border border-zinc-800 p-4 text-sm shadow-2xl space-y-2",
            p { class: "text-xs uppercase tracking-wider text-zinc-500", "Playback info" }
            InfoRow { label: "Mode", value: mode.to_string() }
            InfoRow { label: "Buffered to", value: buffered }
            InfoRow { label: "Subtitles", value: subtitle }
            InfoRow { label: "Volume", value: if state.is_muted { "Muted".to_string() } else { format!("{}%", state.volume) } }
        }
    }
}

#[component]
fn InfoRow(label: &'static str, value: String) -> Element {
    rsx! {
        div { class: "flex justify-between gap-4",
            span { class: "text-zinc-400", "{label}" }
            span { class: "text-white text-right", "{value}" }
        }
    }
}
