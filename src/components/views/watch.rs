use crate::components::{
    sleep_ms, ChromeState, Icon, PlayerChrome, PlayerCommand, Route, CONTROLS_HIDE_MS,
    PLAYER_CONTAINER_ID,
};
use crate::playback::{PlaybackError, PlaybackState, Shortcut, VIDEO_ELEMENT_ID};
#[cfg(target_arch = "wasm32")]
use crate::session::use_session;
use dioxus::prelude::*;

#[cfg(target_arch = "wasm32")]
use crate::playback::{
    negotiate,
    web::{get_video_element, toggle_fullscreen, WebPlayer},
};
#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};

#[cfg(target_arch = "wasm32")]
type PlayerSlot = Rc<RefCell<Option<Rc<WebPlayer>>>>;

#[cfg(target_arch = "wasm32")]
fn run_command(player: &WebPlayer, command: PlayerCommand) {
    match command {
        PlayerCommand::TogglePlay => player.toggle_play_pause(),
        PlayerCommand::BeginScrub => player.begin_scrub(),
        PlayerCommand::UpdateScrub(seconds) => player.update_scrub(seconds),
        PlayerCommand::CommitScrub(seconds) => player.commit_scrub(seconds),
        PlayerCommand::Skip(delta) => player.skip(delta),
        PlayerCommand::SetVolume(volume) => player.set_volume(volume),
        PlayerCommand::ChangeVolume(delta) => player.change_volume(delta),
        PlayerCommand::ToggleMute => player.toggle_mute(),
        PlayerCommand::SelectSubtitle(track) => player.select_subtitle(track),
        PlayerCommand::ToggleFullscreen => {}
    }
}

/// Numbers player launches so a slow launch that was replaced by a newer
/// one drops its result.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct LaunchCounter {
    latest: u64,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl LaunchCounter {
    fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    fn is_current(&self, launch: u64) -> bool {
        self.latest == launch
    }
}

/// Message for the error panel when a negotiated stream could not start.
/// A torn-down player has nothing to report.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn start_failure_message(err: &PlaybackError) -> Option<String> {
    match err {
        PlaybackError::Superseded => None,
        PlaybackError::NoPlayableSource => {
            Some("This title has no stream the browser can play.".to_string())
        }
        PlaybackError::Negotiation(err) => Some(format!("Could not start playback: {err}")),
    }
}

#[component]
pub fn Watch(id: String) -> Element {
    let navigator = use_navigator();
    let state = use_signal(PlaybackState::default);
    let mut chrome = use_signal(ChromeState::default);
    let mut is_fullscreen = use_signal(|| false);
    let mut attempt = use_signal(|| 0u32);
    let mut start_error = use_signal(|| None::<String>);
    #[cfg(target_arch = "wasm32")]
    let mut launches = use_signal(LaunchCounter::default);

    #[cfg(target_arch = "wasm32")]
    let slot: PlayerSlot = use_hook(|| Rc::new(RefCell::new(None)));

    #[cfg(target_arch = "wasm32")]
    {
        let session = use_session();
        let slot = slot.clone();
        use_effect(use_reactive((&id,), move |(id,)| {
            let mut state = state;
            let run = attempt();
            let launch = launches.write().begin();
            if let Some(previous) = slot.borrow_mut().take() {
                previous.teardown();
            }
            state.set(PlaybackState::default());
            start_error.set(None);
            chrome.set(ChromeState::default());

            let client = session.client();
            let slot = slot.clone();
            spawn(async move {
                tracing::debug!(item = %id, run, launch, "preparing playback");
                let negotiated = negotiate(&client, &id).await;
                if !launches.peek().is_current(launch) {
                    tracing::debug!(item = %id, launch, "dropping superseded launch");
                    return;
                }
                let prepared = match negotiated {
                    Ok(prepared) => prepared,
                    Err(err) => {
                        tracing::error!(item = %id, "playback negotiation failed: {err}");
                        navigator.replace(Route::Details { id: id.clone() });
                        return;
                    }
                };
                let Some(element) = get_video_element() else {
                    start_error.set(Some("The video element is not available.".to_string()));
                    return;
                };
                let player = WebPlayer::new(element, state);
                if let Err(err) = player.initialize(prepared) {
                    tracing::warn!(item = %id, "playback not started: {err}");
                    player.teardown();
                    if let Some(message) = start_failure_message(&err) {
                        start_error.set(Some(message));
                    }
                    return;
                }
                if let Some(previous) = slot.borrow_mut().replace(player) {
                    previous.teardown();
                }
            });
        }));
    }

    #[cfg(not(target_arch = "wasm32"))]
    use_effect(move || {
        let _ = attempt();
        start_error.set(Some(
            "Video playback is only available in the browser build.".to_string(),
        ));
    });

    #[cfg(target_arch = "wasm32")]
    {
        let slot = slot.clone();
        use_drop(move || {
            if let Some(player) = slot.borrow_mut().take() {
                player.teardown();
            }
        });
    }

    let dispatch = use_callback({
        #[cfg(target_arch = "wasm32")]
        let slot = slot.clone();
        move |command: PlayerCommand| {
            if command == PlayerCommand::ToggleFullscreen {
                #[cfg(target_arch = "wasm32")]
                let entered = toggle_fullscreen(PLAYER_CONTAINER_ID);
                #[cfg(not(target_arch = "wasm32"))]
                let entered = false;
                is_fullscreen.set(entered);
                return;
            }
            #[cfg(target_arch = "wasm32")]
            if let Some(player) = slot.borrow().as_ref() {
                run_command(player, command);
            }
            #[cfg(not(target_arch = "wasm32"))]
            tracing::trace!(?command, "no player attached");
        }
    });

    let schedule_hide = use_callback(move |_: ()| {
        let mark = chrome.write().note_activity();
        spawn(async move {
            sleep_ms(CONTROLS_HIDE_MS).await;
            let playing = state.peek().is_playing;
            chrome.write().hide_if_idle(mark, playing);
        });
    });

    let is_playing = state.read().is_playing;
    use_effect(use_reactive((&is_playing,), move |(is_playing,)| {
        if is_playing {
            schedule_hide.call(());
        }
    }));

    let on_keydown = move |evt: KeyboardEvent| {
        let code = evt.code().to_string();
        let Some(shortcut) = Shortcut::from_key_code(&code) else {
            return;
        };
        evt.prevent_default();
        schedule_hide.call(());
        if let Some(command) = chrome.write().apply_shortcut(shortcut) {
            dispatch.call(command);
        }
    };

    let back_target = Route::Details { id: id.clone() };
    let on_back = {
        let target = back_target.clone();
        move |_: MouseEvent| {
            navigator.push(target.clone());
        }
    };

    let snapshot = state();
    let failure = start_error().or_else(|| {
        snapshot.has_fatal_error.then(|| {
            snapshot
                .error_message
                .clone()
                .unwrap_or_else(|| "Playback failed.".to_string())
        })
    });

    rsx! {
        div {
            id: PLAYER_CONTAINER_ID,
            class: "fixed inset-0 z-50 bg-black text-white outline-none select-none",
            tabindex: "0",
            onmounted: move |evt| async move {
                let _ = evt.set_focus(true).await;
            },
            onkeydown: on_keydown,
            onmousemove: move |_| schedule_hide.call(()),
            video {
                id: VIDEO_ELEMENT_ID,
                class: "absolute inset-0 w-full h-full bg-black",
                playsinline: true,
                crossorigin: "anonymous",
                preload: "auto",
            }
            if let Some(message) = failure {
                div { class: "absolute inset-0 z-10 flex flex-col items-center justify-center gap-5 bg-black/85 px-6 text-center",
                    Icon { name: "alert".to_string(), class: "w-14 h-14 text-red-600".to_string() }
                    h2 { class: "text-2xl font-semibold", "Playback error" }
                    p { class: "max-w-md text-zinc-400", "{message}" }
                    div { class: "flex gap-3",
                        button {
                            r#type: "button",
                            class: "rounded bg-white px-6 py-2 font-semibold text-black hover:bg-zinc-200",
                            onclick: move |_| {
                                start_error.set(None);
                                attempt += 1;
                            },
                            "Retry"
                        }
                        button {
                            r#type: "button",
                            class: "rounded bg-zinc-700 px-6 py-2 font-semibold text-white hover:bg-zinc-600",
                            onclick: on_back.clone(),
                            "Back"
                        }
                    }
                }
            } else {
                PlayerChrome {
                    state,
                    chrome,
                    is_fullscreen: is_fullscreen(),
                    on_command: move |command| dispatch.call(command),
                    on_back: move |_| {
                        navigator.push(back_target.clone());
                    },
                }
            }
        }
    }
}
