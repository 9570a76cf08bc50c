//! Browser bindings: the `<video>` element as a [`MediaSurface`] and hls.js
//! as the [`AdaptiveRuntime`].

use super::{
    AdaptiveClient, AdaptiveEvent, AdaptiveRuntime, MediaSurface, PlaybackController,
    PlaybackError, PlaybackState, PreparedPlayback, RevealToken, ScrubToken, SurfaceEvent,
    SCRUB_SETTLE_MS, SUBTITLE_REVEAL_DELAY_MS, VIDEO_ELEMENT_ID,
};
use dioxus::core::{Runtime, RuntimeGuard};
use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, HtmlMediaElement, HtmlTrackElement, HtmlVideoElement, TextTrackMode};

#[wasm_bindgen]
extern "C" {
    type Hls;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported)]
    fn is_supported() -> bool;

    #[wasm_bindgen(catch, constructor)]
    fn new(config: &JsValue) -> Result<Hls, JsValue>;

    #[wasm_bindgen(method, js_name = loadSource)]
    fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method, js_name = attachMedia)]
    fn attach_media(this: &Hls, media: &HtmlMediaElement);

    #[wasm_bindgen(method, js_name = startLoad)]
    fn start_load(this: &Hls);

    #[wasm_bindgen(method, js_name = recoverMediaError)]
    fn recover_media_error(this: &Hls);

    #[wasm_bindgen(method)]
    fn destroy(this: &Hls);

    #[wasm_bindgen(method)]
    fn on(this: &Hls, event: &str, callback: &js_sys::Function);
}

fn hls_available() -> bool {
    js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("Hls"))
        .map(|value| !value.is_undefined())
        .unwrap_or(false)
        && Hls::is_supported()
}

fn hls_config() -> JsValue {
    let config = js_sys::Object::new();
    let entries: [(&str, JsValue); 5] = [
        ("progressive", JsValue::TRUE),
        ("lowLatencyMode", JsValue::FALSE),
        ("backBufferLength", JsValue::from_f64(90.0)),
        ("manifestLoadingTimeOut", JsValue::from_f64(60_000.0)),
        ("fragLoadingTimeOut", JsValue::from_f64(60_000.0)),
    ];
    for (key, value) in entries {
        let _ = js_sys::Reflect::set(&config, &JsValue::from_str(key), &value);
    }
    config.into()
}

fn js_field(data: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(data, &JsValue::from_str(key)).ok()
}

pub fn get_video_element() -> Option<HtmlVideoElement> {
    window()?
        .document()?
        .get_element_by_id(VIDEO_ELEMENT_ID)?
        .dyn_into::<HtmlVideoElement>()
        .ok()
}

pub struct WebSurface {
    element: HtmlVideoElement,
    caption: RefCell<Option<HtmlTrackElement>>,
}

impl MediaSurface for WebSurface {
    fn set_src(&self, url: &str) {
        self.element.set_src(url);
    }

    fn clear_src(&self) {
        let _ = self.element.remove_attribute("src");
        self.element.load();
    }

    fn play(&self) {
        if let Ok(promise) = self.element.play() {
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(err) = wasm_bindgen_futures::JsFuture::from(promise).await {
                    tracing::debug!("play() rejected: {err:?}");
                }
            });
        }
    }

    fn pause(&self) {
        let _ = self.element.pause();
    }

    fn seek(&self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn set_volume(&self, volume: f64) {
        self.element.set_volume(volume);
    }

    fn set_muted(&self, muted: bool) {
        self.element.set_muted(muted);
    }

    fn can_play_manifest(&self) -> bool {
        !self
            .element
            .can_play_type("application/vnd.apple.mpegurl")
            .is_empty()
    }

    fn clear_text_tracks(&self) {
        self.caption.borrow_mut().take();
        let tracks = self.element.query_selector_all("track");
        if let Ok(tracks) = tracks {
            for index in 0..tracks.length() {
                if let Some(node) = tracks.item(index) {
                    if let Some(parent) = node.parent_node() {
                        let _ = parent.remove_child(&node);
                    }
                }
            }
        }
    }

    fn attach_text_track(&self, url: &str, label: &str, language: &str) {
        let Some(document) = window().and_then(|w| w.document()) else {
            return;
        };
        let Ok(track) = document
            .create_element("track")
            .map(|el| el.unchecked_into::<HtmlTrackElement>())
        else {
            return;
        };
        track.set_kind("subtitles");
        track.set_src(url);
        track.set_label(label);
        track.set_srclang(language);
        track.set_default(true);
        if let Err(err) = self.element.append_child(&track) {
            tracing::warn!("failed to attach caption track: {err:?}");
            return;
        }
        *self.caption.borrow_mut() = Some(track);
    }

    fn show_text_track(&self) {
        let Some(caption) = self.caption.borrow().as_ref().and_then(|el| el.track()) else {
            return;
        };
        // Tracks hls.js added from the manifest stay in the list; only ours shows.
        if let Some(list) = self.element.text_tracks() {
            for index in 0..list.length() {
                if let Some(track) = list.get(index) {
                    track.set_mode(TextTrackMode::Disabled);
                }
            }
        }
        caption.set_mode(TextTrackMode::Showing);
    }
}

type EventSink = Rc<dyn Fn(u64, AdaptiveEvent)>;

pub struct HlsRuntime {
    element: HtmlMediaElement,
    sink: EventSink,
}

impl AdaptiveRuntime for HlsRuntime {
    fn is_supported(&self) -> bool {
        hls_available()
    }

    fn create(&self, generation: u64) -> Option<Box<dyn AdaptiveClient>> {
        let hls = match Hls::new(&hls_config()) {
            Ok(hls) => hls,
            Err(err) => {
                tracing::error!("hls.js construction failed: {err:?}");
                return None;
            }
        };

        let parsed_sink = self.sink.clone();
        let on_parsed = Closure::wrap(Box::new(move |_event: JsValue, _data: JsValue| {
            parsed_sink(generation, AdaptiveEvent::ManifestParsed);
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        let error_sink = self.sink.clone();
        let on_error = Closure::wrap(Box::new(move |_event: JsValue, data: JsValue| {
            let fatal = js_field(&data, "fatal")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let error_type = js_field(&data, "type")
                .and_then(|v| v.as_string())
                .unwrap_or_default();
            let details = js_field(&data, "details")
                .and_then(|v| v.as_string())
                .unwrap_or_default();
            error_sink(
                generation,
                AdaptiveEvent::from_hls_error(fatal, &error_type, &details),
            );
        }) as Box<dyn FnMut(JsValue, JsValue)>);

        hls.on("hlsManifestParsed", on_parsed.as_ref().unchecked_ref());
        hls.on("hlsError", on_error.as_ref().unchecked_ref());

        Some(Box::new(HlsClient {
            hls,
            element: self.element.clone(),
            callbacks: vec![on_parsed, on_error],
        }))
    }
}

struct HlsClient {
    hls: Hls,
    element: HtmlMediaElement,
    callbacks: Vec<Closure<dyn FnMut(JsValue, JsValue)>>,
}

impl AdaptiveClient for HlsClient {
    fn load(&mut self, url: &str) {
        self.hls.load_source(url);
        self.hls.attach_media(&self.element);
    }

    fn start_load(&mut self) {
        self.hls.start_load();
    }

    fn recover_media_error(&mut self) {
        self.hls.recover_media_error();
    }

    fn destroy(&mut self) {
        self.hls.destroy();
        self.callbacks.clear();
    }
}

pub type WebController = PlaybackController<WebSurface, HlsRuntime>;

/// Routes controller calls from browser callbacks and timers, and mirrors
/// the resulting state into the view's signal.
#[derive(Clone)]
struct Dispatcher {
    controller: Weak<RefCell<WebController>>,
    state: Signal<PlaybackState>,
    runtime: Rc<Runtime>,
}

impl Dispatcher {
    fn apply<F>(&self, f: F)
    where
        F: FnOnce(&mut WebController) + 'static,
    {
        let Some(controller) = self.controller.upgrade() else {
            return;
        };
        let snapshot = match controller.try_borrow_mut() {
            Ok(mut controller) => {
                f(&mut controller);
                controller.state().clone()
            }
            Err(_) => {
                // Re-entered from a synchronous browser callback; retry once
                // the current call has returned.
                let this = self.clone();
                wasm_bindgen_futures::spawn_local(async move { this.apply(f) });
                return;
            }
        };
        let _guard = RuntimeGuard::new(self.runtime.clone());
        let mut state = self.state;
        state.set(snapshot);
    }

    fn settle_later(&self, token: ScrubToken) {
        let this = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(SCRUB_SETTLE_MS).await;
            this.apply(move |c| c.settle_scrub(token));
        });
    }

    fn reveal_later(&self, token: RevealToken) {
        let this = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(SUBTITLE_REVEAL_DELAY_MS).await;
            this.apply(move |c| c.reveal_subtitle(token));
        });
    }
}

type SurfaceListener = (&'static str, Closure<dyn FnMut(web_sys::Event)>);

/// Playback controller bound to the page's video element.
pub struct WebPlayer {
    controller: Rc<RefCell<WebController>>,
    dispatcher: Dispatcher,
    element: HtmlVideoElement,
    listeners: RefCell<Vec<SurfaceListener>>,
}

impl WebPlayer {
    pub fn new(element: HtmlVideoElement, state: Signal<PlaybackState>) -> Rc<Self> {
        let runtime = Runtime::current();
        let media: HtmlMediaElement = element.clone().unchecked_into();

        let controller = Rc::new_cyclic(|weak: &Weak<RefCell<WebController>>| {
            let dispatcher = Dispatcher {
                controller: weak.clone(),
                state,
                runtime: runtime.clone(),
            };
            let sink: EventSink = Rc::new(move |generation, event| {
                dispatcher.apply(move |c| c.handle_adaptive_event(generation, event));
            });
            RefCell::new(PlaybackController::new(
                WebSurface {
                    element: element.clone(),
                    caption: RefCell::new(None),
                },
                HlsRuntime {
                    element: media,
                    sink,
                },
            ))
        });

        let player = Rc::new(Self {
            dispatcher: Dispatcher {
                controller: Rc::downgrade(&controller),
                state,
                runtime,
            },
            controller,
            element,
            listeners: RefCell::new(Vec::new()),
        });
        player.install_listeners();
        player
    }

    fn install_listeners(&self) {
        let events: [&'static str; 11] = [
            "canplay",
            "loadedmetadata",
            "durationchange",
            "timeupdate",
            "progress",
            "play",
            "pause",
            "volumechange",
            "ended",
            "error",
            "seeked",
        ];
        let mut listeners = self.listeners.borrow_mut();
        for name in events {
            let dispatcher = self.dispatcher.clone();
            let element = self.element.clone();
            let callback = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                if let Some(event) = surface_event(name, &element) {
                    dispatcher.apply(move |c| c.handle_surface_event(event));
                }
            }) as Box<dyn FnMut(web_sys::Event)>);
            let _ = self
                .element
                .add_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
            listeners.push((name, callback));
        }
    }

    pub fn initialize(&self, prepared: PreparedPlayback) -> Result<(), PlaybackError> {
        let reveal = self.controller.borrow_mut().initialize(prepared)?;
        self.sync();
        if let Some(token) = reveal {
            self.dispatcher.reveal_later(token);
        }
        Ok(())
    }

    fn sync(&self) {
        self.dispatcher.apply(|_| {});
    }

    pub fn toggle_play_pause(&self) {
        self.dispatcher.apply(|c| c.toggle_play_pause());
    }

    pub fn begin_scrub(&self) {
        self.dispatcher.apply(|c| c.begin_scrub());
    }

    pub fn update_scrub(&self, seconds: f64) {
        self.dispatcher.apply(move |c| c.update_scrub(seconds));
    }

    pub fn commit_scrub(&self, seconds: f64) {
        let dispatcher = self.dispatcher.clone();
        self.dispatcher.apply(move |c| {
            let token = c.commit_scrub(seconds);
            dispatcher.settle_later(token);
        });
    }

    pub fn skip(&self, delta_seconds: f64) {
        let dispatcher = self.dispatcher.clone();
        self.dispatcher.apply(move |c| {
            let token = c.skip(delta_seconds);
            dispatcher.settle_later(token);
        });
    }

    pub fn set_volume(&self, volume: u8) {
        self.dispatcher.apply(move |c| c.set_volume(volume));
    }

    pub fn change_volume(&self, delta: i16) {
        self.dispatcher.apply(move |c| c.change_volume(delta));
    }

    pub fn toggle_mute(&self) {
        self.dispatcher.apply(|c| c.toggle_mute());
    }

    pub fn select_subtitle(&self, track_id: Option<String>) {
        let dispatcher = self.dispatcher.clone();
        self.dispatcher.apply(move |c| {
            if let Some(token) = c.select_subtitle(track_id.as_deref()) {
                dispatcher.reveal_later(token);
            }
        });
    }

    /// Releases hls.js, the element listeners and the source.
    pub fn teardown(&self) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.teardown(),
            Err(_) => {
                // Called from inside a controller callback; finish once it returns.
                tracing::debug!("controller busy, deferring teardown");
                let controller = self.controller.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match controller.try_borrow_mut() {
                        Ok(mut controller) => controller.teardown(),
                        Err(_) => tracing::warn!("controller still borrowed, teardown skipped"),
                    }
                });
            }
        }
        for (name, callback) in self.listeners.borrow_mut().drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
        }
    }
}

fn buffered_end(element: &HtmlVideoElement) -> f64 {
    let ranges = element.buffered();
    let now = element.current_time();
    let mut last_end = 0.0;
    for index in 0..ranges.length() {
        let (Ok(start), Ok(end)) = (ranges.start(index), ranges.end(index)) else {
            continue;
        };
        if start <= now && now <= end {
            return end;
        }
        last_end = end;
    }
    last_end
}

fn surface_event(name: &str, element: &HtmlVideoElement) -> Option<SurfaceEvent> {
    let event = match name {
        "canplay" => SurfaceEvent::CanPlay,
        "loadedmetadata" | "durationchange" => {
            let duration = element.duration();
            if !duration.is_finite() {
                return None;
            }
            SurfaceEvent::DurationChange(duration)
        }
        "timeupdate" | "seeked" => SurfaceEvent::TimeUpdate(element.current_time()),
        "progress" => SurfaceEvent::Progress(buffered_end(element)),
        "play" => SurfaceEvent::Play,
        "pause" => SurfaceEvent::Pause,
        "volumechange" => SurfaceEvent::VolumeChange {
            volume: element.volume(),
            muted: element.muted(),
        },
        "ended" => SurfaceEvent::Ended,
        "error" => SurfaceEvent::Error(
            element
                .error()
                .map(|err| format!("media error code {}", err.code()))
                .unwrap_or_else(|| "media error".to_string()),
        ),
        _ => return None,
    };
    Some(event)
}

/// Enters fullscreen on the element with `id`, or leaves it.
pub fn toggle_fullscreen(id: &str) -> bool {
    let Some(document) = window().and_then(|w| w.document()) else {
        return false;
    };
    if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
        return false;
    }
    match document.get_element_by_id(id) {
        Some(element) => match element.request_fullscreen() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("fullscreen request rejected: {err:?}");
                false
            }
        },
        None => false,
    }
}
