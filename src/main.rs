use dioxus::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod components;
mod config;
mod playback;
mod session;
mod storage;

use components::Route;

const FAVICON: Asset = asset!("/assets/favicon.svg");
const APP_CSS: Asset = asset!("/assets/styling/app.css");
const TAILWIND_CSS: Asset = asset!("/assets/tailwind.css");
const HLS_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/hls.js@1";

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flix=debug,dioxus=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting flix");
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Meta { name: "theme-color", content: "#000000" }
        document::Meta { name: "mobile-web-app-capable", content: "yes" }
        document::Title { "Flix" }

        document::Stylesheet { href: TAILWIND_CSS }
        document::Stylesheet { href: APP_CSS }
        document::Script { src: HLS_SCRIPT }

        Router::<Route> {}
    }
}
