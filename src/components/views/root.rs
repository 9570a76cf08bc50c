use crate::components::{Icon, Route};
use dioxus::prelude::*;

/// `/` has no content of its own; the shell redirects to home or login once
/// the session is known.
#[component]
pub fn Root() -> Element {
    rsx! {
        div { class: "min-h-screen flex items-center justify-center",
            Icon { name: "loader".to_string(), class: "w-10 h-10 text-red-600".to_string() }
        }
    }
}

#[component]
pub fn NotFound(segments: Vec<String>) -> Element {
    let path = format!("/{}", segments.join("/"));
    tracing::debug!(%path, "unknown route");

    rsx! {
        div { class: "min-h-screen bg-black text-white flex flex-col items-center justify-center gap-4 px-6 text-center",
            p { class: "text-7xl font-extrabold text-red-600", "404" }
            h1 { class: "text-2xl font-semibold", "Lost your way?" }
            p { class: "text-zinc-400", "Nothing lives at {path}." }
            Link {
                to: Route::Home {},
                class: "mt-2 rounded bg-white px-6 py-2 font-semibold text-black hover:bg-zinc-200",
                "Back to home"
            }
        }
    }
}
