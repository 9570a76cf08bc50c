use crate::components::{gate, Gate, Icon, Navbar, Route};
use crate::session::use_session_provider;
use crate::storage::default_store;
use dioxus::prelude::*;

/// Layout for every route: owns the session, gates content routes on it and
/// renders the navigation chrome.
#[component]
pub fn AppShell() -> Element {
    let session = use_session_provider(default_store);
    let route = use_route::<Route>();
    let navigator = use_navigator();

    let decision = gate(&route, (session.status)());
    let redirect = match &decision {
        Gate::Redirect(target) => Some(target.clone()),
        _ => None,
    };

    use_effect(use_reactive((&redirect,), move |(redirect,)| {
        if let Some(target) = redirect {
            tracing::debug!(?target, "redirecting");
            navigator.replace(target);
        }
    }));

    match decision {
        Gate::Render => rsx! {
            div { class: "min-h-screen bg-black text-white",
                if route.shows_navbar() {
                    Navbar {}
                }
                Outlet::<Route> {}
            }
        },
        Gate::Wait | Gate::Redirect(_) => rsx! {
            div { class: "min-h-screen bg-black flex items-center justify-center",
                Icon { name: "loader".to_string(), class: "w-10 h-10 text-red-600".to_string() }
            }
        },
    }
}
