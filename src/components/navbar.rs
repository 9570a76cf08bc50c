use crate::components::{Icon, Route};
use crate::session::use_session;
use dioxus::prelude::*;

#[component]
pub fn Navbar() -> Element {
    let session = use_session();
    let route = use_route::<Route>();
    let mut scrolled = use_signal(|| false);
    let user_name = session.user().map(|user| user.name).unwrap_or_default();

    #[cfg(target_arch = "wasm32")]
    {
        use dioxus::core::{Runtime, RuntimeGuard};
        use std::rc::Rc;
        use wasm_bindgen::{closure::Closure, JsCast};

        let listener = use_hook(move || {
            let win = web_sys::window()?;
            let runtime = Runtime::current();
            let on_scroll = Closure::wrap(Box::new(move || {
                let _guard = RuntimeGuard::new(runtime.clone());
                let y = web_sys::window()
                    .and_then(|w| w.scroll_y().ok())
                    .unwrap_or(0.0);
                if (y > 10.0) != *scrolled.peek() {
                    scrolled.set(y > 10.0);
                }
            }) as Box<dyn FnMut()>);
            let _ = win
                .add_event_listener_with_callback("scroll", on_scroll.as_ref().unchecked_ref());
            Some(Rc::new(on_scroll))
        });
        use_drop(move || {
            if let (Some(win), Some(on_scroll)) = (web_sys::window(), listener.as_ref()) {
                let _ = win.remove_event_listener_with_callback(
                    "scroll",
                    (**on_scroll).as_ref().unchecked_ref(),
                );
            }
        });
    }

    let on_logout = move |_| {
        session.logout();
    };

    rsx! {
        header {
            class: if scrolled() { "fixed top-0 inset-x-0 z-40 bg-black/95 backdrop-blur transition-colors" } else { "fixed top-0 inset-x-0 z-40 bg-gradient-to-b from-black/80 to-transparent transition-colors" },
            div { class: "flex items-center justify-between px-4 md:px-12 h-16",
                div { class: "flex items-center gap-8",
                    Link { to: Route::Home {}, class: "text-2xl font-extrabold tracking-tight text-red-600",
                        "FLIX"
                    }
                    nav { class: "hidden md:flex items-center gap-6 text-sm",
                        NavItem {
                            icon: "home",
                            label: "Home",
                            to: Route::Home {},
                            active: matches!(route, Route::Home {}),
                        }
                        NavItem {
                            icon: "film",
                            label: "Movies",
                            to: Route::Movies {},
                            active: matches!(route, Route::Movies {}),
                        }
                        NavItem {
                            icon: "tv",
                            label: "TV Shows",
                            to: Route::Shows {},
                            active: matches!(route, Route::Shows {}),
                        }
                    }
                }
                div { class: "flex items-center gap-4",
                    if !user_name.is_empty() {
                        span { class: "hidden sm:inline text-sm text-zinc-300", "{user_name}" }
                    }
                    button {
                        r#type: "button",
                        class: "flex items-center gap-2 text-sm text-zinc-300 hover:text-white transition-colors",
                        onclick: on_logout,
                        Icon { name: "logout".to_string(), class: "w-4 h-4".to_string() }
                        span { class: "hidden sm:inline", "Sign out" }
                    }
                }
            }
        }
    }
}

#[component]
fn NavItem(icon: &'static str, label: &'static str, to: Route, active: bool) -> Element {
    let class = if active {
        "flex items-center gap-2 text-white font-semibold"
    } else {
        "flex items-center gap-2 text-zinc-400 hover:text-white transition-colors"
    };

    rsx! {
        Link { to, class,
            Icon { name: icon.to_string(), class: "w-4 h-4".to_string() }
            "{label}"
        }
    }
}
