use crate::api::ApiError;
use crate::components::{Icon, MovieBackground, Route};
use crate::session::use_session;
use dioxus::prelude::*;

fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::AuthenticationFailed(_) => "Incorrect username or password.".to_string(),
        ApiError::Network(_) => "Could not reach the server. Check the address and try again.".to_string(),
        other => other.to_string(),
    }
}

#[component]
pub fn Login() -> Element {
    let session = use_session();
    let navigator = use_navigator();

    let mut username = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut server_url = use_signal(|| session.state.peek().config().server_url.clone());
    let mut show_server = use_signal(|| false);
    let mut error = use_signal(|| None::<String>);
    let mut submitting = use_signal(|| false);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        if submitting() {
            return;
        }

        let user = username().trim().to_string();
        if user.is_empty() {
            error.set(Some("Enter your username.".to_string()));
            return;
        }

        if let Err(err) = session.set_server_url(server_url().trim()) {
            tracing::warn!("could not save server address: {err}");
        }

        submitting.set(true);
        error.set(None);
        let pass = password();
        spawn(async move {
            match session.login(user, pass).await {
                Ok(()) => {
                    navigator.replace(Route::Home {});
                }
                Err(err) => {
                    tracing::warn!("login failed: {err}");
                    error.set(Some(login_error_message(&err)));
                }
            }
            submitting.set(false);
        });
    };

    rsx! {
        div { class: "relative min-h-screen flex items-center justify-center px-4",
            MovieBackground {}
            div { class: "absolute top-6 left-6 md:left-12 z-10 text-3xl font-extrabold tracking-tight text-red-600",
                "FLIX"
            }
            form {
                class: "relative z-10 w-full max-w-md space-y-5 rounded-lg bg-black/75 p-8 md:p-12",
                onsubmit: on_submit,
                h1 { class: "text-3xl font-bold text-white", "Sign In" }
                if let Some(message) = error() {
                    div { class: "flex items-start gap-2 rounded bg-orange-600/90 px-4 py-3 text-sm text-white",
                        Icon { name: "alert".to_string(), class: "w-4 h-4 mt-0.5 flex-none".to_string() }
                        span { "{message}" }
                    }
                }
                input {
                    class: "w-full rounded bg-zinc-800 px-4 py-3 text-white placeholder-zinc-500 focus:outline-none focus:ring-2 focus:ring-red-600",
                    r#type: "text",
                    autocomplete: "username",
                    placeholder: "Username",
                    value: "{username}",
                    oninput: move |e| username.set(e.value()),
                }
                input {
                    class: "w-full rounded bg-zinc-800 px-4 py-3 text-white placeholder-zinc-500 focus:outline-none focus:ring-2 focus:ring-red-600",
                    r#type: "password",
                    autocomplete: "current-password",
                    placeholder: "Password",
                    value: "{password}",
                    oninput: move |e| password.set(e.value()),
                }
                if show_server() {
                    input {
                        class: "w-full rounded bg-zinc-800 px-4 py-3 text-white placeholder-zinc-500 focus:outline-none focus:ring-2 focus:ring-red-600",
                        r#type: "url",
                        placeholder: "http://localhost:8096",
                        value: "{server_url}",
                        oninput: move |e| server_url.set(e.value()),
                    }
                }
                button {
                    class: "w-full rounded bg-red-600 py-3 font-semibold text-white hover:bg-red-700 disabled:opacity-60 transition-colors",
                    r#type: "submit",
                    disabled: submitting(),
                    if submitting() {
                        "Signing in..."
                    } else {
                        "Sign In"
                    }
                }
                button {
                    class: "text-sm text-zinc-400 hover:text-white",
                    r#type: "button",
                    onclick: move |_| show_server.toggle(),
                    if show_server() {
                        "Hide server settings"
                    } else {
                        "Server: {server_url}"
                    }
                }
            }
        }
    }
}
