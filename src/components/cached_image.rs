use dioxus::prelude::*;

pub const PLACEHOLDER_IMAGE: Asset = asset!("/assets/placeholder.svg");

/// Poster or backdrop image. A missing URL or a failed load renders the
/// placeholder instead.
#[component]
pub fn PosterImage(
    src: Option<String>,
    alt: String,
    class: String,
    #[props(default = true)] lazy: bool,
) -> Element {
    // URL that last failed; a new `src` gets a fresh attempt.
    let mut failed_src = use_signal(|| None::<String>);

    let resolved = match src.as_deref() {
        Some(url) if !url.is_empty() && failed_src().as_deref() != Some(url) => url.to_string(),
        _ => PLACEHOLDER_IMAGE.to_string(),
    };

    rsx! {
        img {
            src: "{resolved}",
            alt: "{alt}",
            class: "{class}",
            loading: if lazy { "lazy" } else { "eager" },
            onerror: move |_| {
                if let Some(url) = src.clone() {
                    if failed_src.peek().as_deref() != Some(url.as_str()) {
                        tracing::debug!(%url, "image failed to load, using placeholder");
                        failed_src.set(Some(url));
                    }
                }
            },
        }
    }
}
