use crate::api::feed::{backdrop_url, fetch_popular_movies, BackdropCycle, BACKDROP_ROTATION_SECS};
use crate::api::{ImageType, Item, ItemKind};
use crate::components::{sleep_ms, Icon, PosterImage, Route};
use crate::session::use_session;
use dioxus::prelude::*;

/// Poster card linking to the item's detail page.
#[component]
pub fn ItemCard(item: Item, #[props(default)] in_grid: bool) -> Element {
    let session = use_session();
    let poster = session.client().image_url(&item.id, ImageType::Primary);
    let year = item.year().map(|year| year.to_string()).unwrap_or_default();
    let resume = item.resume_fraction().map(|fraction| fraction * 100.0);
    let target = Route::Details {
        id: item.id.clone(),
    };

    rsx! {
        Link {
            to: target,
            class: if in_grid { "group relative block" } else { "group relative flex-none w-36 sm:w-44 md:w-48 snap-start" },
            div { class: "relative aspect-[2/3] overflow-hidden rounded-md bg-zinc-900",
                PosterImage {
                    src: poster,
                    alt: item.name.clone(),
                    class: "w-full h-full object-cover transition-transform duration-300 group-hover:scale-105".to_string(),
                }
                if let Some(percent) = resume {
                    div { class: "absolute bottom-0 inset-x-0 h-1 bg-zinc-700",
                        div { class: "h-full bg-red-600", style: "width: {percent:.0}%" }
                    }
                }
            }
            p { class: "mt-2 text-sm text-zinc-200 truncate", "{item.name}" }
            if !year.is_empty() {
                p { class: "text-xs text-zinc-500", "{year}" }
            }
        }
    }
}

/// Titled horizontal row of item cards.
#[component]
pub fn ContentCarousel(title: String, items: Vec<Item>) -> Element {
    if items.is_empty() {
        return rsx! {};
    }

    rsx! {
        section { class: "space-y-3",
            h2 { class: "px-4 md:px-12 text-lg md:text-xl font-semibold text-white", "{title}" }
            div { class: "flex gap-3 overflow-x-auto snap-x px-4 md:px-12 pb-2 scrollbar-hide",
                for item in items {
                    ItemCard { key: "{item.id}", item: item.clone() }
                }
            }
        }
    }
}

/// Hero banner for the home page.
#[component]
pub fn FeaturedContent(item: Item) -> Element {
    let session = use_session();
    let client = session.client();
    let backdrop = client
        .image_url(&item.id, ImageType::Backdrop)
        .filter(|_| item.has_backdrop());
    let overview = item.overview.clone().unwrap_or_default();
    let kind_label = match item.kind {
        ItemKind::Series => "Series",
        _ => "Movie",
    };
    let year = item.year().map(|year| year.to_string()).unwrap_or_default();
    let runtime = item.runtime_label().unwrap_or_default();

    rsx! {
        section { class: "relative h-[70vh] min-h-[420px] w-full overflow-hidden",
            PosterImage {
                src: backdrop,
                alt: item.name.clone(),
                class: "absolute inset-0 w-full h-full object-cover".to_string(),
                lazy: false,
            }
            div { class: "absolute inset-0 bg-gradient-to-r from-black via-black/60 to-transparent" }
            div { class: "absolute inset-0 bg-gradient-to-t from-black via-transparent to-transparent" }
            div { class: "relative z-10 flex h-full flex-col justify-end gap-4 px-4 md:px-12 pb-16 max-w-2xl",
                span { class: "text-xs uppercase tracking-widest text-red-500 font-semibold", "{kind_label}" }
                h1 { class: "text-4xl md:text-6xl font-extrabold text-white", "{item.name}" }
                div { class: "flex gap-3 text-sm text-zinc-300",
                    if !year.is_empty() {
                        span { "{year}" }
                    }
                    if !runtime.is_empty() {
                        span { "{runtime}" }
                    }
                }
                if !overview.is_empty() {
                    p { class: "text-sm md:text-base text-zinc-300 line-clamp-3", "{overview}" }
                }
                div { class: "flex gap-3",
                    Link {
                        to: Route::Watch { id: item.id.clone() },
                        class: "flex items-center gap-2 rounded bg-white px-6 py-2 font-semibold text-black hover:bg-zinc-200 transition-colors",
                        Icon { name: "play".to_string(), class: "w-5 h-5".to_string() }
                        "Play"
                    }
                    Link {
                        to: Route::Details { id: item.id.clone() },
                        class: "flex items-center gap-2 rounded bg-zinc-500/60 px-6 py-2 font-semibold text-white hover:bg-zinc-500/80 transition-colors",
                        Icon { name: "info".to_string(), class: "w-5 h-5".to_string() }
                        "More info"
                    }
                }
            }
        }
    }
}

/// Rotating backdrops from the popular-movies feed, behind the login form.
#[component]
pub fn MovieBackground() -> Element {
    let session = use_session();
    let mut cycle = use_signal(BackdropCycle::default);

    let backdrops = use_resource(move || {
        let config = session.state.read().config().clone();
        async move {
            match fetch_popular_movies(&config).await {
                Ok(movies) => movies
                    .iter()
                    .filter_map(|movie| movie.backdrop_path.as_deref().and_then(backdrop_url))
                    .collect::<Vec<String>>(),
                Err(err) => {
                    tracing::warn!("login backdrops unavailable: {err}");
                    Vec::new()
                }
            }
        }
    });

    use_effect(move || {
        let len = backdrops.read().as_ref().map(Vec::len).unwrap_or(0);
        cycle.set(BackdropCycle::new(len));
    });

    use_future(move || async move {
        loop {
            sleep_ms((BACKDROP_ROTATION_SECS * 1000) as u32).await;
            cycle.write().advance();
        }
    });

    let urls = backdrops.read().clone().unwrap_or_default();
    let current = cycle().current();

    rsx! {
        div { class: "absolute inset-0 overflow-hidden bg-gradient-to-br from-zinc-900 via-black to-red-950",
            for (index, url) in urls.into_iter().enumerate() {
                div {
                    key: "{url}",
                    class: if current == Some(index) { "absolute inset-0 bg-cover bg-center transition-opacity duration-1000 opacity-100" } else { "absolute inset-0 bg-cover bg-center transition-opacity duration-1000 opacity-0" },
                    style: "background-image: url('{url}')",
                }
            }
            div { class: "absolute inset-0 bg-black/60" }
        }
    }
}
