use crate::api::*;
use crate::components::{Icon, PosterImage, Route};
use crate::session::use_session;
use dioxus::prelude::*;
use std::collections::HashMap;

#[component]
pub fn Details(id: String) -> Element {
    let session = use_session();
    let navigator = use_navigator();

    let details = use_resource(use_reactive!(|(id,)| {
        let client = session.client();
        async move { client.get_item_details(&id).await }
    }));

    match details() {
        Some(Ok(details)) => rsx! {
            DetailsHero { details: details.clone() }
            if details.item.kind == ItemKind::Series {
                SeasonList { series_id: details.item.id.clone() }
            }
        },
        Some(Err(err)) => rsx! {
            div { class: "min-h-screen flex flex-col items-center justify-center gap-4 text-zinc-400",
                Icon { name: "alert".to_string(), class: "w-12 h-12 text-red-600".to_string() }
                p { "Could not load this title: {err}" }
                button {
                    class: "rounded bg-zinc-800 px-5 py-2 text-white hover:bg-zinc-700",
                    onclick: move |_| {
                        navigator.go_back();
                    },
                    "Go back"
                }
            }
        },
        None => rsx! {
            div { class: "min-h-screen flex items-center justify-center",
                Icon { name: "loader".to_string(), class: "w-10 h-10 text-red-600".to_string() }
            }
        },
    }
}

#[component]
fn DetailsHero(details: ItemDetails) -> Element {
    let item = &details.item;
    let year = item.year().map(|year| year.to_string());
    let runtime = item.runtime_label();
    let rating = item.community_rating.map(|rating| format!("{rating:.1}"));
    let genres = item.genres.join(" · ");
    let overview = item.overview.clone().unwrap_or_default();
    let play_target = Route::Watch {
        id: item.id.clone(),
    };

    rsx! {
        section { class: "relative min-h-[75vh] w-full overflow-hidden",
            PosterImage {
                src: details.backdrop_image_url.clone(),
                alt: item.name.clone(),
                class: "absolute inset-0 w-full h-full object-cover".to_string(),
                lazy: false,
            }
            div { class: "absolute inset-0 bg-gradient-to-r from-black via-black/70 to-black/20" }
            div { class: "absolute inset-0 bg-gradient-to-t from-black via-transparent to-transparent" }
            div { class: "relative z-10 flex flex-col md:flex-row gap-8 px-4 md:px-12 pt-28 pb-12",
                div { class: "w-48 md:w-64 flex-none aspect-[2/3] overflow-hidden rounded-lg shadow-2xl bg-zinc-900",
                    PosterImage {
                        src: details.primary_image_url.clone(),
                        alt: item.name.clone(),
                        class: "w-full h-full object-cover".to_string(),
                        lazy: false,
                    }
                }
                div { class: "flex flex-col justify-end gap-4 max-w-2xl",
                    h1 { class: "text-4xl md:text-5xl font-extrabold text-white", "{item.name}" }
                    div { class: "flex flex-wrap items-center gap-3 text-sm text-zinc-300",
                        if let Some(year) = year {
                            span { "{year}" }
                        }
                        if let Some(official) = item.official_rating.clone() {
                            span { class: "border border-zinc-500 px-1.5 text-xs", "{official}" }
                        }
                        if let Some(runtime) = runtime {
                            span { "{runtime}" }
                        }
                        if let Some(rating) = rating {
                            span { class: "text-yellow-400", "★ {rating}" }
                        }
                    }
                    if !genres.is_empty() {
                        p { class: "text-sm text-zinc-400", "{genres}" }
                    }
                    if !overview.is_empty() {
                        p { class: "text-base text-zinc-200 leading-relaxed", "{overview}" }
                    }
                    if item.kind != ItemKind::Series {
                        div {
                            Link {
                                to: play_target,
                                class: "inline-flex items-center gap-2 rounded bg-white px-8 py-3 font-semibold text-black hover:bg-zinc-200 transition-colors",
                                Icon { name: "play".to_string(), class: "w-5 h-5".to_string() }
                                "Play"
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn SeasonList(series_id: String) -> Element {
    let session = use_session();
    let mut expanded = use_signal(|| None::<String>);
    let mut episodes = use_signal(HashMap::<String, Vec<Item>>::new);
    let mut loading = use_signal(|| None::<String>);

    let series_key = series_id.clone();
    let seasons = use_resource(use_reactive!(|(series_key,)| {
        let client = session.client();
        async move { client.get_seasons(&series_key).await }
    }));

    let toggle_season = use_callback(move |season_id: String| {
        if expanded().as_deref() == Some(season_id.as_str()) {
            expanded.set(None);
            return;
        }
        expanded.set(Some(season_id.clone()));
        if episodes.peek().contains_key(&season_id) {
            return;
        }

        let client = session.client();
        let series_id = series_id.clone();
        loading.set(Some(season_id.clone()));
        spawn(async move {
            match client.get_season_episodes(&series_id, &season_id).await {
                Ok(list) => {
                    episodes.write().insert(season_id.clone(), list);
                }
                Err(err) => tracing::warn!(season = %season_id, "episodes unavailable: {err}"),
            }
            if loading.peek().as_deref() == Some(season_id.as_str()) {
                loading.set(None);
            }
        });
    });

    let seasons = match seasons() {
        Some(Ok(seasons)) => seasons,
        Some(Err(err)) => {
            tracing::warn!("seasons unavailable: {err}");
            return rsx! {};
        }
        None => {
            return rsx! {
                div { class: "flex justify-center py-12",
                    Icon { name: "loader".to_string(), class: "w-8 h-8 text-red-600".to_string() }
                }
            };
        }
    };

    rsx! {
        section { class: "px-4 md:px-12 pb-16 space-y-3",
            h2 { class: "text-2xl font-semibold text-white mb-4", "Seasons" }
            for season in seasons {
                {
                    let season_id = season.id.clone();
                    let is_open = expanded().as_deref() == Some(season.id.as_str());
                    let is_loading = loading().as_deref() == Some(season.id.as_str());
                    let cached = episodes.read().get(&season.id).cloned();
                    rsx! {
                        div { key: "{season.id}", class: "rounded-lg bg-zinc-900/80 overflow-hidden",
                            button {
                                class: "w-full flex items-center justify-between px-5 py-4 text-left hover:bg-zinc-800 transition-colors",
                                onclick: move |_| toggle_season.call(season_id.clone()),
                                span { class: "font-medium text-white", "{season.name}" }
                                Icon {
                                    name: if is_open { "chevron-left".to_string() } else { "chevron-right".to_string() },
                                    class: "w-5 h-5 text-zinc-400".to_string(),
                                }
                            }
                            if is_open {
                                if is_loading && cached.is_none() {
                                    div { class: "flex justify-center py-6",
                                        Icon { name: "loader".to_string(), class: "w-6 h-6 text-red-600".to_string() }
                                    }
                                } else if let Some(list) = cached {
                                    EpisodeList { episodes: list }
                                } else {
                                    p { class: "px-5 py-4 text-sm text-zinc-500", "Episodes could not be loaded." }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn EpisodeList(episodes: Vec<Item>) -> Element {
    let session = use_session();
    let client = session.client();

    if episodes.is_empty() {
        return rsx! {
            p { class: "px-5 py-4 text-sm text-zinc-500", "No episodes." }
        };
    }

    rsx! {
        ul { class: "divide-y divide-zinc-800",
            for episode in episodes {
                {
                    let thumb = client.image_url(&episode.id, ImageType::Primary);
                    let number = episode.index_number.map(|n| format!("{n}. ")).unwrap_or_default();
                    let runtime = episode.runtime_label().unwrap_or_default();
                    let overview = episode.overview.clone().unwrap_or_default();
                    let resume = episode.resume_fraction().map(|fraction| fraction * 100.0);
                    rsx! {
                        li { key: "{episode.id}",
                            Link {
                                to: Route::Watch { id: episode.id.clone() },
                                class: "flex gap-4 px-5 py-4 hover:bg-zinc-800/70 transition-colors",
                                div { class: "relative w-40 flex-none aspect-video overflow-hidden rounded bg-zinc-800",
                                    PosterImage {
                                        src: thumb,
                                        alt: episode.name.clone(),
                                        class: "w-full h-full object-cover".to_string(),
                                    }
                                    if let Some(percent) = resume {
                                        div { class: "absolute bottom-0 inset-x-0 h-1 bg-zinc-700",
                                            div { class: "h-full bg-red-600", style: "width: {percent:.0}%" }
                                        }
                                    }
                                }
                                div { class: "min-w-0 space-y-1",
                                    div { class: "flex items-baseline gap-3",
                                        p { class: "font-medium text-white truncate", "{number}{episode.name}" }
                                        if !runtime.is_empty() {
                                            span { class: "text-xs text-zinc-500 flex-none", "{runtime}" }
                                        }
                                    }
                                    if !overview.is_empty() {
                                        p { class: "text-sm text-zinc-400 line-clamp-2", "{overview}" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
