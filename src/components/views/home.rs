use crate::api::*;
use crate::components::{ContentCarousel, FeaturedContent, Icon};
use crate::session::use_session;
use dioxus::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Default)]
struct HomeRows {
    continue_watching: Vec<Item>,
    movies: Vec<Item>,
    series: Vec<Item>,
}

/// Picks the hero item from the movie and series rows.
fn pick_featured<R: Rng + ?Sized>(movies: &[Item], series: &[Item], rng: &mut R) -> Option<Item> {
    let pool: Vec<&Item> = movies.iter().chain(series.iter()).collect();
    pool.choose(rng).map(|item| (*item).clone())
}

async fn load_rows(client: JellyfinClient) -> Result<HomeRows, ApiError> {
    let (resumable, movies, series) = futures_util::join!(
        client.get_items(ItemQuery::continue_watching()),
        client.get_items(ItemQuery::of_kind(ItemKind::Movie)),
        client.get_items(ItemQuery::of_kind(ItemKind::Series)),
    );

    // Resume state is optional; the libraries are not.
    let continue_watching = resumable.unwrap_or_else(|err| {
        tracing::warn!("continue watching unavailable: {err}");
        Vec::new()
    });

    Ok(HomeRows {
        continue_watching,
        movies: movies?,
        series: series?,
    })
}

#[component]
pub fn Home() -> Element {
    let session = use_session();

    let rows = use_resource(move || {
        let client = session.client();
        async move { load_rows(client).await }
    });

    let featured = use_memo(move || match &*rows.read() {
        Some(Ok(rows)) => pick_featured(&rows.movies, &rows.series, &mut rand::thread_rng()),
        _ => None,
    });

    use_effect(move || {
        if let Some(Err(err)) = &*rows.read() {
            tracing::error!("home catalog failed, signing out: {err}");
            session.logout();
        }
    });

    match rows() {
        Some(Ok(rows)) => rsx! {
            div { class: "pb-16",
                if let Some(item) = featured() {
                    FeaturedContent { item }
                } else {
                    div { class: "h-24" }
                }
                div { class: "relative z-10 -mt-16 space-y-10",
                    ContentCarousel {
                        title: "Continue Watching".to_string(),
                        items: rows.continue_watching.clone(),
                    }
                    ContentCarousel { title: "Movies".to_string(), items: rows.movies.clone() }
                    ContentCarousel { title: "TV Shows".to_string(), items: rows.series.clone() }
                }
                if rows.movies.is_empty() && rows.series.is_empty() {
                    div { class: "flex flex-col items-center justify-center py-24 text-zinc-500",
                        Icon { name: "film".to_string(), class: "w-12 h-12 mb-3".to_string() }
                        p { "Your libraries are empty." }
                    }
                }
            }
        },
        Some(Err(_)) => rsx! {},
        None => rsx! {
            div { class: "min-h-screen flex items-center justify-center",
                Icon { name: "loader".to_string(), class: "w-10 h-10 text-red-600".to_string() }
            }
        },
    }
}
