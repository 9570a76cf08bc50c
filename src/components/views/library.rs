use crate::api::*;
use crate::components::{Icon, ItemCard};
use crate::session::use_session;
use dioxus::prelude::*;

/// Case-insensitive title filter for the library grids.
fn filter_by_title(items: &[Item], query: &str) -> Vec<Item> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[component]
pub fn Movies() -> Element {
    rsx! {
        LibraryPage { kind: ItemKind::Movie, title: "Movies", icon: "film" }
    }
}

#[component]
pub fn Shows() -> Element {
    rsx! {
        LibraryPage { kind: ItemKind::Series, title: "TV Shows", icon: "tv" }
    }
}

#[component]
fn LibraryPage(kind: ItemKind, title: &'static str, icon: &'static str) -> Element {
    let session = use_session();
    let mut search_query = use_signal(String::new);

    let items = use_resource(move || {
        let client = session.client();
        async move {
            client
                .get_items(ItemQuery::of_kind(kind).with_limit(None))
                .await
        }
    });

    use_effect(move || {
        if let Some(Err(err)) = &*items.read() {
            if err.is_unauthorized() {
                session.logout();
            }
        }
    });

    rsx! {
        div { class: "pt-24 pb-16 px-4 md:px-12 space-y-6",
            header { class: "flex flex-col md:flex-row md:items-center md:justify-between gap-4",
                div { class: "flex items-center gap-3",
                    Icon { name: icon.to_string(), class: "w-7 h-7 text-red-600".to_string() }
                    h1 { class: "text-3xl font-bold text-white", "{title}" }
                }
                div { class: "relative w-full md:w-80",
                    Icon {
                        name: "search".to_string(),
                        class: "absolute left-3 top-1/2 -translate-y-1/2 w-4 h-4 text-zinc-500".to_string(),
                    }
                    input {
                        class: "w-full rounded bg-zinc-900 border border-zinc-800 pl-10 pr-4 py-2 text-sm text-white placeholder-zinc-500 focus:outline-none focus:border-red-600",
                        r#type: "text",
                        placeholder: "Filter by title",
                        value: "{search_query}",
                        oninput: move |e| search_query.set(e.value()),
                    }
                }
            }

            match items() {
                Some(Ok(items)) => {
                    let filtered = filter_by_title(&items, &search_query());
                    if filtered.is_empty() {
                        rsx! {
                            div { class: "flex flex-col items-center justify-center py-24 text-zinc-500",
                                Icon { name: icon.to_string(), class: "w-12 h-12 mb-3".to_string() }
                                if items.is_empty() {
                                    p { "Nothing here yet." }
                                } else {
                                    p { "No titles match \"{search_query}\"." }
                                }
                            }
                        }
                    } else {
                        rsx! {
                            div { class: "grid grid-cols-2 sm:grid-cols-3 md:grid-cols-4 lg:grid-cols-6 gap-4",
                                for item in filtered {
                                    ItemCard { key: "{item.id}", item, in_grid: true }
                                }
                            }
                        }
                    }
                }
                Some(Err(err)) => rsx! {
                    div { class: "flex flex-col items-center justify-center py-24 text-zinc-400",
                        Icon { name: "alert".to_string(), class: "w-10 h-10 mb-3 text-red-600".to_string() }
                        p { "Could not load {title}: {err}" }
                    }
                },
                None => rsx! {
                    div { class: "flex items-center justify-center py-24",
                        Icon { name: "loader".to_string(), class: "w-10 h-10 text-red-600".to_string() }
                    }
                },
            }
        }
    }
}
