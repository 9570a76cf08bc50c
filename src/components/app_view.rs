//! Routes and the session gate in front of them.

use crate::components::views::{Details, Home, Login, Movies, NotFound, Root, Shows, Watch};
use crate::components::AppShell;
use crate::session::SessionStatus;
use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum Route {
    #[layout(AppShell)]
        #[route("/")]
        Root {},
        #[route("/login")]
        Login {},
        #[route("/home")]
        Home {},
        #[route("/movies")]
        Movies {},
        #[route("/shows")]
        Shows {},
        #[route("/details/:id")]
        Details { id: String },
        #[route("/watch/:id")]
        Watch { id: String },
    #[end_layout]
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

impl Route {
    /// Routes that render the top navigation bar.
    pub fn shows_navbar(&self) -> bool {
        matches!(
            self,
            Route::Home {} | Route::Movies {} | Route::Shows {} | Route::Details { .. }
        )
    }

    fn requires_session(&self) -> bool {
        !matches!(self, Route::Root {} | Route::Login {} | Route::NotFound { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    Render,
    /// Stored credentials are still being verified.
    Wait,
    Redirect(Route),
}

pub fn gate(route: &Route, status: SessionStatus) -> Gate {
    match (route, status) {
        (_, SessionStatus::Restoring) => Gate::Wait,
        (Route::Root {}, SessionStatus::SignedIn) | (Route::Login {}, SessionStatus::SignedIn) => {
            Gate::Redirect(Route::Home {})
        }
        (Route::Root {}, SessionStatus::SignedOut) => Gate::Redirect(Route::Login {}),
        (route, SessionStatus::SignedOut) if route.requires_session() => {
            Gate::Redirect(Route::Login {})
        }
        _ => Gate::Render,
    }
}

pub fn view_label(route: &Route) -> &'static str {
    match route {
        Route::Root {} => "Flix",
        Route::Login {} => "Sign in",
        Route::Home {} => "Home",
        Route::Movies {} => "Movies",
        Route::Shows {} => "TV Shows",
        Route::Details { .. } => "Details",
        Route::Watch { .. } => "Watch",
        Route::NotFound { .. } => "Not found",
    }
}
