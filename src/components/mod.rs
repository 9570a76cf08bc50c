//! The components module contains all shared components for our app.

mod app;
mod app_view;
mod cached_image;
mod catalog;
mod icons;
mod navbar;
mod player;
mod timer;
mod views;

pub use app::*;
pub use app_view::*;
pub use cached_image::*;
pub use catalog::*;
pub use icons::*;
pub use navbar::*;
pub use player::*;
pub use timer::*;
// Views are reached through `Route`.
