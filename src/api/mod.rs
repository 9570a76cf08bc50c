pub mod error;
pub mod feed;
pub mod jellyfin;
pub mod models;

pub use error::ApiError;
pub use jellyfin::{ImageType, ItemQuery, JellyfinClient, SignedIn};
pub use models::*;
