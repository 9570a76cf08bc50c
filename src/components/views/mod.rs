mod details;
mod home;
mod library;
mod login;
mod root;
mod watch;

pub use details::Details;
pub use home::Home;
pub use library::{Movies, Shows};
pub use login::Login;
pub use root::{NotFound, Root};
pub use watch::Watch;
