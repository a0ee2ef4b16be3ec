pub mod crawler;
pub mod error;
pub mod url_handler;
pub mod utils;

pub use crawler::Crawler;
pub use error::Error;
pub use url_handler::LinkFilter;

// From https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#method.user_agent
pub const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/dastarruer/search-engine/)"
);
