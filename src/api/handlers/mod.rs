//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod redirect;
pub mod shorten;
pub mod stats;
pub mod top;

pub use health::health_handler;
pub use links::owner_links_handler;
pub use redirect::redirect_handler;
pub use shorten::shorten_handler;
pub use stats::{hourly_handler, referrers_handler, stats_handler};
pub use top::top_handler;
