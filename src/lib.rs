//! # Shortlink
//!
//! The stateful data path of a URL shortener: alias storage with a fast-path
//! cache and startup recovery, click aggregation over several time
//! granularities, and store-backed admission control. Built with Axum and Redis.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Entities, store key layout, the store trait, click worker
//! - **Application Layer** ([`application`]) - Alias store, click aggregator, rate limiter
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis and in-process store implementations
//! - **API Layer** ([`api`]) - REST API handlers, DTOs, and middleware
//!
//! ## Quick Start
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379"  # Optional, in-process store otherwise
//! export BASE_URL="https://sho.rt"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AliasService, AnalyticsService, RateLimiter};
    pub use crate::domain::click_event::ClickEvent;
    pub use crate::domain::entities::{AliasRecord, ClickStats, CreatedAlias, TopPeriod};
    pub use crate::domain::repositories::KvStore;
    pub use crate::error::AppError;
    pub use crate::infrastructure::store::MemoryStore;
    pub use crate::state::AppState;
}
