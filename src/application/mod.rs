//! Application layer services implementing the data path.
//!
//! Services consume the [`crate::domain::repositories::KvStore`] trait and
//! provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::alias_service::AliasService`] - Alias creation, lookup and startup recovery
//! - [`services::analytics_service::AnalyticsService`] - Click aggregation and rankings
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window admission control

pub mod services;
