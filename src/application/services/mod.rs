//! Business logic services for the application layer.

pub mod alias_service;
pub mod analytics_service;
pub mod rate_limiter;

pub use alias_service::AliasService;
pub use analytics_service::AnalyticsService;
pub use rate_limiter::{Admission, RateLimiter};
