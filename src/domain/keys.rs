//! External-store key layout and retention windows.
//!
//! All keys are colon-namespaced strings. Durable alias records never expire;
//! everything else carries a TTL that is re-armed on write.

use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;

const DAY: u64 = 24 * 60 * 60;

/// Prefix of durable alias records, scanned at startup.
pub const DURABLE_PREFIX: &str = "urldata:";

/// Prefix of the fast-path URL cache.
pub const CACHE_PREFIX: &str = "url:";

/// All-time global ranking. Never expires.
pub const GLOBAL_ALL_TIME: &str = "clicks:global:sorted";

/// Retention of the fast-path cache entry.
pub const CACHE_TTL: Duration = Duration::from_secs(DAY);

/// Retention of per-alias click aggregates.
pub const CLICK_RETENTION: Duration = Duration::from_secs(30 * DAY);

/// Retention of a weekly global ranking.
pub const WEEKLY_RETENTION: Duration = Duration::from_secs(90 * DAY);

/// Retention of a monthly global ranking.
pub const MONTHLY_RETENTION: Duration = Duration::from_secs(180 * DAY);

pub fn durable(code: &str) -> String {
    format!("{DURABLE_PREFIX}{code}")
}

pub fn cache(code: &str) -> String {
    format!("{CACHE_PREFIX}{code}")
}

pub fn total_clicks(code: &str) -> String {
    format!("clicks:total:{code}")
}

pub fn unique_visitors(code: &str) -> String {
    format!("clicks:unique:{code}")
}

/// `clicks:daily:<code>:<YYYY-MM-DD>`
pub fn daily_clicks(code: &str, date: NaiveDate) -> String {
    format!("clicks:daily:{code}:{}", date.format("%Y-%m-%d"))
}

/// `clicks:hourly:<code>:<YYYY-MM-DD-HH>`
pub fn hourly_clicks(code: &str, date: NaiveDate, hour: u32) -> String {
    format!("clicks:hourly:{code}:{}-{hour:02}", date.format("%Y-%m-%d"))
}

pub fn referrers(code: &str) -> String {
    format!("clicks:referers:{code}")
}

/// Weekly ranking keyed by ISO week-based year and week number.
pub fn global_week(at: DateTime<Utc>) -> String {
    format!("clicks:global:week:{}", at.format("%G-W%V"))
}

pub fn global_month(at: DateTime<Utc>) -> String {
    format!("clicks:global:month:{}", at.format("%Y-%m"))
}

pub fn rate_limit(client: &str) -> String {
    format!("rate_limit:{client}")
}
