//! Click event model for asynchronous click tracking.

use chrono::{DateTime, Utc};

/// Maximum stored length of a client address, in bytes.
pub const MAX_CLIENT_IP_BYTES: usize = 45;

/// Maximum stored length of the user agent and referrer, in bytes.
pub const MAX_HEADER_BYTES: usize = 500;

/// A single resolution of an alias, carried from the redirect handler to the
/// aggregator.
///
/// Fields are truncated on construction so that oversized headers never reach
/// the store. Events are transient: the aggregator folds them into counters and
/// drops them.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub code: String,
    pub client_ip: String,
    pub user_agent: String,
    pub referrer: String,
    pub timestamp: DateTime<Utc>,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    ///
    /// Missing headers become empty strings; an empty referrer is not ranked.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let event = ClickEvent::new(
    ///     "abc123".to_string(),
    ///     "192.168.1.1",
    ///     Some("Mozilla/5.0"),
    ///     Some("https://google.com"),
    /// );
    /// ```
    pub fn new(
        code: String,
        client_ip: &str,
        user_agent: Option<&str>,
        referrer: Option<&str>,
    ) -> Self {
        Self::at(code, client_ip, user_agent, referrer, Utc::now())
    }

    /// Creates a click event with an explicit timestamp.
    pub fn at(
        code: String,
        client_ip: &str,
        user_agent: Option<&str>,
        referrer: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            client_ip: truncate_bytes(client_ip, MAX_CLIENT_IP_BYTES).to_string(),
            user_agent: truncate_bytes(user_agent.unwrap_or_default(), MAX_HEADER_BYTES)
                .to_string(),
            referrer: truncate_bytes(referrer.unwrap_or_default(), MAX_HEADER_BYTES).to_string(),
            timestamp,
        }
    }
}

/// Cuts `value` to at most `max` bytes without splitting a UTF-8 sequence.
fn truncate_bytes(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }

    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
