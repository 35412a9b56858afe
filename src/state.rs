//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AliasService, AnalyticsService, RateLimiter};
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::KvStore;

#[derive(Clone)]
pub struct AppState {
    pub alias_service: Arc<AliasService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub store: Arc<dyn KvStore>,
    pub click_sender: mpsc::Sender<ClickEvent>,
    /// Read client IP from forwarding headers instead of the peer address.
    pub trust_proxy_headers: bool,
}

impl AppState {
    pub fn new(
        alias_service: Arc<AliasService>,
        analytics_service: Arc<AnalyticsService>,
        rate_limiter: Arc<RateLimiter>,
        store: Arc<dyn KvStore>,
        click_sender: mpsc::Sender<ClickEvent>,
        trust_proxy_headers: bool,
    ) -> Self {
        Self {
            alias_service,
            analytics_service,
            rate_limiter,
            store,
            click_sender,
            trust_proxy_headers,
        }
    }
}
