//! Handler for short URL redirect.

use axum::{
    Extension,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect},
};
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /s/{code}`
///
/// # Request Flow
///
/// 1. Resolve the code (fast-path cache, then in-process index)
/// 2. Enqueue a click event for the background worker
/// 3. Return 307 Temporary Redirect
///
/// # Click Tracking
///
/// Click events are sent to a bounded channel for async processing.
/// If the queue is full, the click is dropped (fire-and-forget).
///
/// # Errors
///
/// Returns 404 Not Found if the code is malformed or unknown.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
) -> Result<impl IntoResponse, AppError> {
    let target_url = state.alias_service.resolve(&code).await?;

    let peer = connect_info.map(|Extension(ConnectInfo(addr))| addr);
    let click_event = ClickEvent::new(
        code,
        &client_ip(&headers, peer, state.trust_proxy_headers),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    match state.click_sender.try_send(click_event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            metrics::counter!("clicks_dropped_total").increment(1);
            warn!("Click queue full, dropping click for {}", event.code);
        }
        Err(TrySendError::Closed(event)) => {
            warn!("Click queue closed, dropping click for {}", event.code);
        }
    }

    Ok(Redirect::temporary(&target_url))
}
