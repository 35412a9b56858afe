//! Rate limiting middleware backed by the shared store.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;

use crate::application::services::Admission;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Applies the fixed-window limit to the wrapped routes.
///
/// # Key Extraction
///
/// Requests are counted per client IP: the first `X-Forwarded-For` entry,
/// then `X-Real-IP` (only when proxy headers are trusted), then the socket
/// peer address.
///
/// # Responses
///
/// Every response carries `X-RateLimit-Limit` and `X-RateLimit-Remaining`.
/// Requests over the limit receive `429 Too Many Requests` without reaching
/// the handler. When the store is unreachable the limiter's failure policy
/// applies (fail-closed by default, `503 Service Unavailable`).
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_ip(req.headers(), peer, st.trust_proxy_headers);

    let admission = match st.rate_limiter.admit(&client).await {
        Ok(admission) => admission,
        Err(e) => return e.into_response(),
    };

    let mut response = if admission.allowed {
        next.run(req).await
    } else {
        AppError::rate_limited(
            "Too many requests",
            json!({ "limit": admission.limit, "remaining": 0 }),
        )
        .into_response()
    };

    set_headers(&mut response, admission);
    response
}

fn set_headers(response: &mut Response, admission: Admission) {
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(admission.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(admission.remaining));
}
