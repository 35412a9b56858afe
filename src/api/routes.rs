//! API route configuration.
//!
//! Only alias creation is rate limited; reads are served unthrottled.

use crate::api::handlers::{
    hourly_handler, owner_links_handler, referrers_handler, shorten_handler, stats_handler,
    top_handler,
};
use crate::api::middleware::rate_limit;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// All API routes.
///
/// # Endpoints
///
/// - `POST /shorten`                   - Create an alias (rate limited)
/// - `GET  /owners/{owner_id}/links`   - Aliases of one owner
/// - `GET  /stats/{code}`              - Click totals and daily series
/// - `GET  /stats/{code}/referrers`    - Top referrers
/// - `GET  /stats/{code}/hourly`       - Hourly distribution for a day
/// - `GET  /top`                       - Global ranking
pub fn api_routes(state: AppState) -> Router<AppState> {
    let limited = Router::new()
        .route("/shorten", post(shorten_handler))
        .route_layer(middleware::from_fn_with_state(state, rate_limit::layer));

    Router::new()
        .merge(limited)
        .route("/owners/{owner_id}/links", get(owner_links_handler))
        .route("/stats/{code}", get(stats_handler))
        .route("/stats/{code}/referrers", get(referrers_handler))
        .route("/stats/{code}/hourly", get(hourly_handler))
        .route("/top", get(top_handler))
}
