//! Handler for the global alias ranking.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::stats::{RankingQuery, TopResponse};
use crate::domain::entities::TopPeriod;
use crate::state::AppState;

/// Returns the most clicked aliases.
///
/// # Endpoint
///
/// `GET /api/top?period=week&limit=10`
///
/// `period` is `all`, `week` or `month`; anything else means `all`.
/// `limit` defaults to 10 and is capped at 100.
pub async fn top_handler(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
) -> Json<TopResponse> {
    let period = TopPeriod::from_param(query.period.as_deref());

    let items = state
        .analytics_service
        .top_aliases(period, query.limit.unwrap_or(10))
        .await;

    Json(TopResponse {
        period: period.as_str(),
        items,
    })
}
