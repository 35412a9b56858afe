//! Handlers for per-alias statistics.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use serde_json::json;

use crate::api::dto::stats::{
    HourlyQuery, HourlyResponse, RankingQuery, ReferrersResponse, StatsResponse,
};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::code_generator::is_valid_code;

/// Returns click totals and the last seven days for one alias.
///
/// # Endpoint
///
/// `GET /api/stats/{code}`
///
/// # Response
///
/// ```json
/// {
///   "code": "abc123",
///   "total_clicks": 42,
///   "unique_clicks": 17,
///   "daily_clicks": [
///     { "date": "2024-03-05", "count": 5 },
///     { "date": "2024-03-04", "count": 0 }
///   ]
/// }
/// ```
///
/// Unknown codes report zeros.
///
/// # Errors
///
/// Returns 400 Bad Request if the code is malformed.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    check_code(&code)?;

    let stats = state.analytics_service.get_stats(&code).await;

    Ok(Json(StatsResponse {
        code,
        total_clicks: stats.total_clicks,
        unique_clicks: stats.unique_clicks,
        daily_clicks: stats.daily_clicks,
    }))
}

/// Returns the most frequent referrers for one alias.
///
/// # Endpoint
///
/// `GET /api/stats/{code}/referrers?limit=10`
pub async fn referrers_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<ReferrersResponse>, AppError> {
    check_code(&code)?;

    let items = state
        .analytics_service
        .top_referrers(&code, query.limit.unwrap_or(10))
        .await;

    Ok(Json(ReferrersResponse { code, items }))
}

/// Returns clicks per hour for one alias and day.
///
/// # Endpoint
///
/// `GET /api/stats/{code}/hourly?date=2024-03-05`
///
/// # Errors
///
/// Returns 400 Bad Request if the code or date is malformed.
pub async fn hourly_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<HourlyQuery>,
) -> Result<Json<HourlyResponse>, AppError> {
    check_code(&code)?;

    let date = match query.date.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::bad_request(
                "Invalid date, expected YYYY-MM-DD",
                json!({ "date": raw }),
            )
        })?,
        None => Utc::now().date_naive(),
    };

    let hours = state
        .analytics_service
        .hourly_distribution(&code, Some(date))
        .await;

    Ok(Json(HourlyResponse { code, date, hours }))
}

fn check_code(code: &str) -> Result<(), AppError> {
    if is_valid_code(code) {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "Invalid short code format",
            json!({ "code": code }),
        ))
    }
}
