//! Handler for alias creation endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{AliasResponse, ShortenRequest};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short alias for a URL.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/page",
///   "owner_id": "u1",
///   "custom_alias": "promo"      // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "code": "promo",
///   "short_url": "https://sho.rt/s/promo",
///   "target_url": "https://example.com/page",
///   "owner_id": "u1",
///   "created_at": 1718000000
/// }
/// ```
///
/// # Errors
///
/// - **400 Bad Request**: Malformed URL, owner or alias
/// - **409 Conflict**: Custom alias already exists
/// - **429 Too Many Requests**: Rate limit exceeded (see middleware)
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<AliasResponse>), AppError> {
    payload.validate()?;

    let created = state
        .alias_service
        .create(
            &payload.url,
            &payload.owner_id,
            payload.custom_alias.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}
