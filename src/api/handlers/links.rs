//! Handler for listing an owner's aliases.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::links::{LinksQuery, LinksResponse};
use crate::api::dto::shorten::AliasResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the aliases created by one owner, newest first.
///
/// # Endpoint
///
/// `GET /api/owners/{owner_id}/links?include_clicks=true`
///
/// With `include_clicks`, each item carries its all-time click count.
pub async fn owner_links_handler(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    Query(query): Query<LinksQuery>,
) -> Result<Json<LinksResponse>, AppError> {
    let aliases = state.alias_service.list_by_owner(&owner_id).await;

    let mut items = Vec::with_capacity(aliases.len());
    for created in aliases {
        let mut item = AliasResponse::from(created);
        if query.include_clicks {
            item.total_clicks = Some(state.analytics_service.total_clicks(&item.code).await);
        }
        items.push(item);
    }

    Ok(Json(LinksResponse {
        owner_id,
        total: items.len(),
        items,
    }))
}
