//! DTOs for listing an owner's aliases.

use serde::{Deserialize, Serialize};

use crate::api::dto::shorten::AliasResponse;

/// Query parameters for `GET /api/owners/{owner_id}/links`.
#[derive(Debug, Default, Deserialize)]
pub struct LinksQuery {
    /// Attach each alias's all-time click count.
    #[serde(default)]
    pub include_clicks: bool,
}

#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub owner_id: String,
    pub total: usize,
    pub items: Vec<AliasResponse>,
}
