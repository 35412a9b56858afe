//! DTOs for the alias creation endpoint.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::CreatedAlias;

/// Compiled regex for custom alias validation.
static CUSTOM_ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Request to create one alias.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// Target URL (absolute http/https).
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Creator of the alias, supplied by the authenticating gateway.
    #[validate(length(min = 1, max = 128, message = "Owner id must be 1-128 characters"))]
    pub owner_id: String,

    /// Optional caller-chosen code. An empty string means "generate one".
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[validate(length(min = 3, max = 10))]
    #[validate(regex(path = "*CUSTOM_ALIAS_REGEX"))]
    pub custom_alias: Option<String>,
}

/// One alias as returned to callers.
#[derive(Debug, Serialize)]
pub struct AliasResponse {
    pub code: String,
    pub short_url: String,
    pub target_url: String,
    pub owner_id: String,
    pub created_at: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_clicks: Option<u64>,
}

impl From<CreatedAlias> for AliasResponse {
    fn from(created: CreatedAlias) -> Self {
        Self {
            code: created.record.code,
            short_url: created.short_url,
            target_url: created.record.target_url,
            owner_id: created.record.owner_id,
            created_at: created.record.created_at,
            total_clicks: None,
        }
    }
}
