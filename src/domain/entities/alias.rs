//! Alias entity representing a shortened URL mapping.

use serde::{Deserialize, Serialize};

/// A short code mapped to its target URL.
///
/// Created exactly once and never updated. The same structure is serialized
/// as the durable record in the external store, so field names are part of
/// the storage format. Legacy field names are accepted on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    #[serde(alias = "ShortCode")]
    pub code: String,
    #[serde(alias = "OriginalURL")]
    pub target_url: String,
    #[serde(alias = "UserID")]
    pub owner_id: String,
    /// Unix seconds.
    #[serde(alias = "CreatedAt")]
    pub created_at: i64,
}

impl AliasRecord {
    pub fn new(code: String, target_url: String, owner_id: String, created_at: i64) -> Self {
        Self {
            code,
            target_url,
            owner_id,
            created_at,
        }
    }
}

/// A record paired with its caller-facing short URL.
#[derive(Debug, Clone)]
pub struct CreatedAlias {
    pub record: AliasRecord,
    pub short_url: String,
}
