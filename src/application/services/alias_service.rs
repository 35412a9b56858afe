//! Alias creation, resolution and startup recovery.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::domain::entities::{AliasRecord, CreatedAlias};
use crate::domain::keys;
use crate::domain::repositories::{KvStore, bounded};
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, is_valid_code, validate_custom_alias};
use crate::utils::url_validator::validate_target_url;

/// Attempts at drawing a free generated code before giving up.
const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Longest accepted owner identifier, in bytes.
const MAX_OWNER_ID_LENGTH: usize = 128;

/// Outcome of trying to reserve a code.
enum Claim {
    Taken,
    Claimed(AliasRecord),
}

/// Service owning the alias → URL mapping.
///
/// The in-process index is authoritative for the lifetime of the process.
/// The store holds two copies of every mapping: a durable record used only to
/// rebuild the index at startup, and a short-lived fast-path cache entry used
/// to answer lookups. Store failures never fail a lookup; they degrade to the
/// index.
pub struct AliasService {
    store: Arc<dyn KvStore>,
    index: RwLock<HashMap<String, AliasRecord>>,
    base_url: String,
    cache_ttl: Duration,
    store_timeout: Duration,
}

impl AliasService {
    /// Creates a service with an empty index.
    ///
    /// Call [`Self::restore_index`] before serving requests.
    pub fn new(store: Arc<dyn KvStore>, base_url: impl Into<String>, store_timeout: Duration) -> Self {
        Self {
            store,
            index: RwLock::new(HashMap::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_ttl: keys::CACHE_TTL,
            store_timeout,
        }
    }

    /// Overrides the retention of fast-path cache entries.
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Creates a service and rebuilds its index from the store.
    pub async fn restored(
        store: Arc<dyn KvStore>,
        base_url: impl Into<String>,
        store_timeout: Duration,
    ) -> Self {
        let service = Self::new(store, base_url, store_timeout);
        service.restore_index().await;
        service
    }

    /// Rebuilds the index from every durable record in the store.
    ///
    /// A record that cannot be read or decoded is logged and skipped. A failed
    /// scan leaves the index as it is. Returns the number of records restored.
    pub async fn restore_index(&self) -> usize {
        let keys = match bounded(self.store_timeout, self.store.scan_prefix(keys::DURABLE_PREFIX))
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                error!("Failed to scan durable alias records: {}", e);
                return 0;
            }
        };

        let mut restored = Vec::with_capacity(keys.len());
        for key in keys {
            let payload = match bounded(self.store_timeout, self.store.get(&key)).await {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to load {}: {}", key, e);
                    continue;
                }
            };

            match serde_json::from_str::<AliasRecord>(&payload) {
                Ok(record) => restored.push(record),
                Err(e) => warn!("Failed to decode {}: {}", key, e),
            }
        }

        let count = restored.len();
        let mut index = self.index.write().await;
        for record in restored {
            index.insert(record.code.clone(), record);
        }
        drop(index);

        info!("Restored {} aliases from the store", count);
        count
    }

    /// Creates a new alias.
    ///
    /// With `custom_alias` the caller picks the code; otherwise a random
    /// six-character code is generated, retrying on collision.
    ///
    /// The durable record is claimed with a set-if-absent write, so two
    /// replicas cannot both create the same code while the store is reachable.
    /// If the store is down the claim falls back to the index check alone and
    /// the mapping lives only in this process until the next successful write.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL, owner or alias is malformed.
    /// Returns [`AppError::Conflict`] if the custom alias already exists.
    /// Returns [`AppError::Internal`] if no free code could be generated.
    pub async fn create(
        &self,
        target_url: &str,
        owner_id: &str,
        custom_alias: Option<&str>,
    ) -> Result<CreatedAlias, AppError> {
        validate_target_url(target_url).map_err(|e| {
            AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
        })?;

        if owner_id.trim().is_empty() || owner_id.len() > MAX_OWNER_ID_LENGTH {
            return Err(AppError::bad_request(
                "Owner id must be 1-128 characters",
                json!({ "provided_length": owner_id.len() }),
            ));
        }

        let record = match custom_alias.filter(|alias| !alias.is_empty()) {
            Some(alias) => {
                validate_custom_alias(alias)?;
                match self.claim(alias, target_url, owner_id).await? {
                    Claim::Claimed(record) => record,
                    Claim::Taken => {
                        return Err(AppError::conflict(
                            "Alias already exists",
                            json!({ "code": alias }),
                        ));
                    }
                }
            }
            None => self.claim_generated(target_url, owner_id).await?,
        };

        self.write_cache(&record.code, &record.target_url).await;

        info!("Created alias {} -> {}", record.code, record.target_url);

        Ok(CreatedAlias {
            short_url: self.short_url(&record.code),
            record,
        })
    }

    /// Resolves a code to its target URL.
    ///
    /// Malformed codes are rejected without touching the store. A fast-path
    /// cache hit answers directly; on a miss the index is consulted and the
    /// cache entry is written back.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is malformed or unknown.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if !is_valid_code(code) {
            return Err(AppError::not_found(
                "Alias not found",
                json!({ "code": code }),
            ));
        }

        match bounded(self.store_timeout, self.store.get(&keys::cache(code))).await {
            Ok(Some(url)) => {
                metrics::counter!("alias_cache_hits_total").increment(1);
                debug!("Cache HIT: {}", code);
                return Ok(url);
            }
            Ok(None) => {
                metrics::counter!("alias_cache_misses_total").increment(1);
                debug!("Cache MISS: {}", code);
            }
            Err(e) => {
                metrics::counter!("alias_cache_misses_total").increment(1);
                warn!("Cache read failed for {}: {}", code, e);
            }
        }

        let target_url = self
            .index
            .read()
            .await
            .get(code)
            .map(|record| record.target_url.clone());

        let Some(target_url) = target_url else {
            debug!("Alias not found: {}", code);
            return Err(AppError::not_found(
                "Alias not found",
                json!({ "code": code }),
            ));
        };

        self.write_cache(code, &target_url).await;

        Ok(target_url)
    }

    /// Lists the aliases created by `owner_id`, newest first.
    ///
    /// Click counts are not included.
    pub async fn list_by_owner(&self, owner_id: &str) -> Vec<CreatedAlias> {
        let aliases = self.snapshot(|record| record.owner_id == owner_id).await;
        debug!("Found {} aliases for owner {}", aliases.len(), owner_id);
        aliases
    }

    /// Every alias in the index, newest first.
    pub async fn list_all(&self) -> Vec<CreatedAlias> {
        self.snapshot(|_| true).await
    }

    async fn snapshot(&self, filter: impl Fn(&AliasRecord) -> bool) -> Vec<CreatedAlias> {
        let mut records: Vec<AliasRecord> = self
            .index
            .read()
            .await
            .values()
            .filter(|record| filter(record))
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });

        records
            .into_iter()
            .map(|record| CreatedAlias {
                short_url: self.short_url(&record.code),
                record,
            })
            .collect()
    }

    /// Number of aliases in the index.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }

    /// Caller-facing short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/s/{}", self.base_url, code)
    }

    async fn claim_generated(&self, target_url: &str, owner_id: &str) -> Result<AliasRecord, AppError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let code = generate_code()?;

            match self.claim(&code, target_url, owner_id).await? {
                Claim::Claimed(record) => return Ok(record),
                Claim::Taken => debug!("Generated code {} collided (attempt {})", code, attempt),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Reserves `code` in the store and the index.
    async fn claim(&self, code: &str, target_url: &str, owner_id: &str) -> Result<Claim, AppError> {
        if self.index.read().await.contains_key(code) {
            return Ok(Claim::Taken);
        }

        let record = AliasRecord::new(
            code.to_string(),
            target_url.to_string(),
            owner_id.to_string(),
            Utc::now().timestamp(),
        );

        let payload = serde_json::to_string(&record).map_err(|e| {
            AppError::internal("Failed to encode alias", json!({ "reason": e.to_string() }))
        })?;

        let durable_key = keys::durable(code);
        let persisted = match bounded(
            self.store_timeout,
            self.store.set_nx(&durable_key, &payload, None),
        )
        .await
        {
            Ok(true) => true,
            Ok(false) => return Ok(Claim::Taken),
            Err(e) => {
                warn!("Failed to persist {}: {}", durable_key, e);
                false
            }
        };

        let mut index = self.index.write().await;
        match index.entry(code.to_string()) {
            Entry::Occupied(winner) => {
                let winner = winner.get().clone();
                drop(index);
                // The winner in this process could not persist its own claim,
                // otherwise our set_nx would have failed. Its record takes the key.
                if persisted {
                    self.persist_winner(&durable_key, &winner).await;
                }
                Ok(Claim::Taken)
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(Claim::Claimed(record))
            }
        }
    }

    /// Overwrites a durable key claimed by a losing create with the record
    /// that actually holds the code.
    async fn persist_winner(&self, durable_key: &str, winner: &AliasRecord) {
        let payload = match serde_json::to_string(winner) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode {}: {}", durable_key, e);
                return;
            }
        };

        if let Err(e) = bounded(self.store_timeout, self.store.set(durable_key, &payload, None)).await
        {
            warn!("Failed to persist {}: {}", durable_key, e);
        }
    }

    /// Best-effort write of the fast-path cache entry.
    async fn write_cache(&self, code: &str, target_url: &str) {
        let key = keys::cache(code);
        if let Err(e) = bounded(
            self.store_timeout,
            self.store.set(&key, target_url, Some(self.cache_ttl)),
        )
        .await
        {
            warn!("Failed to cache {}: {}", key, e);
        }
    }
}
