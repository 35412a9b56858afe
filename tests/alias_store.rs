mod common;

use shortlink::application::services::AliasService;
use async_trait::async_trait;
use shortlink::domain::keys;
use shortlink::domain::repositories::{KvStore, StoreError, StoreOp, StoreResult};
use shortlink::error::AppError;
use shortlink::infrastructure::store::MemoryStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

fn service(store: &Arc<MemoryStore>) -> AliasService {
    AliasService::new(store.clone(), common::BASE_URL, common::STORE_TIMEOUT)
}

#[tokio::test]
async fn test_create_then_resolve() {
    let store = Arc::new(MemoryStore::new());
    let aliases = service(&store);

    let created = aliases
        .create("https://example.com/a", "u1", None)
        .await
        .unwrap();

    assert_eq!(
        created.short_url,
        format!("https://sho.rt/s/{}", created.record.code)
    );
    assert_eq!(
        aliases.resolve(&created.record.code).await.unwrap(),
        "https://example.com/a"
    );
}

#[tokio::test]
async fn test_durable_record_and_cache_written() {
    let store = Arc::new(MemoryStore::new());
    let aliases = service(&store);

    aliases
        .create("https://example.com/a", "u1", Some("persist"))
        .await
        .unwrap();

    let durable = store.get(&keys::durable("persist")).await.unwrap().unwrap();
    let record: serde_json::Value = serde_json::from_str(&durable).unwrap();
    assert_eq!(record["code"], "persist");
    assert_eq!(record["target_url"], "https://example.com/a");
    assert_eq!(record["owner_id"], "u1");
    assert!(store.ttl_of(&keys::durable("persist")).is_none());

    assert_eq!(
        store.get(&keys::cache("persist")).await.unwrap().as_deref(),
        Some("https://example.com/a")
    );
    assert!(store.ttl_of(&keys::cache("persist")).is_some());
}

#[tokio::test]
async fn test_aliases_survive_restart() {
    let store = Arc::new(MemoryStore::new());

    {
        let before = service(&store);
        before
            .create("https://example.com/one", "u1", Some("one"))
            .await
            .unwrap();
        before
            .create("https://example.com/two", "u2", Some("two"))
            .await
            .unwrap();
    }

    // Simulate expired cache entries
    store.del(&keys::cache("one")).await.unwrap();
    store.del(&keys::cache("two")).await.unwrap();

    let after =
        AliasService::restored(store.clone(), common::BASE_URL, common::STORE_TIMEOUT).await;

    assert_eq!(after.len().await, 2);
    assert_eq!(after.resolve("one").await.unwrap(), "https://example.com/one");
    assert_eq!(after.resolve("two").await.unwrap(), "https://example.com/two");

    let owned = after.list_by_owner("u2").await;
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].record.code, "two");
}

#[tokio::test]
async fn test_restore_accepts_legacy_field_names() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            &keys::durable("legacy"),
            r#"{"ShortCode":"legacy","OriginalURL":"https://example.com/old","UserID":"u9","CreatedAt":1700000000}"#,
            None,
        )
        .await
        .unwrap();

    let aliases =
        AliasService::restored(store.clone(), common::BASE_URL, common::STORE_TIMEOUT).await;

    assert_eq!(
        aliases.resolve("legacy").await.unwrap(),
        "https://example.com/old"
    );
    assert_eq!(aliases.list_by_owner("u9").await.len(), 1);
}

#[tokio::test]
async fn test_expired_cache_is_repopulated() {
    let store = Arc::new(MemoryStore::new());
    let aliases = service(&store).with_cache_ttl(Duration::from_millis(30));

    aliases
        .create("https://example.com/a", "u1", Some("shortttl"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(store.get(&keys::cache("shortttl")).await.unwrap(), None);

    assert_eq!(
        aliases.resolve("shortttl").await.unwrap(),
        "https://example.com/a"
    );
    assert_eq!(
        store.get(&keys::cache("shortttl")).await.unwrap().as_deref(),
        Some("https://example.com/a")
    );
}

#[tokio::test]
async fn test_conflict_leaves_original_mapping() {
    let store = Arc::new(MemoryStore::new());
    let aliases = service(&store);

    aliases
        .create("https://example.com/first", "u1", Some("taken"))
        .await
        .unwrap();

    let err = aliases
        .create("https://example.com/second", "u2", Some("taken"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
    assert_eq!(
        aliases.resolve("taken").await.unwrap(),
        "https://example.com/first"
    );
    assert_eq!(aliases.list_by_owner("u2").await.len(), 0);
}

#[tokio::test]
async fn test_replicas_cannot_claim_same_alias() {
    let store = Arc::new(MemoryStore::new());
    let replica_a = service(&store);
    let replica_b = service(&store);

    replica_a
        .create("https://example.com/a", "u1", Some("shared"))
        .await
        .unwrap();

    let err = replica_b
        .create("https://example.com/b", "u2", Some("shared"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
}

#[tokio::test]
async fn test_concurrent_custom_alias_has_single_winner() {
    let store = Arc::new(MemoryStore::new());
    let aliases = Arc::new(service(&store));

    let mut handles = Vec::new();
    for i in 0..8 {
        let aliases = aliases.clone();
        handles.push(tokio::spawn(async move {
            aliases
                .create(&format!("https://example.com/{i}"), "u1", Some("race"))
                .await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(aliases.len().await, 1);
}

#[tokio::test]
async fn test_unknown_alias_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let aliases = service(&store);

    let err = aliases.resolve("nope123").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

/// Memory store whose first `set_nx` parks until released and whose later
/// `set_nx` calls fail.
struct GatedClaimStore {
    inner: MemoryStore,
    claims: AtomicUsize,
    entered: Notify,
    release: Notify,
}

impl GatedClaimStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            claims: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl KvStore for GatedClaimStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        self.inner.set(key, value, ttl).await
    }
    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool> {
        if self.claims.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            self.release.notified().await;
            return self.inner.set_nx(key, value, ttl).await;
        }
        Err(StoreError::Connection("connection refused".into()))
    }
    async fn del(&self, key: &str) -> StoreResult<()> {
        self.inner.del(key).await
    }
    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.inner.incr(key).await
    }
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        self.inner.expire(key, ttl).await
    }
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        self.inner.ttl(key).await
    }
    async fn scard(&self, key: &str) -> StoreResult<u64> {
        self.inner.scard(key).await
    }
    async fn zrevrange_with_scores(
        &self,
        key: &str,
        limit: usize,
    ) -> StoreResult<Vec<(String, f64)>> {
        self.inner.zrevrange_with_scores(key, limit).await
    }
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.scan_prefix(prefix).await
    }
    async fn execute_batch(&self, ops: Vec<StoreOp>) -> StoreResult<()> {
        self.inner.execute_batch(ops).await
    }
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

#[tokio::test]
async fn test_losing_claim_persists_winner_record() {
    let store = Arc::new(GatedClaimStore::new());
    let aliases = Arc::new(AliasService::new(
        store.clone(),
        common::BASE_URL,
        common::STORE_TIMEOUT,
    ));

    // First create claims the durable key but stalls before the index insert
    let slow = tokio::spawn({
        let aliases = aliases.clone();
        async move {
            aliases
                .create("https://example.com/slow", "u1", Some("contest"))
                .await
        }
    });
    store.entered.notified().await;

    // Second create cannot reach the store and wins the index
    aliases
        .create("https://example.com/fast", "u2", Some("contest"))
        .await
        .unwrap();

    store.release.notify_one();
    let err = slow.await.unwrap().unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));

    let durable = store
        .inner
        .get(&keys::durable("contest"))
        .await
        .unwrap()
        .unwrap();
    let record: serde_json::Value = serde_json::from_str(&durable).unwrap();
    assert_eq!(record["target_url"], "https://example.com/fast");
    assert_eq!(record["owner_id"], "u2");

    store.inner.del(&keys::cache("contest")).await.unwrap();
    let after =
        AliasService::restored(store.clone(), common::BASE_URL, common::STORE_TIMEOUT).await;
    assert_eq!(
        after.resolve("contest").await.unwrap(),
        "https://example.com/fast"
    );
}
