//! Contract of the shared external key/value + counter store.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store operation error: {0}")]
    Operation(String),

    #[error("Store call exceeded {0:?} deadline")]
    Timeout(Duration),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// One write in a pipelined batch.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Incr { key: String },
    SetAdd { key: String, member: String },
    ZIncrBy { key: String, member: String, delta: f64 },
    Expire { key: String, ttl: Duration },
}

/// Primitives the data-path needs from the external store.
///
/// Implementations must be thread-safe. They report failures faithfully;
/// deciding whether a failure degrades to a default is the caller's job.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisStore`] - Redis via a connection manager
/// - [`crate::infrastructure::store::MemoryStore`] - In-process store with TTL support
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a string value. `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a string value. `ttl = None` stores it without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()>;

    /// Writes a string value only if the key does not exist.
    ///
    /// Returns `true` when this call created the key.
    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool>;

    async fn del(&self, key: &str) -> StoreResult<()>;

    /// Atomically increments an integer counter, creating it at zero.
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()>;

    /// Remaining time to live. `None` when the key is missing or never expires.
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Cardinality of a set; zero for a missing key.
    async fn scard(&self, key: &str) -> StoreResult<u64>;

    /// Top `limit` members of a sorted set, highest score first.
    async fn zrevrange_with_scores(&self, key: &str, limit: usize)
    -> StoreResult<Vec<(String, f64)>>;

    /// All live keys starting with `prefix`. Intended for startup only.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Sends the writes as one round trip. Not atomic: a failure may leave
    /// some operations applied.
    async fn execute_batch(&self, ops: Vec<StoreOp>) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Bounds a store call with a per-call deadline.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] when the deadline elapses, or the call's
/// own error.
pub async fn bounded<T, F>(deadline: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| StoreError::Timeout(deadline))?
}
