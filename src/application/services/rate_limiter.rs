//! Fixed-window admission control backed by the shared store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::domain::keys;
use crate::domain::repositories::{KvStore, StoreError, bounded};
use crate::error::AppError;

/// Decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
}

/// Per-client request counter over a fixed window.
///
/// The window starts at a client's first request and lasts `window`; the
/// counter key expires with it. Every replica shares the same counters.
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
    max_requests: u64,
    window: Duration,
    fail_open: bool,
    store_timeout: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn KvStore>,
        max_requests: u64,
        window: Duration,
        fail_open: bool,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            max_requests,
            window,
            fail_open,
            store_timeout,
        }
    }

    /// Counts one attempt by `client` and decides whether it may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] when the store cannot be reached and
    /// the limiter is configured to fail closed.
    pub async fn admit(&self, client: &str) -> Result<Admission, AppError> {
        let key = keys::rate_limit(client);

        let count = match self.count_attempt(&key).await {
            Ok(count) => count,
            Err(e) if self.fail_open => {
                warn!("Rate limiter store failure, admitting {}: {}", client, e);
                return Ok(Admission {
                    allowed: true,
                    limit: self.max_requests,
                    remaining: self.max_requests,
                });
            }
            Err(e) => {
                error!("Rate limiter store failure for {}: {}", client, e);
                return Err(e.into());
            }
        };

        if count > self.max_requests {
            metrics::counter!("rate_limit_rejections_total").increment(1);
            warn!("Rate limit exceeded for {} ({} requests)", client, count);
            return Ok(Admission {
                allowed: false,
                limit: self.max_requests,
                remaining: 0,
            });
        }

        Ok(Admission {
            allowed: true,
            limit: self.max_requests,
            remaining: self.max_requests - count,
        })
    }

    async fn count_attempt(&self, key: &str) -> Result<u64, StoreError> {
        let count = bounded(self.store_timeout, self.store.incr(key)).await?;
        let count = count.max(0) as u64;

        if count == 1 {
            self.arm_window(key).await;
        } else if count > self.max_requests {
            self.rearm_if_persistent(key).await;
        }

        Ok(count)
    }

    /// Starts the window. A failure only delays the reset: the next rejected
    /// request finds the counter without expiry and arms it.
    async fn arm_window(&self, key: &str) {
        if let Err(e) = bounded(self.store_timeout, self.store.expire(key, self.window)).await {
            warn!("Failed to arm rate limit window {}: {}", key, e);
        }
    }

    async fn rearm_if_persistent(&self, key: &str) {
        match bounded(self.store_timeout, self.store.ttl(key)).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!("Rate limit window {} has no expiry, re-arming", key);
                self.arm_window(key).await;
            }
            Err(e) => warn!("Failed to read rate limit window {}: {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockKvStore, StoreOp, StoreResult};
    use crate::infrastructure::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    const WINDOW: Duration = Duration::from_secs(60);
    const TIMEOUT: Duration = Duration::from_secs(1);

    fn limiter(store: Arc<dyn KvStore>, max: u64, fail_open: bool) -> RateLimiter {
        RateLimiter::new(store, max, WINDOW, fail_open, TIMEOUT)
    }

    #[tokio::test]
    async fn test_admits_up_to_limit_then_rejects() {
        let limiter = limiter(Arc::new(MemoryStore::new()), 3, false);

        for expected_remaining in [2, 1, 0] {
            let admission = limiter.admit("1.2.3.4").await.unwrap();
            assert!(admission.allowed);
            assert_eq!(admission.limit, 3);
            assert_eq!(admission.remaining, expected_remaining);
        }

        let admission = limiter.admit("1.2.3.4").await.unwrap();
        assert!(!admission.allowed);
        assert_eq!(admission.remaining, 0);
    }

    #[tokio::test]
    async fn test_clients_are_counted_separately() {
        let limiter = limiter(Arc::new(MemoryStore::new()), 1, false);

        assert!(limiter.admit("a").await.unwrap().allowed);
        assert!(!limiter.admit("a").await.unwrap().allowed);
        assert!(limiter.admit("b").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_window_expiry_armed_on_first_request_only() {
        let store = Arc::new(MemoryStore::new());
        let limiter = limiter(store.clone(), 10, false);

        limiter.admit("c").await.unwrap();
        let first = store.ttl_of("rate_limit:c").unwrap();
        assert!(first <= WINDOW);

        let mut mock = MockKvStore::new();
        mock.expect_incr().times(1).returning(|_| Ok(2));
        mock.expect_expire().never();

        let limiter = RateLimiter::new(Arc::new(mock), 10, WINDOW, false, TIMEOUT);
        assert_eq!(limiter.admit("c").await.unwrap().remaining, 8);
    }

    #[tokio::test]
    async fn test_store_failure_fails_closed() {
        let mut store = MockKvStore::new();
        store
            .expect_incr()
            .times(1)
            .returning(|_| Err(StoreError::Connection("refused".into())));

        let err = limiter(Arc::new(store), 10, false)
            .admit("1.2.3.4")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_store_failure_fails_open_when_configured() {
        let mut store = MockKvStore::new();
        store
            .expect_incr()
            .times(1)
            .returning(|_| Err(StoreError::Timeout(TIMEOUT)));

        let admission = limiter(Arc::new(store), 10, true)
            .admit("1.2.3.4")
            .await
            .unwrap();

        assert_eq!(
            admission,
            Admission {
                allowed: true,
                limit: 10,
                remaining: 10
            }
        );
    }

    /// Memory store whose first `expire` call fails.
    struct FirstExpireFails {
        inner: MemoryStore,
        failed: AtomicBool,
    }

    impl FirstExpireFails {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                failed: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl KvStore for FirstExpireFails {
        async fn get(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
            self.inner.set(key, value, ttl).await
        }
        async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool> {
            self.inner.set_nx(key, value, ttl).await
        }
        async fn del(&self, key: &str) -> StoreResult<()> {
            self.inner.del(key).await
        }
        async fn incr(&self, key: &str) -> StoreResult<i64> {
            self.inner.incr(key).await
        }
        async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(StoreError::Connection("reset by peer".into()));
            }
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
    async fn test_window_resets_after_expiry() {
        let window = Duration::from_millis(50);
        let limiter = RateLimiter::new(Arc::new(MemoryStore::new()), 1, window, false, TIMEOUT);

        assert!(limiter.admit("d").await.unwrap().allowed);
        assert!(!limiter.admit("d").await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(120)).await;

        let admission = limiter.admit("d").await.unwrap();
        assert!(admission.allowed);
        assert_eq!(admission.remaining, 0);
    }

    #[tokio::test]
    async fn test_failed_expire_does_not_lock_client_out() {
        let window = Duration::from_millis(50);
        let limiter = RateLimiter::new(Arc::new(FirstExpireFails::new()), 2, window, false, TIMEOUT);

        // The counter is taken even though its expiry could not be armed
        let first = limiter.admit("e").await.unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);

        assert!(limiter.admit("e").await.unwrap().allowed);
        assert!(!limiter.admit("e").await.unwrap().allowed);

        tokio::time::sleep(Duration::from_millis(120)).await;

        let admission = limiter.admit("e").await.unwrap();
        assert!(admission.allowed);
        assert_eq!(admission.remaining, 1);
    }

    #[tokio::test]
    async fn test_rejection_rearms_counter_without_expiry() {
        let mut store = MockKvStore::new();
        store.expect_incr().times(1).returning(|_| Ok(11));
        store.expect_ttl().times(1).returning(|_| Ok(None));
        store
            .expect_expire()
            .withf(|key, ttl| key == "rate_limit:f" && *ttl == WINDOW)
            .times(1)
            .returning(|_, _| Ok(()));

        let admission = limiter(Arc::new(store), 10, false).admit("f").await.unwrap();
        assert!(!admission.allowed);
    }

    #[tokio::test]
    async fn test_rejection_keeps_live_window() {
        let mut store = MockKvStore::new();
        store.expect_incr().times(1).returning(|_| Ok(11));
        store
            .expect_ttl()
            .times(1)
            .returning(|_| Ok(Some(Duration::from_secs(30))));
        store.expect_expire().never();

        let admission = limiter(Arc::new(store), 10, false).admit("g").await.unwrap();
        assert!(!admission.allowed);
    }
}
