//! Redis-backed store implementation.

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::repositories::{KvStore, StoreError, StoreOp, StoreResult};

/// Keys fetched per SCAN round trip.
const SCAN_BATCH: usize = 500;

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_dropped() || e.is_io_error() {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Operation(e.to_string())
        }
    }
}

/// Redis store for alias records, click aggregates and rate-limit windows.
///
/// Uses connection pooling via `ConnectionManager`, which reconnects on its
/// own after a dropped connection. Errors are returned to the caller as-is.
#[derive(Clone)]
pub struct RedisStore {
    client: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| StoreError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self { client: manager })
    }
}

/// Redis takes whole seconds; a sub-second TTL still has to expire.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.client.clone();
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl_seconds(ttl)).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool> {
        let mut conn = self.client.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl_seconds(ttl));
        }

        let reply: Option<String> = cmd.query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.del::<_, i64>(key).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.client.clone();
        Ok(conn.incr::<_, _, i64>(key, 1).await?)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.expire::<_, bool>(key, ttl_seconds(ttl) as i64).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut conn = self.client.clone();
        // -2: missing, -1: no expiry
        let millis = conn.pttl::<_, i64>(key).await?;
        Ok(u64::try_from(millis).ok().map(Duration::from_millis))
    }

    async fn scard(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.client.clone();
        Ok(conn.scard::<_, u64>(key).await?)
    }

    async fn zrevrange_with_scores(
        &self,
        key: &str,
        limit: usize,
    ) -> StoreResult<Vec<(String, f64)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.clone();
        Ok(conn
            .zrevrange_withscores::<_, Vec<(String, f64)>>(key, 0, limit as isize - 1)
            .await?)
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.client.clone();
        let pattern = format!("{prefix}*");
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("SCAN {} matched {} keys", pattern, keys.len());
        Ok(keys)
    }

    async fn execute_batch(&self, ops: Vec<StoreOp>) -> StoreResult<()> {
        let mut pipe = redis::pipe();

        for op in &ops {
            match op {
                StoreOp::Incr { key } => {
                    pipe.incr(key, 1).ignore();
                }
                StoreOp::SetAdd { key, member } => {
                    pipe.sadd(key, member).ignore();
                }
                StoreOp::ZIncrBy { key, member, delta } => {
                    pipe.zincr(key, member, *delta).ignore();
                }
                StoreOp::Expire { key, ttl } => {
                    pipe.expire(key, ttl_seconds(*ttl) as i64).ignore();
                }
            }
        }

        let mut conn = self.client.clone();
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.ping::<()>().await?;
        Ok(())
    }
}
