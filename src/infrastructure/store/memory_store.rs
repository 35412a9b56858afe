//! In-process store implementation.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::repositories::{KvStore, StoreError, StoreOp, StoreResult};

#[derive(Debug)]
enum Value {
    Str(String),
    Set(HashSet<String>),
    SortedSet(HashMap<String, f64>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// A store that keeps everything in process memory.
///
/// Used when Redis is not configured and by the test suite. Mirrors the Redis
/// semantics the data-path relies on: TTLs survive `INCR`, a plain `SET`
/// clears them, and expired keys are invisible and purged lazily.
///
/// Nothing survives a process restart, so the startup scan only recovers
/// records written by the same process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

type Entries<'a> = MutexGuard<'a, HashMap<String, Entry>>;

impl MemoryStore {
    pub fn new() -> Self {
        debug!("Using MemoryStore (data is not shared across processes)");
        Self::default()
    }

    /// Remaining time to live of a key. `None` for missing or persistent keys.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let mut entries = self.lock().ok()?;
        let now = Instant::now();
        live(&mut entries, key, now)?
            .expires_at
            .map(|at| at.saturating_duration_since(now))
    }

    fn lock(&self) -> StoreResult<Entries<'_>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Operation("Memory store lock poisoned".to_string()))
    }
}

/// Returns the live entry for `key`, dropping it first if it has expired.
fn live<'a>(entries: &'a mut Entries<'_>, key: &str, now: Instant) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|e| !e.is_live(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::Operation(format!(
        "WRONGTYPE key {key} holds the wrong kind of value"
    ))
}

fn apply_incr(entries: &mut Entries<'_>, key: &str, now: Instant) -> StoreResult<i64> {
    match live(entries, key, now) {
        Some(entry) => {
            let Value::Str(raw) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            let next = raw
                .parse::<i64>()
                .map_err(|_| StoreError::Operation(format!("Value at {key} is not an integer")))?
                + 1;
            *raw = next.to_string();
            Ok(next)
        }
        None => {
            entries.insert(key.to_string(), Entry::new(Value::Str("1".to_string())));
            Ok(1)
        }
    }
}

fn apply_sadd(entries: &mut Entries<'_>, key: &str, member: &str, now: Instant) -> StoreResult<()> {
    match live(entries, key, now) {
        Some(entry) => {
            let Value::Set(members) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            members.insert(member.to_string());
        }
        None => {
            let members = HashSet::from([member.to_string()]);
            entries.insert(key.to_string(), Entry::new(Value::Set(members)));
        }
    }
    Ok(())
}

fn apply_zincrby(
    entries: &mut Entries<'_>,
    key: &str,
    member: &str,
    delta: f64,
    now: Instant,
) -> StoreResult<()> {
    match live(entries, key, now) {
        Some(entry) => {
            let Value::SortedSet(scores) = &mut entry.value else {
                return Err(wrong_type(key));
            };
            *scores.entry(member.to_string()).or_insert(0.0) += delta;
        }
        None => {
            let scores = HashMap::from([(member.to_string(), delta)]);
            entries.insert(key.to_string(), Entry::new(Value::SortedSet(scores)));
        }
    }
    Ok(())
}

fn apply_expire(entries: &mut Entries<'_>, key: &str, ttl: Duration, now: Instant) {
    if let Some(entry) = live(entries, key, now) {
        entry.expires_at = Some(now + ttl);
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.lock()?;
        match live(&mut entries, key, Instant::now()) {
            Some(Entry {
                value: Value::Str(value),
                ..
            }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<()> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> StoreResult<bool> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if live(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(true)
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut entries = self.lock()?;
        apply_incr(&mut entries, key, Instant::now())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let mut entries = self.lock()?;
        apply_expire(&mut entries, key, ttl, Instant::now());
        Ok(())
    }

    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        Ok(live(&mut entries, key, now)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn scard(&self, key: &str) -> StoreResult<u64> {
        let mut entries = self.lock()?;
        match live(&mut entries, key, Instant::now()) {
            Some(Entry {
                value: Value::Set(members),
                ..
            }) => Ok(members.len() as u64),
            Some(_) => Err(wrong_type(key)),
            None => Ok(0),
        }
    }

    async fn zrevrange_with_scores(
        &self,
        key: &str,
        limit: usize,
    ) -> StoreResult<Vec<(String, f64)>> {
        let mut entries = self.lock()?;
        let scores = match live(&mut entries, key, Instant::now()) {
            Some(Entry {
                value: Value::SortedSet(scores),
                ..
            }) => scores,
            Some(_) => return Err(wrong_type(key)),
            None => return Ok(Vec::new()),
        };

        let mut ranked: Vec<(String, f64)> =
            scores.iter().map(|(m, s)| (m.clone(), *s)).collect();
        // Same order as ZREVRANGE: score desc, then member desc
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let entries = self.lock()?;
        let now = Instant::now();
        Ok(entries
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn execute_batch(&self, ops: Vec<StoreOp>) -> StoreResult<()> {
        let mut entries = self.lock()?;
        let now = Instant::now();

        for op in ops {
            match op {
                StoreOp::Incr { key } => {
                    apply_incr(&mut entries, &key, now)?;
                }
                StoreOp::SetAdd { key, member } => apply_sadd(&mut entries, &key, &member, now)?,
                StoreOp::ZIncrBy { key, member, delta } => {
                    apply_zincrby(&mut entries, &key, &member, delta, now)?
                }
                StoreOp::Expire { key, ttl } => apply_expire(&mut entries, &key, ttl, now),
            }
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}
