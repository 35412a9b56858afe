//! External key/value + counter store.
//!
//! Provides two [`crate::domain::repositories::KvStore`] implementations:
//! - [`RedisStore`] - Production Redis-backed store
//! - [`MemoryStore`] - In-process store for development and testing

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
