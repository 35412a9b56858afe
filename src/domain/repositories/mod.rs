//! Store trait definitions for the domain layer.
//!
//! The alias index, the click aggregates and the rate limiter all live on top
//! of one shared key/value + counter store. [`KvStore`] is the contract they
//! program against.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::store`
//! - Mock implementations are auto-generated via `mockall` for testing

pub mod kv_store;

pub use kv_store::{KvStore, StoreError, StoreOp, StoreResult, bounded};

#[cfg(test)]
pub use kv_store::MockKvStore;
