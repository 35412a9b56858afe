//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations of the shared external store.
//!
//! # Modules
//!
//! - [`store`] - Redis and in-process implementations of the store contract

pub mod store;
