//! Domain layer containing business entities and logic.
//!
//! This module defines the data the service reasons about, the layout of that
//! data in the external store, and the store contract itself. It does not know
//! which store backs it at runtime.
//!
//! # Architecture
//!
//! - [`entities`] - Alias records and click aggregate value types
//! - [`keys`] - External-store key layout and retention windows
//! - [`repositories`] - The [`repositories::KvStore`] contract
//! - [`click_event`] - Click telemetry event model
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. HTTP handler resolves an alias
//! 2. [`click_event::ClickEvent`] is sent to async channel
//! 3. [`click_worker::run_click_worker`] dispatches each event under its own deadline
//! 4. Aggregates are updated via [`crate::application::services::AnalyticsService`]

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod keys;
pub mod repositories;
