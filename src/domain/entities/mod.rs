//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`AliasRecord`] - A short code mapped to a target URL
//! - [`ClickStats`], [`DailyClicks`], [`HourlyClicks`], [`RankedEntry`] - Read-side
//!   click rollups
//! - [`TopPeriod`] - Window selector for global rankings

pub mod alias;
pub mod stats;

pub use alias::{AliasRecord, CreatedAlias};
pub use stats::{ClickStats, DailyClicks, HourlyClicks, RankedEntry, TopPeriod};
