//! DTOs for per-alias and global statistics endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{DailyClicks, HourlyClicks, RankedEntry};

/// Response for `GET /api/stats/{code}`.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub code: String,
    pub total_clicks: u64,
    pub unique_clicks: u64,
    pub daily_clicks: Vec<DailyClicks>,
}

/// Query parameters for ranking endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub period: Option<String>,
    pub limit: Option<usize>,
}

/// Query parameters for `GET /api/stats/{code}/hourly`.
#[derive(Debug, Default, Deserialize)]
pub struct HourlyQuery {
    /// Day to report, `YYYY-MM-DD`. Defaults to today (UTC).
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReferrersResponse {
    pub code: String,
    pub items: Vec<RankedEntry>,
}

#[derive(Debug, Serialize)]
pub struct HourlyResponse {
    pub code: String,
    pub date: NaiveDate,
    pub hours: Vec<HourlyClicks>,
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub period: &'static str,
    pub items: Vec<RankedEntry>,
}
