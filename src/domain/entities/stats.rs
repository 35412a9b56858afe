//! Read-side click aggregates.

use chrono::NaiveDate;
use serde::Serialize;

/// Totals for one alias plus a most-recent-first daily series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickStats {
    pub total_clicks: u64,
    pub unique_clicks: u64,
    pub daily_clicks: Vec<DailyClicks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyClicks {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyClicks {
    pub hour: u8,
    pub count: u64,
}

/// One member of a ranking with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub member: String,
    pub score: u64,
}

/// Window of a global ranking query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopPeriod {
    #[default]
    AllTime,
    Week,
    Month,
}

impl TopPeriod {
    /// Parses a query value. Anything unrecognized selects the all-time ranking.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::AllTime,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllTime => "all",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}
