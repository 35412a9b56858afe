//! Click aggregation and read-side rollups.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Timelike, Utc};
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{ClickStats, DailyClicks, HourlyClicks, RankedEntry, TopPeriod};
use crate::domain::keys;
use crate::domain::repositories::{KvStore, StoreOp, bounded};

/// Largest number of ranking entries returned by one query.
pub const MAX_RANKING_LIMIT: usize = 100;

/// Number of days in the daily series returned by [`AnalyticsService::get_stats`].
const DAILY_SERIES_DAYS: u64 = 7;

/// Service folding click events into per-alias and global aggregates.
///
/// Writes are lossy telemetry: a failed batch is logged and counted, never
/// reported to the caller. Reads treat a missing key as zero and degrade a
/// store error to an empty or zero result.
pub struct AnalyticsService {
    store: Arc<dyn KvStore>,
    store_timeout: Duration,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn KvStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Records one click.
    ///
    /// All counter updates go out as a single non-atomic batch. Time buckets
    /// come from the event timestamp in UTC.
    pub async fn record_click(&self, event: ClickEvent) {
        let ops = click_ops(&event);

        match bounded(self.store_timeout, self.store.execute_batch(ops)).await {
            Ok(()) => {
                metrics::counter!("clicks_recorded_total").increment(1);
                debug!("Recorded click for {}", event.code);
            }
            Err(e) => {
                metrics::counter!("clicks_failed_total").increment(1);
                warn!("Failed to record click for {}: {}", event.code, e);
            }
        }
    }

    /// Total and unique clicks plus the last seven days, today first.
    pub async fn get_stats(&self, code: &str) -> ClickStats {
        self.stats_as_of(code, Utc::now().date_naive()).await
    }

    /// Same as [`Self::get_stats`] with an explicit "today".
    pub async fn stats_as_of(&self, code: &str, today: NaiveDate) -> ClickStats {
        let total_clicks = self.total_clicks(code).await;

        let unique_clicks = bounded(
            self.store_timeout,
            self.store.scard(&keys::unique_visitors(code)),
        )
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to read unique visitors for {}: {}", code, e);
            0
        });

        let mut daily_clicks = Vec::with_capacity(DAILY_SERIES_DAYS as usize);
        for offset in 0..DAILY_SERIES_DAYS {
            let Some(date) = today.checked_sub_days(Days::new(offset)) else {
                break;
            };
            let count = self.read_counter(&keys::daily_clicks(code, date)).await;
            daily_clicks.push(DailyClicks { date, count });
        }

        ClickStats {
            total_clicks,
            unique_clicks,
            daily_clicks,
        }
    }

    /// All-time click count for one alias; zero when unknown.
    pub async fn total_clicks(&self, code: &str) -> u64 {
        self.read_counter(&keys::total_clicks(code)).await
    }

    /// Highest-ranked aliases for `period`, using the current week and month.
    pub async fn top_aliases(&self, period: TopPeriod, limit: usize) -> Vec<RankedEntry> {
        self.top_aliases_at(period, limit, Utc::now()).await
    }

    /// Highest-ranked aliases for `period` as seen at `now`.
    pub async fn top_aliases_at(
        &self,
        period: TopPeriod,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<RankedEntry> {
        let key = match period {
            TopPeriod::AllTime => keys::GLOBAL_ALL_TIME.to_string(),
            TopPeriod::Week => keys::global_week(now),
            TopPeriod::Month => keys::global_month(now),
        };

        self.read_ranking(&key, limit).await
    }

    /// Most frequent referrers for one alias.
    pub async fn top_referrers(&self, code: &str, limit: usize) -> Vec<RankedEntry> {
        self.read_ranking(&keys::referrers(code), limit).await
    }

    /// Clicks per hour for `date` (default: today). Always 24 entries.
    pub async fn hourly_distribution(
        &self,
        code: &str,
        date: Option<NaiveDate>,
    ) -> Vec<HourlyClicks> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());

        let mut hours = Vec::with_capacity(24);
        for hour in 0..24u8 {
            let count = self
                .read_counter(&keys::hourly_clicks(code, date, u32::from(hour)))
                .await;
            hours.push(HourlyClicks { hour, count });
        }
        hours
    }

    async fn read_counter(&self, key: &str) -> u64 {
        match bounded(self.store_timeout, self.store.get(key)).await {
            Ok(Some(value)) => value.parse().unwrap_or_else(|_| {
                warn!("Counter {} holds a non-integer value", key);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                0
            }
        }
    }

    async fn read_ranking(&self, key: &str, limit: usize) -> Vec<RankedEntry> {
        let limit = clamp_limit(limit);

        let members = match bounded(
            self.store_timeout,
            self.store.zrevrange_with_scores(key, limit),
        )
        .await
        {
            Ok(members) => members,
            Err(e) => {
                warn!("Failed to read ranking {}: {}", key, e);
                return Vec::new();
            }
        };

        let mut entries: Vec<RankedEntry> = members
            .into_iter()
            .map(|(member, score)| RankedEntry {
                member,
                score: score.max(0.0).round() as u64,
            })
            .collect();

        entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.member.cmp(&b.member)));
        entries.truncate(limit);
        entries
    }
}

/// Zero or anything above the cap means "the cap".
fn clamp_limit(limit: usize) -> usize {
    if limit == 0 || limit > MAX_RANKING_LIMIT {
        MAX_RANKING_LIMIT
    } else {
        limit
    }
}

/// Builds the write batch for one click.
fn click_ops(event: &ClickEvent) -> Vec<StoreOp> {
    let code = event.code.as_str();
    let at = event.timestamp;
    let date = at.date_naive();

    let total = keys::total_clicks(code);
    let unique = keys::unique_visitors(code);
    let daily = keys::daily_clicks(code, date);
    let hourly = keys::hourly_clicks(code, date, at.hour());
    let week = keys::global_week(at);
    let month = keys::global_month(at);

    let mut ops = vec![
        StoreOp::Incr { key: total.clone() },
        StoreOp::Expire {
            key: total,
            ttl: keys::CLICK_RETENTION,
        },
    ];

    if !event.client_ip.is_empty() {
        ops.push(StoreOp::SetAdd {
            key: unique.clone(),
            member: event.client_ip.clone(),
        });
        ops.push(StoreOp::Expire {
            key: unique,
            ttl: keys::CLICK_RETENTION,
        });
    }

    ops.extend([
        StoreOp::Incr { key: daily.clone() },
        StoreOp::Expire {
            key: daily,
            ttl: keys::CLICK_RETENTION,
        },
        StoreOp::Incr {
            key: hourly.clone(),
        },
        StoreOp::Expire {
            key: hourly,
            ttl: keys::CLICK_RETENTION,
        },
    ]);

    if !event.referrer.is_empty() {
        let referrers = keys::referrers(code);
        ops.push(StoreOp::ZIncrBy {
            key: referrers.clone(),
            member: event.referrer.clone(),
            delta: 1.0,
        });
        ops.push(StoreOp::Expire {
            key: referrers,
            ttl: keys::CLICK_RETENTION,
        });
    }

    ops.extend([
        StoreOp::ZIncrBy {
            key: keys::GLOBAL_ALL_TIME.to_string(),
            member: code.to_string(),
            delta: 1.0,
        },
        StoreOp::ZIncrBy {
            key: week.clone(),
            member: code.to_string(),
            delta: 1.0,
        },
        StoreOp::Expire {
            key: week,
            ttl: keys::WEEKLY_RETENTION,
        },
        StoreOp::ZIncrBy {
            key: month.clone(),
            member: code.to_string(),
            delta: 1.0,
        },
        StoreOp::Expire {
            key: month,
            ttl: keys::MONTHLY_RETENTION,
        },
    ]);

    ops
}
