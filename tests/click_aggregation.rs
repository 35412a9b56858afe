use chrono::{NaiveDate, TimeZone, Utc};
use shortlink::application::services::{AliasService, AnalyticsService};
use shortlink::domain::click_event::ClickEvent;
use shortlink::domain::click_worker::run_click_worker;
use shortlink::domain::entities::TopPeriod;
use shortlink::domain::keys;
use shortlink::infrastructure::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn analytics(store: &Arc<MemoryStore>) -> AnalyticsService {
    AnalyticsService::new(store.clone(), Duration::from_secs(1))
}

#[tokio::test]
async fn test_totals_and_unique_visitors() {
    let store = Arc::new(MemoryStore::new());
    let analytics = analytics(&store);

    for ip in ["10.0.0.1", "10.0.0.1", "10.0.0.2"] {
        analytics
            .record_click(ClickEvent::new("abc123".to_string(), ip, None, None))
            .await;
    }

    let stats = analytics.get_stats("abc123").await;
    assert_eq!(stats.total_clicks, 3);
    assert_eq!(stats.unique_clicks, 2);
    assert_eq!(stats.daily_clicks[0].count, 3);
    assert!(stats.daily_clicks[1..].iter().all(|d| d.count == 0));
}

#[tokio::test]
async fn test_clicks_bucketed_by_event_time() {
    let store = Arc::new(MemoryStore::new());
    let analytics = analytics(&store);

    let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
    analytics
        .record_click(ClickEvent::at(
            "abc123".to_string(),
            "10.0.0.1",
            Some("Mozilla/5.0"),
            Some("https://news.example"),
            at,
        ))
        .await;

    let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let stats = analytics.stats_as_of("abc123", today).await;
    assert_eq!(stats.daily_clicks.len(), 7);
    assert_eq!(stats.daily_clicks[0].date, today);
    assert_eq!(stats.daily_clicks[0].count, 1);
    assert_eq!(
        stats.daily_clicks[6].date,
        NaiveDate::from_ymd_opt(2024, 2, 28).unwrap()
    );

    let hours = analytics.hourly_distribution("abc123", Some(today)).await;
    assert_eq!(hours.len(), 24);
    assert_eq!(hours[14].count, 1);
    assert_eq!(hours.iter().map(|h| h.count).sum::<u64>(), 1);

    let week = analytics.top_aliases_at(TopPeriod::Week, 10, at).await;
    assert_eq!(week.len(), 1);
    assert_eq!(week[0].member, "abc123");

    assert!(store.ttl_of(&keys::global_week(at)).is_some());
    assert!(store.ttl_of(&keys::global_month(at)).is_some());
    assert!(store.ttl_of(keys::GLOBAL_ALL_TIME).is_none());
}

#[tokio::test]
async fn test_rankings_break_ties_by_code() {
    let store = Arc::new(MemoryStore::new());
    let analytics = analytics(&store);

    for code in ["zeta", "alpha", "mid", "mid"] {
        analytics
            .record_click(ClickEvent::new(code.to_string(), "10.0.0.1", None, None))
            .await;
    }

    let top = analytics.top_aliases(TopPeriod::AllTime, 10).await;
    let members: Vec<_> = top.iter().map(|e| e.member.as_str()).collect();
    assert_eq!(members, ["mid", "alpha", "zeta"]);
    assert_eq!(top[0].score, 2);
}

#[tokio::test]
async fn test_referrer_ranking_skips_missing_referrer() {
    let store = Arc::new(MemoryStore::new());
    let analytics = analytics(&store);

    for referrer in [Some("https://a.example"), None, Some("https://a.example")] {
        analytics
            .record_click(ClickEvent::new(
                "abc123".to_string(),
                "10.0.0.1",
                None,
                referrer,
            ))
            .await;
    }

    let referrers = analytics.top_referrers("abc123", 10).await;
    assert_eq!(referrers.len(), 1);
    assert_eq!(referrers[0].member, "https://a.example");
    assert_eq!(referrers[0].score, 2);
}

#[tokio::test]
async fn test_worker_pipeline_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let analytics = Arc::new(analytics(&store));
    let (tx, rx) = mpsc::channel(32);

    let worker = tokio::spawn(run_click_worker(
        rx,
        analytics.clone(),
        4,
        Duration::from_secs(1),
    ));

    for i in 0..10 {
        tx.send(ClickEvent::new(
            "popular".to_string(),
            &format!("10.0.0.{}", i % 4),
            None,
            Some("https://search.example"),
        ))
        .await
        .unwrap();
    }
    drop(tx);
    worker.await.unwrap();

    for _ in 0..100 {
        if analytics.total_clicks("popular").await == 10 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let stats = analytics.get_stats("popular").await;
    assert_eq!(stats.total_clicks, 10);
    assert_eq!(stats.unique_clicks, 4);

    let referrers = analytics.top_referrers("popular", 5).await;
    assert_eq!(referrers[0].score, 10);
}

#[tokio::test]
async fn test_create_resolve_and_count() {
    let store = Arc::new(MemoryStore::new());
    let aliases = AliasService::new(store.clone(), "https://sho.rt", Duration::from_secs(1));
    let analytics = analytics(&store);

    let created = aliases
        .create("https://example.com/page", "u1", None)
        .await
        .unwrap();
    let code = created.record.code;
    assert_eq!(code.len(), 6);
    assert_eq!(
        aliases.resolve(&code).await.unwrap(),
        "https://example.com/page"
    );

    analytics
        .record_click(ClickEvent::new(code.clone(), "1.2.3.4", None, None))
        .await;

    let stats = analytics.get_stats(&code).await;
    assert_eq!(stats.total_clicks, 1);
    assert_eq!(stats.unique_clicks, 1);
    assert_eq!(stats.daily_clicks.len(), 7);
    assert_eq!(stats.daily_clicks[0].date, Utc::now().date_naive());
    assert_eq!(stats.daily_clicks[0].count, 1);
    assert!(stats.daily_clicks[1..].iter().all(|d| d.count == 0));
}
