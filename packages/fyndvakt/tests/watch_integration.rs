//! Integration tests for the full watcher pipeline.
//!
//! These drive the real pipeline over the in-memory store with mock
//! collaborators:
//! 1. Discover listings
//! 2. Score them through the repair parser
//! 3. Dispatch throttled alerts
//! 4. Verify dedup/quota/retry behavior across cycles

use std::sync::Arc;
use std::time::Duration;

use fyndvakt::{
    pipeline::batch::{analyze_all, ChunkConfig, DriveConfig},
    run_throttled,
    testing::{MockDiscovery, MockGateway, MockImageFetcher, MockModel},
    Analyzer, ListingForAnalysis, ListingStore, MemoryStore, Monitor, MonitorConfig,
    NewListing, NotificationStatus, NotificationStore, ThrottleConfig,
};

const WATCH: &str = "watch-1";
const RECIPIENT: &str = "+46701234567";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("fyndvakt=debug")
        .try_init();
}

/// Helper to create a discovered listing.
fn new_listing(ad_id: &str, category: &str) -> NewListing {
    NewListing {
        watch_id: WATCH.to_string(),
        ad_id: ad_id.to_string(),
        title: format!("Listing {}", ad_id),
        price: 1200,
        currency: "kr".to_string(),
        description: Some("Lightly used".to_string()),
        category: Some(category.to_string()),
        condition: None,
        location: Some("Stockholm".to_string()),
        seller_type: Some("private".to_string()),
        source_url: Some(format!("https://market.example.com/ad/{}", ad_id)),
        detail_url: None,
        images: vec![],
    }
}

fn throttle_config(quota: u32) -> ThrottleConfig {
    ThrottleConfig {
        watch_id: WATCH.to_string(),
        min_score: 4,
        recipient: RECIPIENT.to_string(),
        sender: "Fyndvakt".to_string(),
        daily_quota: quota,
        categories: vec!["all".to_string()],
    }
}

/// Seed the store with scored listings.
async fn seed_scored(store: &MemoryStore, scores: &[(&str, u8, f32)]) {
    for (ad_id, score, confidence) in scores {
        store.upsert_listing(&new_listing(ad_id, "Bikes")).await.unwrap();
        let analysis = fyndvakt::Analysis {
            score: *score,
            confidence: *confidence,
            ..fyndvakt::Analysis::fallback("seed")
        };
        store.update_analysis(ad_id, &analysis).await.unwrap();
    }
}

#[tokio::test]
async fn test_full_cycle_discovers_scores_and_alerts() {
    init_tracing();

    let discovery = Arc::new(MockDiscovery::new().with_listings(
        WATCH,
        vec![new_listing("a", "Bikes"), new_listing("b", "Bikes")],
    ));
    let model = MockModel::new().with_responses([
        r#"{"score": 5, "confidence": 0.9, "reasoning": "very cheap"}"#,
        r#"{"score": 2, "confidence": 0.8, "reasoning": "overpriced"}"#,
    ]);
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());

    let monitor = Monitor::new(
        MonitorConfig::from_settings(WATCH, "Fyndvakt", &fyndvakt::WatchSettings {
            recipient: RECIPIENT.to_string(),
            ..Default::default()
        }),
        discovery,
        Analyzer::new(model, MockImageFetcher::new()),
        Arc::clone(&store),
        Arc::clone(&gateway),
    );

    monitor.run_once().await;

    // Both listings persisted and scored
    assert_eq!(store.listing_count(), 2);
    assert!(store
        .listings_needing_analysis(WATCH)
        .await
        .unwrap()
        .is_empty());

    // Only the score-5 listing produced an alert
    assert_eq!(gateway.sent_count(), 1);
    assert!(gateway.sent()[0].message.contains("Score: 5/5"));
    assert_eq!(gateway.sent()[0].to, RECIPIENT);

    // Second cycle: nothing new, no duplicate alert
    monitor.run_once().await;
    assert_eq!(gateway.sent_count(), 1);
}

#[tokio::test]
async fn test_quota_limits_dispatch_count() {
    let store = MemoryStore::new();
    seed_scored(
        &store,
        &[
            ("a", 5, 0.9),
            ("b", 5, 0.8),
            ("c", 4, 0.9),
            ("d", 4, 0.7),
            ("e", 4, 0.6),
        ],
    )
    .await;
    let gateway = MockGateway::new();

    let outcome = run_throttled(&store, &gateway, &throttle_config(3))
        .await
        .unwrap();

    assert_eq!(outcome.candidates, 5);
    assert_eq!(outcome.dispatched, 3);
    assert_eq!(outcome.quota_suppressed, 2);
    assert_eq!(gateway.sent_count(), 3);
    assert_eq!(store.notification_count(), 3);

    // Highest score and confidence first
    assert!(gateway.sent()[0].message.contains("Listing a"));
    assert!(gateway.sent()[1].message.contains("Listing b"));
    assert!(gateway.sent()[2].message.contains("Listing c"));
}

#[tokio::test]
async fn test_quota_spans_multiple_passes_same_day() {
    let store = MemoryStore::new();
    seed_scored(&store, &[("a", 5, 0.9), ("b", 5, 0.8), ("c", 5, 0.7)]).await;
    let gateway = MockGateway::new();

    run_throttled(&store, &gateway, &throttle_config(2))
        .await
        .unwrap();
    let second = run_throttled(&store, &gateway, &throttle_config(2))
        .await
        .unwrap();

    // The two sends from the first pass count against today's quota
    assert_eq!(second.dispatched, 0);
    assert_eq!(second.quota_suppressed, 1);
    assert_eq!(gateway.sent_count(), 2);
}

#[tokio::test]
async fn test_failed_dispatch_is_recorded_and_retried() {
    init_tracing();

    let store = MemoryStore::new();
    seed_scored(&store, &[("a", 5, 0.9)]).await;
    let gateway = MockGateway::new().failing_first(1);

    let first = run_throttled(&store, &gateway, &throttle_config(10))
        .await
        .unwrap();
    assert_eq!(first.dispatched, 0);
    assert_eq!(first.failed, 1);

    // A failed record was written but does not consume quota or suppress
    // the listing: the next pass retries and succeeds.
    assert_eq!(store.sent_count_today(RECIPIENT).await.unwrap(), 0);

    let second = run_throttled(&store, &gateway, &throttle_config(10))
        .await
        .unwrap();
    assert_eq!(second.dispatched, 1);

    let statuses: Vec<NotificationStatus> = store
        .notifications()
        .iter()
        .map(|n| n.status)
        .collect();
    assert_eq!(
        statuses,
        vec![NotificationStatus::Failed, NotificationStatus::Sent]
    );

    // Third pass: the sent record now suppresses the listing
    let third = run_throttled(&store, &gateway, &throttle_config(10))
        .await
        .unwrap();
    assert_eq!(third.candidates, 0);
}

#[tokio::test]
async fn test_category_allow_list_filters_unless_all_present() {
    let store = MemoryStore::new();
    store.upsert_listing(&new_listing("bike", "Bikes")).await.unwrap();
    store.upsert_listing(&new_listing("boat", "Boats")).await.unwrap();
    for ad_id in ["bike", "boat"] {
        let analysis = fyndvakt::Analysis {
            score: 5,
            confidence: 0.9,
            ..fyndvakt::Analysis::fallback("seed")
        };
        store.update_analysis(ad_id, &analysis).await.unwrap();
    }

    let gateway = MockGateway::new();
    let mut config = throttle_config(10);
    config.categories = vec!["Bikes".to_string()];

    let outcome = run_throttled(&store, &gateway, &config).await.unwrap();
    assert_eq!(outcome.dispatched, 1);
    assert!(gateway.sent()[0].message.contains("Listing bike"));

    // "all" alongside other values bypasses the filter entirely
    let store = MemoryStore::new();
    seed_scored(&store, &[("bike2", 5, 0.9)]).await;
    store.upsert_listing(&new_listing("boat2", "Boats")).await.unwrap();
    let analysis = fyndvakt::Analysis {
        score: 5,
        confidence: 0.8,
        ..fyndvakt::Analysis::fallback("seed")
    };
    store.update_analysis("boat2", &analysis).await.unwrap();

    let gateway = MockGateway::new();
    let mut config = throttle_config(10);
    config.categories = vec!["Bikes".to_string(), "all".to_string()];

    let outcome = run_throttled(&store, &gateway, &config).await.unwrap();
    assert_eq!(outcome.dispatched, 2);
}

#[tokio::test]
async fn test_discovery_failure_does_not_kill_the_schedule() {
    init_tracing();

    let discovery = Arc::new(MockDiscovery::new().failing());
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());

    let monitor = Monitor::new(
        MonitorConfig::new(WATCH),
        Arc::clone(&discovery),
        Analyzer::new(MockModel::new(), MockImageFetcher::new()),
        store,
        gateway,
    );

    monitor.start().await;
    // Give the immediate first tick time to run and fail
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(discovery.call_count() >= 1);
    let status = monitor.status().await;
    assert!(status.is_running, "failed tick must not cancel the schedule");

    monitor.stop().await;
    assert!(!monitor.status().await.is_running);
}

#[tokio::test]
async fn test_scoring_failures_do_not_block_other_listings() {
    let discovery = Arc::new(MockDiscovery::new().with_listings(
        WATCH,
        vec![
            new_listing("x", "Bikes"),
            new_listing("y", "Bikes"),
            new_listing("z", "Bikes"),
        ],
    ));
    // Second scoring call fails outright
    let model = MockModel::new()
        .with_response(r#"{"score": 4, "confidence": 0.8}"#)
        .failing_on_call(2);
    let store = Arc::new(MemoryStore::new());

    let monitor = Monitor::new(
        MonitorConfig::new(WATCH),
        discovery,
        Analyzer::new(model, MockImageFetcher::new()),
        Arc::clone(&store),
        Arc::new(MockGateway::new()),
    );

    monitor.run_once().await;

    // All three listings end up scored; the failed one carries the fallback
    let pending = store.listings_needing_analysis(WATCH).await.unwrap();
    assert!(pending.is_empty());

    let mut fallbacks = 0;
    for ad_id in ["x", "y", "z"] {
        let listing = store.get_listing(ad_id).await.unwrap().unwrap();
        if listing.scored.unwrap().model == fyndvakt::FALLBACK_MODEL {
            fallbacks += 1;
        }
    }
    assert_eq!(fallbacks, 1);
}

#[tokio::test]
async fn test_batch_drive_matches_monitor_scoring() {
    let model = MockModel::new().with_response(r#"{"score": 4, "confidence": 0.6}"#);
    let analyzer = Analyzer::new(model, MockImageFetcher::new());

    let listings: Vec<ListingForAnalysis> = (0..7)
        .map(|i| ListingForAnalysis::from(&new_listing(&format!("ad-{}", i), "Bikes")))
        .collect();

    let config = DriveConfig {
        chunk: ChunkConfig {
            chunk_size: 3,
            item_delay: Duration::ZERO,
        },
        chunk_delay: Duration::ZERO,
    };

    let mut chunks = 0;
    let results = analyze_all(&analyzer, &listings, &config, |_| chunks += 1).await;

    assert_eq!(results.len(), 7);
    assert_eq!(chunks, 3);
    assert!(results.iter().all(|r| r.success && r.analysis.score == 4));
}
