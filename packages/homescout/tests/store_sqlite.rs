//! SqliteStore behavior against the same contract the memory store obeys.

#![cfg(feature = "sqlite")]

use chrono::{Duration, Utc};

use homescout::{
    BasementSignal, Listing, ListingStore, OutcomeTier, SqliteStore,
};

fn listing(key: &str, city: &str, price: u64) -> Listing {
    Listing {
        identity_key: key.into(),
        address: format!("{key} Maple Ave"),
        city: city.into(),
        state: "OH".into(),
        price,
        beds: Some(3),
        baths: Some(2.0),
        sqft: Some(1_700),
        age_years: Some(30),
        has_pool: Some(false),
        days_on_market: Some(2),
        listing_url: None,
        basement_signal: BasementSignal::Finished,
        raw_text_fields: vec![],
    }
}

#[tokio::test]
async fn test_round_trip_and_tier_update() {
    let store = SqliteStore::in_memory().await.unwrap();
    let now = Utc::now();

    let first = store
        .upsert(&listing("p1", "Westlake", 300_000), OutcomeTier::CloseMatch, now)
        .await
        .unwrap();
    assert!(first.is_new);

    let second = store
        .upsert(
            &listing("p1", "Westlake", 300_000),
            OutcomeTier::CompleteMatch,
            now + Duration::hours(3),
        )
        .await
        .unwrap();
    assert!(!second.is_new);
    assert!(!second.price_changed);
    assert_eq!(second.previous_tier, Some(OutcomeTier::CloseMatch));

    let record = store.get("p1").await.unwrap().unwrap();
    assert_eq!(record.last_outcome_tier, OutcomeTier::CompleteMatch);
    assert_eq!(record.price_history.len(), 1);
    assert_eq!(record.current_price(), 300_000);
}

#[tokio::test]
async fn test_price_history_appends_only_on_change() {
    let store = SqliteStore::in_memory().await.unwrap();
    let now = Utc::now();

    store
        .upsert(&listing("p1", "Westlake", 300_000), OutcomeTier::PartialMatch, now)
        .await
        .unwrap();
    store
        .upsert(
            &listing("p1", "Westlake", 300_000),
            OutcomeTier::PartialMatch,
            now + Duration::hours(3),
        )
        .await
        .unwrap();
    let outcome = store
        .upsert(
            &listing("p1", "Westlake", 285_000),
            OutcomeTier::PartialMatch,
            now + Duration::days(1),
        )
        .await
        .unwrap();
    assert!(outcome.price_changed);

    let record = store.get("p1").await.unwrap().unwrap();
    assert_eq!(record.price_history.len(), 2);
    assert!(record.price_history[0].at < record.price_history[1].at);
}

#[tokio::test]
async fn test_price_change_guard_uses_last_price_point() {
    let store = SqliteStore::in_memory().await.unwrap();
    let now = Utc::now();

    store
        .upsert(&listing("p1", "Westlake", 300_000), OutcomeTier::PartialMatch, now)
        .await
        .unwrap();
    // Advances last_seen well past the only price point.
    store
        .upsert(
            &listing("p1", "Westlake", 300_000),
            OutcomeTier::PartialMatch,
            now + Duration::days(2),
        )
        .await
        .unwrap();

    // A price change observed after the last price point must still
    // register, even though last_seen is already later.
    let outcome = store
        .upsert(
            &listing("p1", "Westlake", 285_000),
            OutcomeTier::PartialMatch,
            now + Duration::days(1),
        )
        .await
        .unwrap();
    assert!(outcome.price_changed);

    let record = store.get("p1").await.unwrap().unwrap();
    assert_eq!(record.price_history.len(), 2);
    assert_eq!(record.current_price(), 285_000);
}

#[tokio::test]
async fn test_notification_cycle_survives_reload() {
    let store = SqliteStore::in_memory().await.unwrap();
    let now = Utc::now();
    let l = listing("p1", "Westlake", 300_000);

    store
        .upsert(&l, OutcomeTier::CompleteMatch, now)
        .await
        .unwrap();
    assert!(store
        .should_notify("p1", OutcomeTier::CompleteMatch)
        .await
        .unwrap());

    store.mark_notified("p1", now).await.unwrap();
    assert!(!store
        .should_notify("p1", OutcomeTier::CompleteMatch)
        .await
        .unwrap());

    // Price movement re-arms.
    store
        .upsert(
            &listing("p1", "Westlake", 280_000),
            OutcomeTier::CompleteMatch,
            now + Duration::days(1),
        )
        .await
        .unwrap();
    assert!(store
        .should_notify("p1", OutcomeTier::CompleteMatch)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_city_average_and_drops() {
    let store = SqliteStore::in_memory().await.unwrap();
    let now = Utc::now();

    store
        .upsert(&listing("p1", "Westlake", 200_000), OutcomeTier::Reject, now)
        .await
        .unwrap();
    store
        .upsert(&listing("p2", "Westlake", 300_000), OutcomeTier::Reject, now)
        .await
        .unwrap();
    store
        .upsert(
            &listing("p2", "Westlake", 270_000),
            OutcomeTier::Reject,
            now + Duration::days(1),
        )
        .await
        .unwrap();

    let avg = store.city_average_price("westlake").await.unwrap().unwrap();
    assert!((avg - 235_000.0).abs() < 1.0);

    let drops = store.recent_price_drops(5.0, now).await.unwrap();
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].identity_key, "p2");
    assert_eq!(drops[0].old_price, 300_000);
    assert_eq!(drops[0].new_price, 270_000);
}

#[tokio::test]
async fn test_prune_and_stats() {
    let store = SqliteStore::in_memory().await.unwrap();
    let old = Utc::now() - Duration::days(120);

    store
        .upsert(&listing("stale", "Westlake", 250_000), OutcomeTier::Reject, old)
        .await
        .unwrap();
    store
        .upsert(&listing("kept", "Westlake", 250_000), OutcomeTier::CloseMatch, old)
        .await
        .unwrap();
    store.mark_notified("kept", old).await.unwrap();

    let removed = store
        .prune_stale(Utc::now() - Duration::days(90))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_tracked, 1);
    assert_eq!(stats.notified_count, 1);
    assert!(stats.avg_price_per_city.contains_key("Westlake"));
}
