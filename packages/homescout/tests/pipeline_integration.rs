//! End-to-end pipeline tests over the in-memory store.

use chrono::{Duration, Utc};
use std::sync::Arc;

use homescout::testing::{MockNotifier, MockScorer};
use homescout::{
    Criteria, HuntPipeline, ListingState, ListingStore, MemoryStore, OutcomeTier, RawListing,
    TextBlock,
};

fn raw(key: &str, city: &str, price: u64) -> RawListing {
    RawListing {
        property_id: Some(key.into()),
        address: Some(format!("{key} Maple Ave")),
        city: Some(city.into()),
        state: Some("OH".into()),
        zip_code: Some("44145".into()),
        price: Some(price),
        beds: Some(3),
        baths: Some(2.0),
        sqft: Some(1_700),
        year_built: Some(1988),
        property_type: Some("single_family".into()),
        days_on_market: Some(2),
        has_pool: Some(false),
        listing_url: Some(format!("https://example.com/{key}")),
        description: Some("Well kept colonial with finished basement rec room".into()),
        details: vec![TextBlock {
            category: "Basement".into(),
            text: vec!["Basement: Finished".into()],
        }],
        features: vec![],
    }
}

#[tokio::test]
async fn test_mixed_batch_full_cycle() {
    let scorer = MockScorer::new()
        .with_tier("match", "complete_match", "finished basement confirmed")
        .with_tier("maybe", "partial_match", "basement unconfirmed");
    let store = Arc::new(MemoryStore::new());
    let criteria = Criteria::default().with_avoid_cities(["Parma"]);
    let pipeline = HuntPipeline::new(store.clone(), scorer.clone(), criteria);
    let notifier = MockNotifier::new();
    let now = Utc::now();

    let mut no_identity = raw("x", "Westlake", 300_000);
    no_identity.property_id = None;

    let batch = vec![
        raw("match", "Westlake", 300_000),
        raw("maybe", "Westlake", 280_000),
        raw("expensive", "Westlake", 900_000),
        raw("avoided", "Parma", 250_000),
        no_identity,
    ];

    let result = pipeline.run(&batch, &notifier, now).await.unwrap();

    assert_eq!(result.listings_seen, 5);
    assert_eq!(result.dropped_malformed, 1);
    assert_eq!(result.quick_rejected.len(), 2);
    assert_eq!(result.evaluated.len(), 2);
    assert_eq!(result.qualifying.len(), 1);
    assert!(result.closest_miss.is_none());
    assert_eq!(notifier.delivered_matches(), vec!["match"]);

    // Quick rejects never reached the scorer but are remembered.
    assert_eq!(scorer.call_count("expensive"), 0);
    let record = store.get("expensive").await.unwrap().unwrap();
    assert_eq!(record.last_outcome_tier, OutcomeTier::Reject);

    // The partial match stays quiet while a real match exists.
    let maybe = result
        .evaluated
        .iter()
        .find(|e| e.listing.identity_key == "maybe")
        .unwrap();
    assert_eq!(maybe.state, ListingState::Suppressed);
}

#[tokio::test]
async fn test_three_run_dedup_and_price_drop_story() {
    let scorer = MockScorer::new().with_tier("p1", "complete_match", "checks every box");
    let store = Arc::new(MemoryStore::new());
    let pipeline = HuntPipeline::new(store.clone(), scorer, Criteria::default());
    let notifier = MockNotifier::new();
    let t0 = Utc::now();

    // Run 1: fresh listing, notified.
    let r1 = pipeline
        .run(&[raw("p1", "Westlake", 300_000)], &notifier, t0)
        .await
        .unwrap();
    assert_eq!(r1.qualifying.len(), 1);

    // Run 2: identical observation, suppressed.
    let r2 = pipeline
        .run(
            &[raw("p1", "Westlake", 300_000)],
            &notifier,
            t0 + Duration::hours(3),
        )
        .await
        .unwrap();
    assert!(r2.qualifying.is_empty());
    assert!(r2.closest_miss.is_none());

    // Run 3: price dropped, notified again.
    let r3 = pipeline
        .run(
            &[raw("p1", "Westlake", 275_000)],
            &notifier,
            t0 + Duration::days(2),
        )
        .await
        .unwrap();
    assert_eq!(r3.qualifying.len(), 1);
    assert_eq!(notifier.delivered_matches(), vec!["p1", "p1"]);

    let record = store.get("p1").await.unwrap().unwrap();
    assert_eq!(record.price_history.len(), 2);
    assert_eq!(record.current_price(), 275_000);

    let drops = store
        .recent_price_drops(5.0, t0 + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].new_price, 275_000);
}

#[tokio::test]
async fn test_closest_miss_is_not_repeated_across_runs() {
    let scorer = MockScorer::new().with_tier("near", "partial_match", "no basement mention");
    let store = Arc::new(MemoryStore::new());
    let pipeline = HuntPipeline::new(store, scorer, Criteria::default());
    let notifier = MockNotifier::new();
    let t0 = Utc::now();

    let r1 = pipeline
        .run(&[raw("near", "Westlake", 300_000)], &notifier, t0)
        .await
        .unwrap();
    assert!(r1.closest_miss.is_some());

    // Same listing, same price, same tier: nothing new to say.
    let r2 = pipeline
        .run(
            &[raw("near", "Westlake", 300_000)],
            &notifier,
            t0 + Duration::hours(3),
        )
        .await
        .unwrap();
    assert!(r2.closest_miss.is_none());
    assert_eq!(notifier.delivered_closest_misses(), vec!["near"]);
}

#[tokio::test]
async fn test_scorer_outage_run_survives_and_recovers() {
    let scorer = MockScorer::new()
        .failing_for("down")
        .with_tier("up", "complete_match", "fits");
    let store = Arc::new(MemoryStore::new());
    let criteria = Criteria::default().with_review_retries(1);
    let pipeline = HuntPipeline::new(store.clone(), scorer, criteria);
    let notifier = MockNotifier::new();

    let result = pipeline
        .run(
            &[raw("down", "Westlake", 300_000), raw("up", "Westlake", 310_000)],
            &notifier,
            Utc::now(),
        )
        .await
        .unwrap();

    // The failing listing is downgraded, the healthy one still lands.
    assert_eq!(result.qualifying.len(), 1);
    assert_eq!(result.review_errors.len(), 1);
    assert!(result.review_errors[0].starts_with("down:"));
    let record = store.get("down").await.unwrap().unwrap();
    assert_eq!(record.last_outcome_tier, OutcomeTier::Reject);
}

#[tokio::test]
async fn test_duplicate_payloads_within_run_count_once() {
    let scorer = MockScorer::new().with_tier("p1", "complete_match", "");
    let store = Arc::new(MemoryStore::new());
    let pipeline = HuntPipeline::new(store.clone(), scorer.clone(), Criteria::default());
    let notifier = MockNotifier::new();

    let result = pipeline
        .run(
            &[raw("p1", "Westlake", 300_000), raw("p1", "Westlake", 300_000)],
            &notifier,
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(result.evaluated.len(), 1);
    assert_eq!(scorer.call_count("p1"), 1);
    assert_eq!(notifier.delivered_matches(), vec!["p1"]);
    assert_eq!(store.record_count(), 1);
}
