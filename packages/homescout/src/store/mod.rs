//! Persistent store - the single source of cross-run memory.
//!
//! Keyed by identity, append-only price history, "already notified"
//! tracking. No other component retains state between runs; any storage
//! technology satisfying [`ListingStore`] is acceptable. Two backends
//! ship here: [`MemoryStore`] for tests and development, and a durable
//! sqlite backend behind the `sqlite` feature.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::types::{Listing, ListingRecord, OutcomeTier, PriceDrop, StoreStats, UpsertOutcome};

pub mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Contract for cross-run listing memory.
///
/// All writes touching one identity key within a run are serialized by
/// the implementation (a lock or a transaction per record); at most one
/// run executes at a time, enforced outside this crate.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Fetch one record.
    async fn get(&self, identity_key: &str) -> StoreResult<Option<ListingRecord>>;

    /// Atomic read-modify-write for one observation.
    ///
    /// Creates the record with a one-entry price history on first
    /// observation; appends a price point only when the observed price
    /// differs from the last recorded price; always updates the outcome
    /// tier and `last_seen`. Idempotent per listing: repeating an
    /// unchanged observation changes nothing.
    async fn upsert(
        &self,
        listing: &Listing,
        tier: OutcomeTier,
        at: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome>;

    /// The anti-spam decision.
    ///
    /// True for a new or never-notified record, a price that moved since
    /// the last notification, or a tier that improved over the notified
    /// tier. False when tier, price, and notification state are all
    /// unchanged. An unknown identity key answers true (a record the
    /// store has never seen cannot have been notified).
    async fn should_notify(&self, identity_key: &str, tier: OutcomeTier) -> StoreResult<bool>;

    /// Record a confirmed delivery.
    ///
    /// Must be called only after the notification channel confirms
    /// delivery, never speculatively: an undelivered notification stays
    /// eligible for retry on the next run.
    async fn mark_notified(&self, identity_key: &str, at: DateTime<Utc>) -> StoreResult<()>;

    /// Average of the latest observed price across a city's records.
    async fn city_average_price(&self, city: &str) -> StoreResult<Option<f64>>;

    /// Records whose latest price point is a drop of at least
    /// `min_drop_percent` against the previous one, observed at or
    /// after `since`.
    async fn recent_price_drops(
        &self,
        min_drop_percent: f64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<PriceDrop>>;

    /// Delete never-notified records first seen before `older_than`.
    /// Notified records are kept forever (dedup memory).
    async fn prune_stale(&self, older_than: DateTime<Utc>) -> StoreResult<usize>;

    /// Read-only diagnostics. Never mutates state.
    async fn stats(&self) -> StoreResult<StoreStats>;
}

/// Shared upsert logic over an in-memory record.
///
/// Both backends reduce to this transition so their semantics cannot
/// drift apart: sqlite loads the row, applies it, and writes back
/// inside a transaction.
pub(crate) fn apply_observation(
    record: &mut ListingRecord,
    listing: &Listing,
    tier: OutcomeTier,
    at: DateTime<Utc>,
) -> UpsertOutcome {
    let previous_tier = Some(record.last_outcome_tier);
    let last = record
        .price_history
        .last()
        .copied()
        .expect("record always has at least one price point");

    // Timestamps stay strictly increasing; a same-instant replay of a
    // different price is ignored rather than corrupting the history.
    let price_changed = listing.price != last.price && at > last.at;
    if price_changed {
        record.price_history.push(crate::types::PricePoint {
            at,
            price: listing.price,
        });
    }

    record.last_outcome_tier = tier;
    record.last_seen = at;

    UpsertOutcome {
        is_new: false,
        price_changed,
        previous_tier,
    }
}

/// Build a fresh record for a first observation.
pub(crate) fn new_record(listing: &Listing, tier: OutcomeTier, at: DateTime<Utc>) -> ListingRecord {
    ListingRecord {
        identity_key: listing.identity_key.clone(),
        address: listing.address.clone(),
        city: listing.city.clone(),
        state: listing.state.clone(),
        price_history: vec![crate::types::PricePoint {
            at,
            price: listing.price,
        }],
        last_outcome_tier: tier,
        first_seen: at,
        last_seen: at,
        notified_at: None,
        notified_price: None,
        notified_tier: None,
    }
}

/// Count downward consecutive moves in a price history.
pub(crate) fn count_drops(history: &[crate::types::PricePoint]) -> usize {
    history.windows(2).filter(|w| w[1].price < w[0].price).count()
}
