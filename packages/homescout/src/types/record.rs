//! Persisted record types - the store's view of a listing across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::listing::OutcomeTier;

/// One observed price at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub at: DateTime<Utc>,
    pub price: u64,
}

/// A listing's cross-run state, keyed by identity.
///
/// Created on first observation, updated every run that re-observes the
/// identity key, never deleted (dedup requires permanent memory). The
/// price history is append-only with strictly increasing timestamps and
/// no two consecutive entries sharing a price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRecord {
    pub identity_key: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub price_history: Vec<PricePoint>,
    pub last_outcome_tier: OutcomeTier,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub notified_at: Option<DateTime<Utc>>,
    /// Price snapshot taken when the last notification was confirmed
    pub notified_price: Option<u64>,
    /// Tier snapshot taken when the last notification was confirmed
    pub notified_tier: Option<OutcomeTier>,
}

impl ListingRecord {
    /// The most recently recorded price.
    ///
    /// Always present: a record is created with a one-entry history.
    pub fn current_price(&self) -> u64 {
        self.price_history
            .last()
            .map(|p| p.price)
            .unwrap_or_default()
    }

    /// Whether a notification decision would fire for `tier` right now.
    ///
    /// True if never notified, the price moved since the last
    /// notification, or the tier improved over the notified tier. This
    /// is the core anti-spam invariant: unchanged tier + unchanged price
    /// + already notified means stay quiet.
    pub fn wants_notification(&self, tier: OutcomeTier) -> bool {
        let (Some(notified_price), Some(notified_tier)) = (self.notified_price, self.notified_tier)
        else {
            return true;
        };
        if self.notified_at.is_none() {
            return true;
        }
        self.current_price() != notified_price || tier > notified_tier
    }
}

/// What `upsert` did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// First observation of this identity key
    pub is_new: bool,
    /// Observed price differed from the last recorded price
    pub price_changed: bool,
    /// Tier the record held before this run's update
    pub previous_tier: Option<OutcomeTier>,
}

/// A detected price drop, for re-notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceDrop {
    pub identity_key: String,
    pub address: String,
    pub city: String,
    pub old_price: u64,
    pub new_price: u64,
    pub drop_percent: f64,
    pub at: DateTime<Utc>,
}

/// Read-only diagnostic aggregation over the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_tracked: usize,
    pub notified_count: usize,
    pub price_drops_observed: usize,
    pub avg_price_per_city: HashMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: u64) -> ListingRecord {
        let now = Utc::now();
        ListingRecord {
            identity_key: "p1".into(),
            address: "12 Elm St".into(),
            city: "Westlake".into(),
            state: "OH".into(),
            price_history: vec![PricePoint { at: now, price }],
            last_outcome_tier: OutcomeTier::CloseMatch,
            first_seen: now,
            last_seen: now,
            notified_at: None,
            notified_price: None,
            notified_tier: None,
        }
    }

    #[test]
    fn test_never_notified_wants_notification() {
        let rec = record(250_000);
        assert!(rec.wants_notification(OutcomeTier::CloseMatch));
    }

    #[test]
    fn test_unchanged_after_notification_stays_quiet() {
        let mut rec = record(250_000);
        rec.notified_at = Some(Utc::now());
        rec.notified_price = Some(250_000);
        rec.notified_tier = Some(OutcomeTier::CloseMatch);
        assert!(!rec.wants_notification(OutcomeTier::CloseMatch));
    }

    #[test]
    fn test_price_move_or_tier_improvement_fires() {
        let mut rec = record(250_000);
        rec.notified_at = Some(Utc::now());
        rec.notified_price = Some(260_000);
        rec.notified_tier = Some(OutcomeTier::CloseMatch);
        assert!(rec.wants_notification(OutcomeTier::CloseMatch));

        rec.notified_price = Some(250_000);
        assert!(rec.wants_notification(OutcomeTier::CompleteMatch));
        assert!(!rec.wants_notification(OutcomeTier::CloseMatch));
    }
}
