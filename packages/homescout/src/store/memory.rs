//! In-memory store implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::types::{Listing, ListingRecord, OutcomeTier, PriceDrop, StoreStats, UpsertOutcome};

use super::{apply_observation, count_drops, new_record, ListingStore};

/// In-memory listing records.
///
/// Useful for tests and development. Not suitable for production as the
/// dedup memory is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ListingRecord>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked records.
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Drop all records.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn get(&self, identity_key: &str) -> StoreResult<Option<ListingRecord>> {
        Ok(self.records.read().unwrap().get(identity_key).cloned())
    }

    async fn upsert(
        &self,
        listing: &Listing,
        tier: OutcomeTier,
        at: DateTime<Utc>,
    ) -> StoreResult<UpsertOutcome> {
        let mut records = self.records.write().unwrap();
        match records.get_mut(&listing.identity_key) {
            Some(record) => Ok(apply_observation(record, listing, tier, at)),
            None => {
                records.insert(listing.identity_key.clone(), new_record(listing, tier, at));
                Ok(UpsertOutcome {
                    is_new: true,
                    price_changed: false,
                    previous_tier: None,
                })
            }
        }
    }

    async fn should_notify(&self, identity_key: &str, tier: OutcomeTier) -> StoreResult<bool> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(identity_key)
            .map(|record| record.wants_notification(tier))
            .unwrap_or(true))
    }

    async fn mark_notified(&self, identity_key: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut records = self.records.write().unwrap();
        if let Some(record) = records.get_mut(identity_key) {
            record.notified_at = Some(at);
            record.notified_price = Some(record.current_price());
            record.notified_tier = Some(record.last_outcome_tier);
        }
        Ok(())
    }

    async fn city_average_price(&self, city: &str) -> StoreResult<Option<f64>> {
        let records = self.records.read().unwrap();
        let prices: Vec<u64> = records
            .values()
            .filter(|r| r.city.eq_ignore_ascii_case(city) && r.current_price() > 0)
            .map(|r| r.current_price())
            .collect();
        if prices.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            prices.iter().sum::<u64>() as f64 / prices.len() as f64,
        ))
    }

    async fn recent_price_drops(
        &self,
        min_drop_percent: f64,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<PriceDrop>> {
        let records = self.records.read().unwrap();
        let mut drops = Vec::new();
        for record in records.values() {
            let [.., prev, last] = record.price_history.as_slice() else {
                continue;
            };
            if last.at < since || last.price >= prev.price {
                continue;
            }
            let drop_percent = (prev.price - last.price) as f64 * 100.0 / prev.price as f64;
            if drop_percent >= min_drop_percent {
                drops.push(PriceDrop {
                    identity_key: record.identity_key.clone(),
                    address: record.address.clone(),
                    city: record.city.clone(),
                    old_price: prev.price,
                    new_price: last.price,
                    drop_percent,
                    at: last.at,
                });
            }
        }
        drops.sort_by(|a, b| {
            b.drop_percent
                .partial_cmp(&a.drop_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(drops)
    }

    async fn prune_stale(&self, older_than: DateTime<Utc>) -> StoreResult<usize> {
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|_, r| r.notified_at.is_some() || r.first_seen >= older_than);
        Ok(before - records.len())
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        let records = self.records.read().unwrap();
        let mut by_city: HashMap<String, (u64, usize)> = HashMap::new();
        let mut price_drops_observed = 0;
        let mut notified_count = 0;

        for record in records.values() {
            price_drops_observed += count_drops(&record.price_history);
            if record.notified_at.is_some() {
                notified_count += 1;
            }
            if record.current_price() > 0 {
                let entry = by_city.entry(record.city.clone()).or_default();
                entry.0 += record.current_price();
                entry.1 += 1;
            }
        }

        Ok(StoreStats {
            total_tracked: records.len(),
            notified_count,
            price_drops_observed,
            avg_price_per_city: by_city
                .into_iter()
                .map(|(city, (sum, n))| (city, sum as f64 / n as f64))
                .collect(),
        })
    }
}
