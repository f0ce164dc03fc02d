//! Run orchestration - one complete hunt cycle.
//!
//! normalize -> quick filter -> deep review -> store -> decide -> deliver.
//! Per-listing failures (malformed payloads, scorer errors, delivery
//! failures) are isolated and logged; only a store failure aborts the
//! run, because without dedup memory no safe notification decision
//! exists.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::filter::{self, FilterDecision};
use crate::normalize;
use crate::notify::Notifier;
use crate::review::{DeepReviewer, Scorer};
use crate::store::ListingStore;
use crate::types::{
    Criteria, EvaluatedListing, ListingState, OutcomeTier, RawListing, RunResult,
};

/// The evaluation pipeline, wired to a store and a scorer.
pub struct HuntPipeline<S: Scorer + 'static> {
    store: Arc<dyn ListingStore>,
    reviewer: DeepReviewer<S>,
    criteria: Criteria,
}

impl<S: Scorer + 'static> HuntPipeline<S> {
    pub fn new(store: Arc<dyn ListingStore>, scorer: S, criteria: Criteria) -> Self {
        let reviewer = DeepReviewer::new(scorer, &criteria);
        Self {
            store,
            reviewer,
            criteria,
        }
    }

    /// Evaluate a batch of raw listings without delivering anything.
    ///
    /// Every surviving listing is upserted into the store (quick-filter
    /// rejects included, so city averages see the whole market), states
    /// are decided, and the closest miss is selected when nothing
    /// qualified. Delivery is a separate step so a dry run can inspect
    /// the result first.
    pub async fn evaluate(&self, raw: &[RawListing], now: DateTime<Utc>) -> Result<RunResult> {
        let run_id = Uuid::new_v4();
        info!(%run_id, listings = raw.len(), "starting hunt run");

        let mut dropped_malformed = 0;
        let mut seen_keys = HashSet::new();
        let mut normalized = Vec::new();
        for payload in raw {
            match normalize::normalize(payload, now) {
                Ok(listing) => {
                    // First occurrence wins when a provider page repeats
                    // a listing.
                    if seen_keys.insert(listing.identity_key.clone()) {
                        normalized.push(listing);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "dropping malformed listing");
                    dropped_malformed += 1;
                }
            }
        }

        let mut quick_rejected = Vec::new();
        let mut survivors = Vec::new();
        for listing in normalized {
            match filter::evaluate(&listing, &self.criteria) {
                FilterDecision::Pass => survivors.push(listing),
                FilterDecision::Reject(reason) => {
                    debug!(
                        identity_key = %listing.identity_key,
                        %reason,
                        "quick filter rejected listing"
                    );
                    self.store
                        .upsert(&listing, OutcomeTier::Reject, now)
                        .await?;
                    quick_rejected.push((listing.identity_key, reason));
                }
            }
        }

        if survivors.len() > self.criteria.max_deep_reviews {
            warn!(
                survivors = survivors.len(),
                cap = self.criteria.max_deep_reviews,
                "deep-review cap reached, deferring the rest to the next run"
            );
            survivors.truncate(self.criteria.max_deep_reviews);
        }

        let outcomes = self.reviewer.review_batch(&survivors).await;

        let mut evaluated = Vec::new();
        let mut review_errors = Vec::new();
        for (listing, outcome) in survivors.into_iter().zip(outcomes) {
            self.store.upsert(&listing, outcome.tier, now).await?;
            if let Some(error) = &outcome.error {
                review_errors.push(format!("{}: {error}", listing.identity_key));
            }

            let state = if outcome.tier == OutcomeTier::Reject {
                ListingState::Rejected
            } else if outcome.tier >= self.criteria.notify_threshold
                && self
                    .store
                    .should_notify(&listing.identity_key, outcome.tier)
                    .await?
            {
                ListingState::Notified
            } else {
                ListingState::Suppressed
            };

            evaluated.push(EvaluatedListing {
                listing,
                tier: outcome.tier,
                rationale: outcome.rationale,
                state,
            });
        }

        let qualifying: Vec<EvaluatedListing> = evaluated
            .iter()
            .filter(|e| e.state == ListingState::Notified)
            .cloned()
            .collect();

        let closest_miss = if qualifying.is_empty() {
            self.select_closest_miss(&evaluated).await?
        } else {
            None
        };

        let result = RunResult {
            run_id,
            started_at: now,
            completed_at: Utc::now(),
            listings_seen: raw.len(),
            dropped_malformed,
            quick_rejected,
            evaluated,
            qualifying,
            closest_miss,
            review_errors,
        };

        info!(
            %run_id,
            qualifying = result.qualifying.len(),
            quick_rejected = result.quick_rejected.len(),
            dropped = result.dropped_malformed,
            closest_miss = result.closest_miss.is_some(),
            "hunt run evaluated"
        );
        Ok(result)
    }

    /// Deliver a run's notifications and record confirmed deliveries.
    ///
    /// `mark_notified` is called only after the channel confirms; a
    /// failed delivery is logged and the listing stays eligible next
    /// run. Returns the number of confirmed deliveries.
    pub async fn deliver(
        &self,
        result: &RunResult,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let mut delivered = 0;

        for qualifying in &result.qualifying {
            match notifier.notify_match(qualifying).await {
                Ok(()) => {
                    self.store
                        .mark_notified(&qualifying.listing.identity_key, now)
                        .await?;
                    delivered += 1;
                }
                Err(err) => warn!(error = %err, "match notification failed"),
            }
        }

        if let Some(miss) = &result.closest_miss {
            match notifier.notify_closest_miss(miss).await {
                Ok(()) => {
                    self.store
                        .mark_notified(&miss.listing.identity_key, now)
                        .await?;
                    delivered += 1;
                }
                Err(err) => warn!(error = %err, "closest-miss notification failed"),
            }
        }

        Ok(delivered)
    }

    /// One full cycle: evaluate then deliver.
    pub async fn run(
        &self,
        raw: &[RawListing],
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> Result<RunResult> {
        let result = self.evaluate(raw, now).await?;
        self.deliver(&result, notifier, now).await?;
        Ok(result)
    }

    /// Pick the best non-qualifying listing.
    ///
    /// Candidates are the suppressed survivors the store would still
    /// announce (a miss already reported at this price and tier stays
    /// quiet). Ranking: higher tier first, then the better relative
    /// deal (lower price against the city's average; no average ranks
    /// last within the tier), then the earliest identity key for a
    /// stable result.
    async fn select_closest_miss(
        &self,
        evaluated: &[EvaluatedListing],
    ) -> Result<Option<EvaluatedListing>> {
        let mut candidates = Vec::new();
        for entry in evaluated {
            if entry.state != ListingState::Suppressed {
                continue;
            }
            if !self
                .store
                .should_notify(&entry.listing.identity_key, entry.tier)
                .await?
            {
                continue;
            }
            let ratio = match self.store.city_average_price(&entry.listing.city).await? {
                Some(avg) if avg > 0.0 => entry.listing.price as f64 / avg,
                _ => f64::INFINITY,
            };
            candidates.push((entry, ratio));
        }

        candidates.sort_by(|(a, ra), (b, rb)| {
            b.tier
                .cmp(&a.tier)
                .then(ra.partial_cmp(rb).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.listing.identity_key.cmp(&b.listing.identity_key))
        });

        Ok(candidates.first().map(|(entry, _)| (*entry).clone()))
    }
}
