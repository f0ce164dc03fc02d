//! Deep reviewer - the contract around the external scoring capability.
//!
//! The scorer itself is an opaque, non-deterministic classifier behind
//! the [`Scorer`] trait. This module owns everything around it:
//! deterministic payload construction, tier validation, bounded retries,
//! and per-listing failure isolation. One bad listing must never lose
//! the rest of the batch.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::ReviewError;
use crate::types::{Criteria, Listing, OutcomeTier};

/// Deterministic input payload for one scorer call.
///
/// Built from the listing's ordered field rendering plus the derived
/// basement signal; the same listing always produces the same payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub identity_key: String,
    pub rendered: String,
}

impl ReviewRequest {
    pub fn for_listing(listing: &Listing) -> Self {
        Self {
            identity_key: listing.identity_key.clone(),
            rendered: listing.render_for_review(),
        }
    }
}

/// Raw scorer reply: a tier string plus free-text rationale.
///
/// The tier is validated against [`OutcomeTier`] by the reviewer; the
/// scorer implementation does not interpret it.
#[derive(Debug, Clone)]
pub struct ScorerResponse {
    pub tier: String,
    pub rationale: String,
}

/// External scoring capability.
///
/// Implementations wrap a specific provider (OpenAI, a fixture, a mock).
/// Keeping this seam narrow keeps the pipeline's own logic deterministic
/// and unit-testable with a fixed-response stand-in.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, request: &ReviewRequest) -> Result<ScorerResponse, ReviewError>;
}

/// Outcome of deep review for one listing.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub identity_key: String,
    pub tier: OutcomeTier,
    pub rationale: String,
    /// Set when the listing was downgraded to Reject by a failure
    pub error: Option<String>,
}

/// Drives the scorer over a batch of listings.
pub struct DeepReviewer<S: Scorer> {
    scorer: Arc<S>,
    retries: u32,
    concurrency: usize,
}

impl<S: Scorer + 'static> DeepReviewer<S> {
    pub fn new(scorer: S, criteria: &Criteria) -> Self {
        Self {
            scorer: Arc::new(scorer),
            retries: criteria.review_retries,
            concurrency: criteria.review_concurrency.max(1),
        }
    }

    /// Review a batch, preserving input order.
    ///
    /// Calls are issued with bounded fan-out purely as a latency
    /// optimization; each listing's classification is independent, so
    /// concurrency cannot change any outcome.
    pub async fn review_batch(&self, listings: &[Listing]) -> Vec<ReviewOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        let futures: Vec<_> = listings
            .iter()
            .map(|listing| {
                let scorer = Arc::clone(&self.scorer);
                let semaphore = Arc::clone(&semaphore);
                let request = ReviewRequest::for_listing(listing);
                let retries = self.retries;
                async move {
                    // Semaphore cannot close while we hold it.
                    let _permit = semaphore.acquire().await.expect("semaphore closed");
                    review_one(scorer.as_ref(), &request, retries).await
                }
            })
            .collect();

        futures::future::join_all(futures).await
    }
}

/// Score one listing with bounded retries, failing closed.
///
/// Transport failures are retried up to `retries` extra attempts; an
/// unrecognized tier value is a protocol error and is not retried (the
/// scorer answered, it just answered badly). Either way exhaustion
/// downgrades the listing to `Reject` with the error recorded.
async fn review_one(scorer: &dyn Scorer, request: &ReviewRequest, retries: u32) -> ReviewOutcome {
    let attempts = retries + 1;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match scorer.score(request).await {
            Ok(response) => match response.tier.parse::<OutcomeTier>() {
                Ok(tier) => {
                    debug!(
                        identity_key = %request.identity_key,
                        %tier,
                        "deep review classified listing"
                    );
                    return ReviewOutcome {
                        identity_key: request.identity_key.clone(),
                        tier,
                        rationale: response.rationale,
                        error: None,
                    };
                }
                Err(err) => {
                    warn!(
                        identity_key = %request.identity_key,
                        error = %err,
                        "scorer returned unknown tier, failing closed"
                    );
                    return rejected(request, err.to_string());
                }
            },
            Err(err) => {
                warn!(
                    identity_key = %request.identity_key,
                    attempt,
                    attempts,
                    error = %err,
                    "scorer call failed"
                );
                last_error = err.to_string();
            }
        }
    }

    let err = ReviewError::Exhausted {
        attempts,
        last: last_error,
    };
    rejected(request, err.to_string())
}

fn rejected(request: &ReviewRequest, error: String) -> ReviewOutcome {
    ReviewOutcome {
        identity_key: request.identity_key.clone(),
        tier: OutcomeTier::Reject,
        rationale: String::new(),
        error: Some(error),
    }
}
