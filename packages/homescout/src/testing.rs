//! Scripted stand-ins for the external capabilities.
//!
//! Used by unit and integration tests; compiled into the library so
//! downstream crates can drive the pipeline without live providers.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::error::{NotifyError, ReviewError};
use crate::notify::Notifier;
use crate::review::{ReviewRequest, Scorer, ScorerResponse};
use crate::types::EvaluatedListing;

/// Scripted scorer with per-key call tracking.
///
/// Keys with no scripted response answer with a malformed-response
/// error, so a test that forgets to script a listing fails loudly.
#[derive(Clone, Default)]
pub struct MockScorer {
    responses: Arc<RwLock<HashMap<String, (String, String)>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<HashMap<String, usize>>>,
}

impl MockScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a (tier, rationale) reply for an identity key.
    pub fn with_tier(
        self,
        identity_key: impl Into<String>,
        tier: impl Into<String>,
        rationale: impl Into<String>,
    ) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(identity_key.into(), (tier.into(), rationale.into()));
        self
    }

    /// Make every call for this key fail at the transport level.
    pub fn failing_for(self, identity_key: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(identity_key.into());
        self
    }

    /// How many times the scorer was called for this key.
    pub fn call_count(&self, identity_key: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .get(identity_key)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score(&self, request: &ReviewRequest) -> Result<ScorerResponse, ReviewError> {
        *self
            .calls
            .write()
            .unwrap()
            .entry(request.identity_key.clone())
            .or_insert(0) += 1;

        if self.failing.read().unwrap().contains(&request.identity_key) {
            return Err(ReviewError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "mock transport failure",
            )));
        }

        match self.responses.read().unwrap().get(&request.identity_key) {
            Some((tier, rationale)) => Ok(ScorerResponse {
                tier: tier.clone(),
                rationale: rationale.clone(),
            }),
            None => Err(ReviewError::Malformed(format!(
                "no scripted response for {}",
                request.identity_key
            ))),
        }
    }
}

/// Recording notifier with optional scripted failures.
#[derive(Clone, Default)]
pub struct MockNotifier {
    failing: Arc<RwLock<HashSet<String>>>,
    matches: Arc<RwLock<Vec<String>>>,
    closest_misses: Arc<RwLock<Vec<String>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make delivery fail for this identity key.
    pub fn failing_for(self, identity_key: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(identity_key.into());
        self
    }

    /// Identity keys delivered as matches, in delivery order.
    pub fn delivered_matches(&self) -> Vec<String> {
        self.matches.read().unwrap().clone()
    }

    /// Identity keys delivered as closest misses.
    pub fn delivered_closest_misses(&self) -> Vec<String> {
        self.closest_misses.read().unwrap().clone()
    }

    fn deliver(&self, log: &RwLock<Vec<String>>, key: &str) -> Result<(), NotifyError> {
        if self.failing.read().unwrap().contains(key) {
            return Err(NotifyError::new(key, "mock delivery failure"));
        }
        log.write().unwrap().push(key.to_string());
        Ok(())
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_match(&self, listing: &EvaluatedListing) -> Result<(), NotifyError> {
        self.deliver(&self.matches, &listing.listing.identity_key)
    }

    async fn notify_closest_miss(&self, listing: &EvaluatedListing) -> Result<(), NotifyError> {
        self.deliver(&self.closest_misses, &listing.listing.identity_key)
    }
}
