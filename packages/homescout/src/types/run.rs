//! Run-level types - ephemeral, one per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::filter::RejectReason;

use super::listing::{Listing, OutcomeTier};

/// Terminal state of one listing within a run.
///
/// `new → evaluated → {notified, suppressed, rejected}`; an evaluated
/// listing is notified only when its tier clears the threshold AND the
/// store's dedup policy agrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingState {
    Rejected,
    Notified,
    Suppressed,
}

/// A listing together with its deep-review outcome and terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedListing {
    pub listing: Listing,
    pub tier: OutcomeTier,
    pub rationale: String,
    pub state: ListingState,
}

/// The outcome of one run.
///
/// Invariants: `qualifying` is empty whenever no listing reached the
/// notify threshold; `closest_miss` is populated only when `qualifying`
/// is empty and at least one listing survived the quick filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Raw payloads received from the provider
    pub listings_seen: usize,
    /// Payloads dropped for missing identity
    pub dropped_malformed: usize,

    /// Quick-filter rejections with their first matching reason
    pub quick_rejected: Vec<(String, RejectReason)>,

    /// Every listing that reached the deep reviewer, in input order
    pub evaluated: Vec<EvaluatedListing>,

    /// Listings that ended in `Notified` (tier >= threshold, dedup agreed)
    pub qualifying: Vec<EvaluatedListing>,

    /// Best non-qualifying listing, surfaced only when nothing qualified
    pub closest_miss: Option<EvaluatedListing>,

    /// Isolated per-listing review failures (run continued)
    pub review_errors: Vec<String>,
}

impl RunResult {
    /// Whether the run produced anything worth telling the user about.
    pub fn has_news(&self) -> bool {
        !self.qualifying.is_empty() || self.closest_miss.is_some()
    }
}
