//! Notification seam.
//!
//! The pipeline decides *what* to announce; delivery is behind this
//! trait so the core stays free of any messaging provider. A failed
//! delivery returns an error and the caller must NOT mark the listing
//! notified, keeping it eligible for the next run.

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::types::EvaluatedListing;

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a qualifying listing.
    async fn notify_match(&self, listing: &EvaluatedListing) -> Result<(), NotifyError>;

    /// Announce the closest miss of a run that produced no matches.
    async fn notify_closest_miss(&self, listing: &EvaluatedListing) -> Result<(), NotifyError>;
}
