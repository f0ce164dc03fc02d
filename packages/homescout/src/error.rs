//! Typed errors for the hunt pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! distinguish per-listing failures (dropped or downgraded, run continues)
//! from run-level failures (store unavailable, run aborts).

use thiserror::Error;

/// A raw listing that cannot enter the pipeline.
///
/// Identity is non-negotiable: a listing with no stable provider
/// identifier cannot be deduplicated. The listing is dropped and logged;
/// the run continues.
#[derive(Debug, Error)]
pub enum MalformedListingError {
    /// Provider payload carries no property identifier
    #[error("listing has no provider identifier")]
    MissingIdentity,
}

/// Errors from the deep-review stage.
///
/// All of these are isolated to a single listing: after bounded retries
/// the listing is treated as `OutcomeTier::Reject` and the run continues.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The scorer returned a tier value outside the known set
    #[error("unrecognized outcome tier: {value:?}")]
    Protocol { value: String },

    /// Transport-level failure talking to the scoring capability
    #[error("scorer transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The scorer response was not parseable
    #[error("scorer response parse error: {0}")]
    Malformed(String),

    /// All retry attempts failed
    #[error("scorer failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl ReviewError {
    /// Wrap an arbitrary transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Errors from the persistent store.
///
/// The store is the single source of cross-run memory, so any failure
/// here is fatal for the run: without dedup memory no safe notification
/// decision can be made.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store cannot be read or written
    #[error("store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Stored data could not be decoded
    #[error("corrupt record for {identity_key}: {reason}")]
    Corrupt { identity_key: String, reason: String },
}

impl StoreError {
    /// Wrap an arbitrary backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Box::new(err))
    }
}

/// Notification channel failure for one listing.
///
/// Does not roll back store state; since `mark_notified` was never
/// called the listing stays eligible for re-notification next run.
#[derive(Debug, Error)]
#[error("notification delivery failed for {identity_key}: {reason}")]
pub struct NotifyError {
    pub identity_key: String,
    pub reason: String,
}

impl NotifyError {
    pub fn new(identity_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error for a hunt run.
#[derive(Debug, Error)]
pub enum HuntError {
    /// Store failure — aborts the run before any notification is sent
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration problem detected at run time
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, HuntError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
