//! Listing Evaluation Pipeline
//!
//! Turns raw real-estate listing payloads into at most a handful of
//! high-signal notifications per run, remembering everything it has
//! seen across runs.
//!
//! # Design Philosophy
//!
//! **"Cheap checks first, memory always"**
//!
//! - Deterministic quick filter before any paid deep review
//! - The store is the only cross-run state; everything else is ephemeral
//! - Fail closed: an unreadable scorer verdict is a reject, never a match
//! - Per-listing failures are isolated; only a store failure aborts a run
//!
//! # Usage
//!
//! ```rust,ignore
//! use homescout::{Criteria, HuntPipeline, MemoryStore};
//! use homescout::testing::{MockNotifier, MockScorer};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let scorer = MockScorer::new().with_tier("p1", "complete_match", "finished basement");
//! let pipeline = HuntPipeline::new(store, scorer, Criteria::default());
//!
//! let result = pipeline.run(&payloads, &MockNotifier::new(), chrono::Utc::now()).await?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Listings, outcome tiers, criteria, run results
//! - [`normalize`] - Raw payload validation and canonicalization
//! - [`basement`] - Basement signal derivation from listing text
//! - [`filter`] - Deterministic quick filter
//! - [`review`] - Deep reviewer and the [`Scorer`] seam
//! - [`store`] - Cross-run memory ([`MemoryStore`], sqlite behind a feature)
//! - [`notify`] - Delivery seam
//! - [`run`] - Run orchestration
//! - [`testing`] - Scripted scorer and notifier for tests

pub mod basement;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod notify;
pub mod review;
pub mod run;
pub mod store;
pub mod testing;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{HuntError, MalformedListingError, NotifyError, ReviewError, StoreError};
pub use filter::{FilterDecision, RejectReason};
pub use notify::Notifier;
pub use review::{DeepReviewer, ReviewOutcome, ReviewRequest, Scorer, ScorerResponse};
pub use run::HuntPipeline;
pub use store::{ListingStore, MemoryStore};
pub use types::{
    BasementSignal, Criteria, EvaluatedListing, Listing, ListingRecord, ListingState, OutcomeTier,
    PriceDrop, PricePoint, RawListing, RunResult, StoreStats, TextBlock, UpsertOutcome,
};

#[cfg(feature = "openai")]
pub use ai::OpenAiScorer;

#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
