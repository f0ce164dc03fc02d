//! Domain types for the hunt pipeline.

pub mod criteria;
pub mod listing;
pub mod record;
pub mod run;

pub use criteria::Criteria;
pub use listing::{BasementSignal, Listing, OutcomeTier, RawListing, TextBlock};
pub use record::{ListingRecord, PriceDrop, PricePoint, StoreStats, UpsertOutcome};
pub use run::{EvaluatedListing, ListingState, RunResult};
