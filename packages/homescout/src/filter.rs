//! Quick filter - deterministic rule evaluation before any paid review.
//!
//! A pure function from listing + criteria to pass/reject. This stage
//! exists to bound the cost of the slower, rate-limited deep review:
//! anything it rejects never reaches the scorer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Criteria, Listing};

/// Why the quick filter rejected a listing.
///
/// Conditions are checked in declaration order and the first match is
/// reported; the order matters only for diagnostics since every
/// condition is independently sufficient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    PriceOutOfRange { price: u64, min: u64, max: u64 },
    AvoidedCity { city: String },
    TooOld { age_years: u32, max: u32 },
    HasPool,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriceOutOfRange { price, min, max } => {
                write!(f, "price ${price} outside ${min}-${max}")
            }
            Self::AvoidedCity { city } => write!(f, "located in {city} (excluded area)"),
            Self::TooOld { age_years, max } => {
                write!(f, "{age_years} years old (max {max})")
            }
            Self::HasPool => write!(f, "has a pool (dealbreaker)"),
        }
    }
}

/// Quick-filter verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Pass,
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Evaluate one listing. Pure and deterministic: no external calls, no
/// state, the same input always yields the same decision.
///
/// Unknown optional fields (age, pool) never reject.
pub fn evaluate(listing: &Listing, criteria: &Criteria) -> FilterDecision {
    if listing.price < criteria.min_price || listing.price > criteria.max_price {
        return FilterDecision::Reject(RejectReason::PriceOutOfRange {
            price: listing.price,
            min: criteria.min_price,
            max: criteria.max_price,
        });
    }

    if criteria.avoids_city(&listing.city) {
        return FilterDecision::Reject(RejectReason::AvoidedCity {
            city: listing.city.clone(),
        });
    }

    if let (Some(age), Some(max)) = (listing.age_years, criteria.max_age_years) {
        if age > max {
            return FilterDecision::Reject(RejectReason::TooOld {
                age_years: age,
                max,
            });
        }
    }

    if criteria.pool_disqualifies && listing.has_pool == Some(true) {
        return FilterDecision::Reject(RejectReason::HasPool);
    }

    FilterDecision::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BasementSignal;

    fn listing() -> Listing {
        Listing {
            identity_key: "p1".into(),
            address: "12 Elm St".into(),
            city: "Westlake".into(),
            state: "OH".into(),
            price: 300_000,
            beds: Some(3),
            baths: Some(2.0),
            sqft: Some(1_600),
            age_years: Some(30),
            has_pool: Some(false),
            days_on_market: Some(3),
            listing_url: None,
            basement_signal: BasementSignal::Unknown,
            raw_text_fields: vec![],
        }
    }

    fn criteria() -> Criteria {
        Criteria::new()
            .with_price_range(200_000, 350_000)
            .with_avoid_cities(["Avoid City"])
            .with_max_age_years(100)
    }

    #[test]
    fn test_in_range_listing_passes() {
        assert_eq!(evaluate(&listing(), &criteria()), FilterDecision::Pass);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let mut l = listing();
        l.price = 200_000;
        assert!(evaluate(&l, &criteria()).is_pass());
        l.price = 350_000;
        assert!(evaluate(&l, &criteria()).is_pass());
        l.price = 350_001;
        assert!(matches!(
            evaluate(&l, &criteria()),
            FilterDecision::Reject(RejectReason::PriceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_avoid_city_rejects_case_insensitively() {
        let mut l = listing();
        l.city = "avoid city".into();
        assert!(matches!(
            evaluate(&l, &criteria()),
            FilterDecision::Reject(RejectReason::AvoidedCity { .. })
        ));
    }

    #[test]
    fn test_unknown_age_and_pool_never_reject() {
        let mut l = listing();
        l.age_years = None;
        l.has_pool = None;
        assert!(evaluate(&l, &criteria()).is_pass());
    }

    #[test]
    fn test_old_listing_rejects_only_when_both_known() {
        let mut l = listing();
        l.age_years = Some(120);
        assert!(matches!(
            evaluate(&l, &criteria()),
            FilterDecision::Reject(RejectReason::TooOld { .. })
        ));

        let mut no_limit = criteria();
        no_limit.max_age_years = None;
        assert!(evaluate(&l, &no_limit).is_pass());
    }

    #[test]
    fn test_pool_rejects_unless_allowed() {
        let mut l = listing();
        l.has_pool = Some(true);
        assert_eq!(
            evaluate(&l, &criteria()),
            FilterDecision::Reject(RejectReason::HasPool)
        );
        assert!(evaluate(&l, &criteria().allowing_pools()).is_pass());
    }

    #[test]
    fn test_decision_is_independent_of_call_order() {
        let l = listing();
        let c = criteria();
        let first = evaluate(&l, &c);
        for _ in 0..10 {
            assert_eq!(evaluate(&l, &c), first);
        }
    }

    #[test]
    fn test_first_matching_reason_wins() {
        // Price and pool both offend; price is reported first.
        let mut l = listing();
        l.price = 500_000;
        l.has_pool = Some(true);
        assert!(matches!(
            evaluate(&l, &criteria()),
            FilterDecision::Reject(RejectReason::PriceOutOfRange { .. })
        ));
    }
}
