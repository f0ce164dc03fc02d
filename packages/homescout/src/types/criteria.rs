//! Search criteria consumed by the pipeline.
//!
//! Values only - loading from the environment lives in the daemon.

use serde::{Deserialize, Serialize};

use super::listing::OutcomeTier;

/// Configuration surface of the evaluation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criteria {
    /// Inclusive price range
    pub min_price: u64,
    pub max_price: u64,

    /// Cities rejected outright (case-insensitive exact match)
    pub avoid_cities: Vec<String>,

    /// Maximum property age in years; unknown age never rejects
    pub max_age_years: Option<u32>,

    /// Whether a pool disqualifies a listing; unknown never rejects
    pub pool_disqualifies: bool,

    /// Minimum tier that triggers a notification
    pub notify_threshold: OutcomeTier,

    /// Retries per listing on scorer transport failure
    pub review_retries: u32,

    /// Bounded fan-out for scorer calls (1 = strictly sequential)
    pub review_concurrency: usize,

    /// Cap on listings sent to the deep reviewer per run
    pub max_deep_reviews: usize,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            min_price: 200_000,
            max_price: 350_000,
            avoid_cities: vec![],
            max_age_years: Some(100),
            pool_disqualifies: true,
            notify_threshold: OutcomeTier::CloseMatch,
            review_retries: 2,
            review_concurrency: 1,
            max_deep_reviews: 15,
        }
    }
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive price range.
    pub fn with_price_range(mut self, min: u64, max: u64) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Set the avoid-cities list.
    pub fn with_avoid_cities(
        mut self,
        cities: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.avoid_cities = cities.into_iter().map(|c| c.into()).collect();
        self
    }

    /// Set the maximum age in years.
    pub fn with_max_age_years(mut self, years: u32) -> Self {
        self.max_age_years = Some(years);
        self
    }

    /// Allow pools.
    pub fn allowing_pools(mut self) -> Self {
        self.pool_disqualifies = false;
        self
    }

    /// Set the notify threshold tier.
    pub fn with_notify_threshold(mut self, tier: OutcomeTier) -> Self {
        self.notify_threshold = tier;
        self
    }

    /// Set the per-listing retry count.
    pub fn with_review_retries(mut self, retries: u32) -> Self {
        self.review_retries = retries;
        self
    }

    /// Set the scorer fan-out.
    pub fn with_review_concurrency(mut self, concurrency: usize) -> Self {
        self.review_concurrency = concurrency.max(1);
        self
    }

    /// Cap deep reviews per run.
    pub fn with_max_deep_reviews(mut self, max: usize) -> Self {
        self.max_deep_reviews = max;
        self
    }

    /// Case-insensitive avoid-city check.
    pub fn avoids_city(&self, city: &str) -> bool {
        self.avoid_cities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(city.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avoids_city_case_insensitive() {
        let criteria = Criteria::new().with_avoid_cities(["Parma", "Cleveland"]);
        assert!(criteria.avoids_city("parma"));
        assert!(criteria.avoids_city(" CLEVELAND "));
        assert!(!criteria.avoids_city("Westlake"));
    }

    #[test]
    fn test_concurrency_floor_is_one() {
        let criteria = Criteria::new().with_review_concurrency(0);
        assert_eq!(criteria.review_concurrency, 1);
    }
}
