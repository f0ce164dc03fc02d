//! Listing types - the normalized view of one property at one point in time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReviewError;

/// Tri-state basement attribute resolved from conflicting upstream fields.
///
/// `Unknown` is a distinct, neutral value: absence of any signal must
/// never be conflated with `Unfinished`. The deep reviewer consumes
/// `Unknown` as non-penalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasementSignal {
    Finished,
    Unfinished,
    Unknown,
}

impl BasementSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Unfinished => "unfinished",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BasementSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered classification of a listing's desirability.
///
/// The variant order is load-bearing: `Ord` follows declaration order,
/// so `Reject < PartialMatch < CloseMatch < CompleteMatch` and the
/// notify threshold is a simple `>=` comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTier {
    Reject,
    PartialMatch,
    CloseMatch,
    CompleteMatch,
}

impl OutcomeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::PartialMatch => "partial_match",
            Self::CloseMatch => "close_match",
            Self::CompleteMatch => "complete_match",
        }
    }
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeTier {
    type Err = ReviewError;

    /// Parse a tier value from the external scorer.
    ///
    /// Anything outside the four known values is a protocol error; the
    /// caller fails closed by treating that listing as `Reject`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "partial_match" => Ok(Self::PartialMatch),
            "close_match" => Ok(Self::CloseMatch),
            "complete_match" => Ok(Self::CompleteMatch),
            other => Err(ReviewError::Protocol {
                value: other.to_string(),
            }),
        }
    }
}

/// A block of structured provider text (a details or features group).
///
/// The provider nests short text snippets under a category label; the
/// basement derivation scans these before falling back to free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub text: Vec<String>,
}

impl TextBlock {
    pub fn new(category: impl Into<String>, text: Vec<String>) -> Self {
        Self {
            category: category.into(),
            text,
        }
    }
}

/// One raw provider payload, provider-shaped but provider-agnostic.
///
/// Everything except the identifier is best-effort. The daemon maps the
/// listings-provider response into this shape; the normalizer turns it
/// into a [`Listing`] or rejects it as malformed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    pub property_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub price: Option<u64>,
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub sqft: Option<u64>,
    pub year_built: Option<u32>,
    pub property_type: Option<String>,
    pub days_on_market: Option<u32>,
    pub has_pool: Option<bool>,
    pub listing_url: Option<String>,
    pub description: Option<String>,
    /// Structured "details" groups - most reliable basement source
    #[serde(default)]
    pub details: Vec<TextBlock>,
    /// Structured "features" groups - second basement source
    #[serde(default)]
    pub features: Vec<TextBlock>,
}

/// One property at one point in time, normalized.
///
/// Constructed fresh each run from provider data and never mutated after
/// construction. Only the fields mirrored into the persistent record
/// survive the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Stable cross-run identifier, unique per physical property
    pub identity_key: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub price: u64,
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub sqft: Option<u64>,
    /// Derived from year_built at normalization time; unknown never rejects
    pub age_years: Option<u32>,
    pub has_pool: Option<bool>,
    pub days_on_market: Option<u32>,
    pub listing_url: Option<String>,
    pub basement_signal: BasementSignal,
    /// Free-text fields retained for derivation only, not persisted
    pub raw_text_fields: Vec<String>,
}

impl Listing {
    /// Deterministic multi-line rendering for the scorer payload.
    ///
    /// Field order is fixed: the same listing must always produce the
    /// same payload shape.
    pub fn render_for_review(&self) -> String {
        let mut lines = vec![
            format!("Address: {}", self.address),
            format!("City: {}, {}", self.city, self.state),
            format!("Price: ${}", self.price),
        ];
        if let Some(beds) = self.beds {
            lines.push(format!("Bedrooms: {beds}"));
        }
        if let Some(baths) = self.baths {
            lines.push(format!("Bathrooms: {baths}"));
        }
        if let Some(sqft) = self.sqft {
            lines.push(format!("Square Feet: {sqft}"));
        }
        if let Some(age) = self.age_years {
            lines.push(format!("Age: {age} years"));
        }
        if let Some(days) = self.days_on_market {
            lines.push(format!("Days on Market: {days}"));
        }
        if let Some(pool) = self.has_pool {
            lines.push(format!("Pool: {}", if pool { "Yes" } else { "No" }));
        }
        lines.push(format!("Basement: {}", self.basement_signal));
        for text in &self.raw_text_fields {
            if !text.is_empty() {
                lines.push(format!("\n{text}"));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(OutcomeTier::Reject < OutcomeTier::PartialMatch);
        assert!(OutcomeTier::PartialMatch < OutcomeTier::CloseMatch);
        assert!(OutcomeTier::CloseMatch < OutcomeTier::CompleteMatch);
    }

    #[test]
    fn test_tier_parse_known_values() {
        assert_eq!(
            "complete_match".parse::<OutcomeTier>().unwrap(),
            OutcomeTier::CompleteMatch
        );
        assert_eq!(
            " Close_Match ".parse::<OutcomeTier>().unwrap(),
            OutcomeTier::CloseMatch
        );
    }

    #[test]
    fn test_tier_parse_unknown_is_protocol_error() {
        let err = "superb_match".parse::<OutcomeTier>().unwrap_err();
        assert!(matches!(err, ReviewError::Protocol { .. }));
    }

    #[test]
    fn test_render_for_review_is_deterministic() {
        let listing = Listing {
            identity_key: "p1".into(),
            address: "12 Elm St".into(),
            city: "Westlake".into(),
            state: "OH".into(),
            price: 300_000,
            beds: Some(3),
            baths: Some(2.0),
            sqft: Some(1_600),
            age_years: Some(25),
            has_pool: Some(false),
            days_on_market: Some(4),
            listing_url: None,
            basement_signal: BasementSignal::Finished,
            raw_text_fields: vec!["Cozy colonial.".into()],
        };
        assert_eq!(listing.render_for_review(), listing.render_for_review());
        assert!(listing.render_for_review().contains("Basement: finished"));
    }
}
