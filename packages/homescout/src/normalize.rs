//! Listing record normalizer.
//!
//! Turns one heterogeneous raw provider payload into exactly one
//! canonical [`Listing`] with a stable identity key, or fails with
//! [`MalformedListingError`] when the provider identifier is absent.
//! All other fields are best-effort: missing values become `None`
//! rather than failing the listing.

use chrono::{DateTime, Datelike, Utc};

use crate::basement;
use crate::error::MalformedListingError;
use crate::types::{Listing, RawListing};

/// Normalize one raw payload.
///
/// `now` is passed in rather than read from the clock so the derivation
/// of `age_years` stays deterministic and testable.
pub fn normalize(raw: &RawListing, now: DateTime<Utc>) -> Result<Listing, MalformedListingError> {
    let identity_key = raw
        .property_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(MalformedListingError::MissingIdentity)?
        .to_string();

    // Identity is the only hard requirement. A missing city just means
    // the avoid-list never matches and city averages stay unavailable.
    let city = raw
        .city
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let age_years = raw.year_built.and_then(|year| {
        let current = now.year();
        (year as i32 <= current).then(|| (current - year as i32) as u32)
    });

    let mut raw_text_fields = Vec::new();
    if let Some(description) = raw.description.as_deref() {
        if !description.trim().is_empty() {
            raw_text_fields.push(description.trim().to_string());
        }
    }
    for block in raw.features.iter().chain(raw.details.iter()) {
        raw_text_fields.extend(block.text.iter().filter(|t| !t.is_empty()).cloned());
    }

    let basement_signal = basement::derive(&raw.details, &raw.features, &raw_text_fields);

    Ok(Listing {
        identity_key,
        address: raw.address.clone().unwrap_or_else(|| "Unknown".to_string()),
        city,
        state: raw.state.clone().unwrap_or_default(),
        price: raw.price.unwrap_or(0),
        beds: raw.beds,
        baths: raw.baths,
        sqft: raw.sqft,
        age_years,
        has_pool: raw.has_pool,
        days_on_market: raw.days_on_market,
        listing_url: raw.listing_url.clone(),
        basement_signal,
        raw_text_fields,
    })
}
