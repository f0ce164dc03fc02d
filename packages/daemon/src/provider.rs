//! Realtor API fetching and payload mapping.
//!
//! Spends the call budget in two phases, like the API pricing wants:
//! one cheap search per city, then one detail call per surviving
//! listing. Budget exhaustion mid-run is not an error; we evaluate
//! whatever was fetched.

use tracing::{debug, info, warn};

use homescout::{RawListing, TextBlock};
use realtor_client::{PropertyDetail, RealtorClient, RealtorError, SaleListing};

use crate::config::Config;

const SINGLE_FAMILY_MARKERS: &[&str] = &["single", "family", "house", "residential"];

/// Fetch raw listings for every configured city.
pub async fn fetch_listings(client: &RealtorClient, config: &Config) -> Vec<RawListing> {
    let mut rows: Vec<SaleListing> = Vec::new();
    for city in &config.cities {
        match client
            .search_sale(city, &config.state, config.min_price, config.max_price)
            .await
        {
            Ok(found) => rows.extend(found),
            Err(RealtorError::BudgetExhausted { max }) => {
                warn!(budget = max, "call budget spent during search phase");
                break;
            }
            Err(err) => {
                warn!(%city, error = %err, "sale search failed, skipping city");
            }
        }
    }

    let mut listings = Vec::new();
    for row in rows {
        let Some(id) = row.identity().map(str::to_string) else {
            debug!("skipping search row without identity");
            continue;
        };

        match client.property_details(&id).await {
            Ok(Some(detail)) => {
                if !is_single_family(&detail) {
                    debug!(identity = %id, "skipping non-single-family property");
                    continue;
                }
                listings.push(raw_from_detail(&id, &row, detail));
            }
            Ok(None) => {
                debug!(identity = %id, "detail endpoint returned nothing, using search row");
                listings.push(raw_from_search(&id, &row));
            }
            Err(RealtorError::BudgetExhausted { max }) => {
                warn!(budget = max, "call budget spent during detail phase");
                listings.push(raw_from_search(&id, &row));
                break;
            }
            Err(err) => {
                warn!(identity = %id, error = %err, "detail fetch failed, using search row");
                listings.push(raw_from_search(&id, &row));
            }
        }
    }

    info!(
        count = listings.len(),
        calls = client.calls_made(),
        "fetched raw listings"
    );
    listings
}

fn is_single_family(detail: &PropertyDetail) -> bool {
    match detail
        .description
        .as_ref()
        .and_then(|d| d.property_type.as_deref())
    {
        // Unknown type passes; the deep review can still reject it.
        None => true,
        Some(kind) => {
            let kind = kind.to_lowercase();
            SINGLE_FAMILY_MARKERS.iter().any(|m| kind.contains(m))
        }
    }
}

fn raw_from_search(id: &str, row: &SaleListing) -> RawListing {
    let address = row.location.as_ref().and_then(|l| l.address.as_ref());
    let desc = row.description.as_ref();
    RawListing {
        property_id: Some(id.to_string()),
        address: address.and_then(|a| a.line.clone()),
        city: address.and_then(|a| a.city.clone()),
        state: address.and_then(|a| a.state_code.clone()),
        zip_code: address.and_then(|a| a.postal_code.clone()),
        price: row.list_price,
        beds: desc.and_then(|d| d.beds),
        baths: desc.and_then(|d| d.baths),
        sqft: desc.and_then(|d| d.sqft).map(u64::from),
        year_built: desc
            .and_then(|d| d.year_built)
            .and_then(|y| u32::try_from(y).ok()),
        property_type: desc.and_then(|d| d.property_type.clone()),
        days_on_market: None,
        has_pool: None,
        listing_url: None,
        description: desc.and_then(|d| d.text.clone()),
        details: vec![],
        features: vec![],
    }
}

fn raw_from_detail(id: &str, row: &SaleListing, detail: PropertyDetail) -> RawListing {
    let mut raw = raw_from_search(id, row);

    if let Some(address) = detail.location.as_ref().and_then(|l| l.address.as_ref()) {
        raw.address = address.line.clone().or(raw.address);
        raw.city = address.city.clone().or(raw.city);
        raw.state = address.state_code.clone().or(raw.state);
        raw.zip_code = address.postal_code.clone().or(raw.zip_code);
    }
    if let Some(desc) = &detail.description {
        raw.beds = desc.beds.or(raw.beds);
        raw.baths = desc.baths.or(raw.baths);
        raw.sqft = desc.sqft.map(u64::from).or(raw.sqft);
        raw.year_built = desc
            .year_built
            .and_then(|y| u32::try_from(y).ok())
            .or(raw.year_built);
        raw.property_type = desc.property_type.clone().or(raw.property_type.take());
        raw.description = desc.text.clone().or(raw.description.take());
    }
    raw.price = detail.list_price.or(raw.price);
    raw.listing_url = detail.href.clone();
    raw.days_on_market = detail.days_on_market;
    raw.has_pool = detect_pool(&detail);
    raw.details = fact_blocks(&detail.details);
    raw.features = fact_blocks(&detail.features);
    raw
}

fn fact_blocks(blocks: &[realtor_client::FactBlock]) -> Vec<TextBlock> {
    blocks
        .iter()
        .map(|b| TextBlock {
            category: b.category.clone().unwrap_or_default(),
            text: b.text.clone(),
        })
        .collect()
}

/// Pool detection from the fact lists.
///
/// A private pool mention answers true; community amenities do not
/// count against the listing. No mention stays unknown so the quick
/// filter never rejects on absence of data.
fn detect_pool(detail: &PropertyDetail) -> Option<bool> {
    for block in detail.details.iter().chain(detail.features.iter()) {
        for line in &block.text {
            let line = line.to_lowercase();
            if !line.contains("pool") {
                continue;
            }
            if line.contains("no pool") || line.contains("community") {
                continue;
            }
            return Some(true);
        }
    }
    None
}
