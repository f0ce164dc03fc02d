//! Wire types for the Realtor data API.
//!
//! Everything is optional: the API omits fields freely and the payload
//! shape varies per listing, so decoding must never fail on a missing
//! key. Interpretation happens downstream.

use serde::Deserialize;

/// Envelope for the sale-search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub home_search: Option<HomeSearch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeSearch {
    #[serde(default)]
    pub results: Vec<SaleListing>,
}

/// One result row from a sale search.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleListing {
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub listing_id: Option<String>,
    #[serde(default)]
    pub list_price: Option<u64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub description: Option<HomeDescription>,
}

impl SaleListing {
    /// Stable identifier, preferring `property_id` over `listing_id`.
    pub fn identity(&self) -> Option<&str> {
        self.property_id
            .as_deref()
            .or(self.listing_id.as_deref())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// Free-form description block shared by search and detail payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct HomeDescription {
    #[serde(default)]
    pub beds: Option<u32>,
    #[serde(default)]
    pub baths: Option<f64>,
    #[serde(default)]
    pub sqft: Option<u32>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(rename = "type", default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Envelope for the property-detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub data: Option<DetailData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailData {
    #[serde(default)]
    pub home: Option<PropertyDetail>,
}

/// Full property record from the detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDetail {
    #[serde(default)]
    pub property_id: Option<String>,
    #[serde(default)]
    pub list_price: Option<u64>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub description: Option<HomeDescription>,
    /// Categorized fact lists, e.g. category "Basement" with
    /// text ["Basement: Finished"]
    #[serde(default)]
    pub details: Vec<FactBlock>,
    #[serde(default)]
    pub features: Vec<FactBlock>,
    #[serde(default)]
    pub days_on_market: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FactBlock {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub text: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_tolerates_sparse_payload() {
        let json = r#"{
            "success": true,
            "data": { "home_search": { "results": [
                { "property_id": "M123", "list_price": 289000,
                  "location": { "address": { "line": "12 Elm St", "city": "Westlake", "state_code": "OH" } } },
                { "listing_id": "L9" }
            ] } }
        }"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let results = resp.data.unwrap().home_search.unwrap().results;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].identity(), Some("M123"));
        assert_eq!(results[1].identity(), Some("L9"));
    }

    #[test]
    fn test_detail_response_parses_fact_blocks() {
        let json = r#"{
            "data": { "home": {
                "property_id": "M123",
                "description": { "type": "single_family", "text": "Finished basement rec room" },
                "details": [ { "category": "Basement", "text": ["Basement: Finished"] } ]
            } }
        }"#;
        let resp: DetailResponse = serde_json::from_str(json).unwrap();
        let home = resp.data.unwrap().home.unwrap();
        assert_eq!(home.details[0].category.as_deref(), Some("Basement"));
        assert_eq!(home.details[0].text, vec!["Basement: Finished"]);
    }

    #[test]
    fn test_empty_identity_is_none() {
        let listing = SaleListing {
            property_id: Some(String::new()),
            listing_id: None,
            list_price: None,
            location: None,
            description: None,
        };
        assert_eq!(listing.identity(), None);
    }
}
