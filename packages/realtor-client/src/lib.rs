//! Pure RapidAPI Realtor data client.
//!
//! A minimal client for the Realtor data endpoints on RapidAPI: sale
//! search per city and per-property details. Every call counts against
//! a per-run budget so a single run can never blow the monthly quota,
//! and calls are spaced to stay polite.
//!
//! # Example
//!
//! ```rust,ignore
//! use realtor_client::RealtorClient;
//!
//! let client = RealtorClient::new("rapidapi-key".into()).with_call_budget(40);
//!
//! let listings = client.search_sale("Westlake", "OH", 200_000, 350_000).await?;
//! for listing in &listings {
//!     if let Some(id) = listing.identity() {
//!         let detail = client.property_details(id).await?;
//!     }
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{RealtorError, Result};
pub use types::{
    Address, DetailResponse, FactBlock, HomeDescription, Location, PropertyDetail, SaleListing,
    SearchResponse,
};

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const DEFAULT_HOST: &str = "realtor-api-data.p.rapidapi.com";
const DEFAULT_CALL_BUDGET: u32 = 40;
const CALL_SPACING: Duration = Duration::from_millis(500);
const PAGE_SIZE: u32 = 50;

pub struct RealtorClient {
    client: reqwest::Client,
    api_key: String,
    host: String,
    call_budget: u32,
    calls_made: AtomicU32,
}

impl RealtorClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            host: DEFAULT_HOST.to_string(),
            call_budget: DEFAULT_CALL_BUDGET,
            calls_made: AtomicU32::new(0),
        }
    }

    /// Override the per-run call budget (default: 40).
    pub fn with_call_budget(mut self, budget: u32) -> Self {
        self.call_budget = budget;
        self
    }

    /// Override the RapidAPI host (for tests against a local stub).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Calls spent so far this run.
    pub fn calls_made(&self) -> u32 {
        self.calls_made.load(Ordering::Relaxed)
    }

    /// Calls left in the budget.
    pub fn calls_remaining(&self) -> u32 {
        self.call_budget.saturating_sub(self.calls_made())
    }

    /// Search for-sale listings in one city within a price band.
    pub async fn search_sale(
        &self,
        city: &str,
        state: &str,
        price_min: u64,
        price_max: u64,
    ) -> Result<Vec<SaleListing>> {
        let url = format!("https://{}/properties/sale", self.host);
        let query = format!("{city}, {state}");
        tracing::info!(%query, price_min, price_max, "Searching sale listings");

        let resp: SearchResponse = self
            .call(self.client.get(&url).query(&[
                ("query", query.as_str()),
                ("limit", &PAGE_SIZE.to_string()),
                ("offset", "0"),
                ("price_min", &price_min.to_string()),
                ("price_max", &price_max.to_string()),
            ]))
            .await?;

        if resp.success == Some(false) {
            return Ok(vec![]);
        }

        let results = resp
            .data
            .and_then(|d| d.home_search)
            .map(|hs| hs.results)
            .unwrap_or_default();
        tracing::info!(count = results.len(), %query, "Sale search returned");
        Ok(results)
    }

    /// Fetch the full detail record for one property.
    pub async fn property_details(&self, property_id: &str) -> Result<Option<PropertyDetail>> {
        let url = format!("https://{}/detail/properties", self.host);

        let resp: DetailResponse = self
            .call(self.client.get(&url).query(&[("id", property_id)]))
            .await?;

        Ok(resp.data.and_then(|d| d.home))
    }

    /// Execute one budgeted request.
    ///
    /// The budget is reserved before the request goes out, so a
    /// transport failure still burns a call (RapidAPI bills it either
    /// way).
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let spent = self.calls_made.fetch_add(1, Ordering::SeqCst);
        if spent >= self.call_budget {
            self.calls_made.fetch_sub(1, Ordering::SeqCst);
            return Err(RealtorError::BudgetExhausted {
                max: self.call_budget,
            });
        }
        if spent > 0 {
            tokio::time::sleep(CALL_SPACING).await;
        }

        let resp = request
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        tracing::debug!(
            calls = spent + 1,
            budget = self.call_budget,
            status = %resp.status(),
            "Realtor API call"
        );

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RealtorError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_exhaustion_short_circuits() {
        let client = RealtorClient::new("test-key".into()).with_call_budget(0);
        let err = client
            .search_sale("Westlake", "OH", 200_000, 350_000)
            .await
            .unwrap_err();
        assert!(matches!(err, RealtorError::BudgetExhausted { max: 0 }));
        assert_eq!(client.calls_made(), 0);
    }

    #[test]
    fn test_calls_remaining_saturates() {
        let client = RealtorClient::new("test-key".into()).with_call_budget(3);
        assert_eq!(client.calls_remaining(), 3);
    }
}
