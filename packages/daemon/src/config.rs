use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use homescout::{Criteria, OutcomeTier};

/// Daemon configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub rapidapi_key: String,
    pub openai_api_key: String,
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    pub database_url: String,

    /// Cities searched each run, in priority order
    pub cities: Vec<String>,
    pub state: String,

    pub min_price: u64,
    pub max_price: u64,
    pub avoid_cities: Vec<String>,
    pub max_age_years: Option<u32>,
    pub allow_pools: bool,

    /// Realtor API calls per run
    pub call_budget: u32,
    pub max_deep_reviews: usize,

    /// Minimum tier that triggers a notification
    pub notify_threshold: OutcomeTier,
    pub review_retries: u32,
    pub review_concurrency: usize,

    /// 6-field cron expression for the scheduler
    pub schedule: String,

    /// Never-notified records older than this are pruned each run
    pub prune_after_days: i64,
    /// Minimum percentage for the price-drop digest
    pub price_drop_percent: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            rapidapi_key: env::var("RAPIDAPI_KEY").context("RAPIDAPI_KEY must be set")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .context("TELEGRAM_CHAT_ID must be set")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://homescout.db?mode=rwc".to_string()),
            cities: csv_list(
                &env::var("HOMESCOUT_CITIES").unwrap_or_else(|_| "Westlake".to_string()),
            ),
            state: env::var("HOMESCOUT_STATE").unwrap_or_else(|_| "OH".to_string()),
            min_price: env::var("HOMESCOUT_MIN_PRICE")
                .unwrap_or_else(|_| "200000".to_string())
                .parse()
                .context("HOMESCOUT_MIN_PRICE must be a number")?,
            max_price: env::var("HOMESCOUT_MAX_PRICE")
                .unwrap_or_else(|_| "350000".to_string())
                .parse()
                .context("HOMESCOUT_MAX_PRICE must be a number")?,
            avoid_cities: env::var("HOMESCOUT_AVOID_CITIES")
                .map(|v| csv_list(&v))
                .unwrap_or_default(),
            max_age_years: match env::var("HOMESCOUT_MAX_AGE_YEARS") {
                Ok(v) => Some(v.parse().context("HOMESCOUT_MAX_AGE_YEARS must be a number")?),
                Err(_) => Some(100),
            },
            allow_pools: env::var("HOMESCOUT_ALLOW_POOLS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            call_budget: env::var("HOMESCOUT_CALL_BUDGET")
                .unwrap_or_else(|_| "40".to_string())
                .parse()
                .context("HOMESCOUT_CALL_BUDGET must be a number")?,
            max_deep_reviews: env::var("HOMESCOUT_MAX_DEEP_REVIEWS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("HOMESCOUT_MAX_DEEP_REVIEWS must be a number")?,
            notify_threshold: env::var("HOMESCOUT_NOTIFY_THRESHOLD")
                .unwrap_or_else(|_| "close_match".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HOMESCOUT_NOTIFY_THRESHOLD must be a valid tier"))?,
            review_retries: env::var("HOMESCOUT_REVIEW_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("HOMESCOUT_REVIEW_RETRIES must be a number")?,
            review_concurrency: env::var("HOMESCOUT_REVIEW_CONCURRENCY")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("HOMESCOUT_REVIEW_CONCURRENCY must be a number")?,
            // 8 runs/day keeps a 40-call budget under 10k calls/month
            schedule: env::var("HOMESCOUT_SCHEDULE")
                .unwrap_or_else(|_| "0 0 6,8,10,12,14,16,18,20 * * *".to_string()),
            prune_after_days: env::var("HOMESCOUT_PRUNE_AFTER_DAYS")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .context("HOMESCOUT_PRUNE_AFTER_DAYS must be a number")?,
            price_drop_percent: env::var("HOMESCOUT_PRICE_DROP_PERCENT")
                .unwrap_or_else(|_| "3.0".to_string())
                .parse()
                .context("HOMESCOUT_PRICE_DROP_PERCENT must be a number")?,
        })
    }

    /// Pipeline criteria derived from this configuration.
    pub fn criteria(&self) -> Criteria {
        let mut criteria = Criteria::new()
            .with_price_range(self.min_price, self.max_price)
            .with_avoid_cities(self.avoid_cities.clone())
            .with_notify_threshold(self.notify_threshold)
            .with_review_retries(self.review_retries)
            .with_review_concurrency(self.review_concurrency)
            .with_max_deep_reviews(self.max_deep_reviews);
        criteria.max_age_years = self.max_age_years;
        if self.allow_pools {
            criteria = criteria.allowing_pools();
        }
        criteria
    }
}

fn csv_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_list_trims_and_drops_empties() {
        assert_eq!(
            csv_list("Westlake, North Olmsted ,,Bay Village"),
            vec!["Westlake", "North Olmsted", "Bay Village"]
        );
    }
}
