//! Telegram-backed implementation of the pipeline's notifier seam.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use homescout::{EvaluatedListing, ListingStore, Notifier, NotifyError};
use telegram_rs::TelegramBot;

use crate::format;

pub struct TelegramNotifier {
    bot: TelegramBot,
    store: Arc<dyn ListingStore>,
}

impl TelegramNotifier {
    pub fn new(bot: TelegramBot, store: Arc<dyn ListingStore>) -> Self {
        Self { bot, store }
    }

    async fn send(&self, entry: &EvaluatedListing, text: &str) -> Result<(), NotifyError> {
        let button = entry
            .listing
            .listing_url
            .as_deref()
            .map(|url| ("🏠 View Full Listing", url));

        let message_id = self
            .bot
            .send_html(text, button)
            .await
            .map_err(|e| NotifyError::new(&entry.listing.identity_key, e.to_string()))?;

        info!(
            identity_key = %entry.listing.identity_key,
            message_id,
            "telegram notification delivered"
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify_match(&self, entry: &EvaluatedListing) -> Result<(), NotifyError> {
        // Insights are best-effort; a store hiccup must not block delivery.
        let city_average = self
            .store
            .city_average_price(&entry.listing.city)
            .await
            .unwrap_or(None);
        self.send(entry, &format::format_match(entry, city_average))
            .await
    }

    async fn notify_closest_miss(&self, entry: &EvaluatedListing) -> Result<(), NotifyError> {
        self.send(entry, &format::format_closest_miss(entry)).await
    }
}
