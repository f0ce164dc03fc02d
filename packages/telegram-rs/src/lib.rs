//! Minimal Telegram Bot API client.
//!
//! Sends HTML-formatted messages to a single chat, optionally with one
//! inline link button. Nothing else: no polling, no webhooks.
//!
//! # Example
//!
//! ```rust,ignore
//! use telegram_rs::TelegramBot;
//!
//! let bot = TelegramBot::new("123456:bot-token".into(), "987654".into());
//! bot.send_html("<b>Hello</b>", None).await?;
//! ```

pub mod models;

use models::{ApiResponse, InlineKeyboardButton, Message, ReplyMarkup, SendMessage};
use thiserror::Error;

const BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram API rejected message: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Clone)]
pub struct TelegramBot {
    client: reqwest::Client,
    token: String,
    chat_id: String,
    base_url: String,
}

impl TelegramBot {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            chat_id,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the API host (for tests against a local stub).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Send an HTML message, optionally with a single link button.
    ///
    /// Returns the Telegram message id on success.
    pub async fn send_html(
        &self,
        text: &str,
        link_button: Option<(&str, &str)>,
    ) -> Result<i64> {
        let payload = SendMessage {
            chat_id: self.chat_id.clone(),
            text: text.to_string(),
            parse_mode: "HTML".to_string(),
            disable_web_page_preview: true,
            reply_markup: link_button.map(|(label, url)| ReplyMarkup {
                inline_keyboard: vec![vec![InlineKeyboardButton {
                    text: label.to_string(),
                    url: url.to_string(),
                }]],
            }),
        };

        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let resp = self.client.post(&url).json(&payload).send().await?;

        let status = resp.status();
        let body: ApiResponse<Message> = resp.json().await.map_err(|e| {
            TelegramError::Api(format!("unparseable response (status {status}): {e}"))
        })?;

        if !body.ok {
            return Err(TelegramError::Api(
                body.description
                    .unwrap_or_else(|| format!("status {status}")),
            ));
        }

        body.result
            .map(|m| m.message_id)
            .ok_or_else(|| TelegramError::Api("ok response without message".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_send_message_serializes_without_markup() {
        let msg = SendMessage {
            chat_id: "42".into(),
            text: "<b>hi</b>".into(),
            parse_mode: "HTML".into(),
            disable_web_page_preview: true,
            reply_markup: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert!(json.get("reply_markup").is_none());
    }

    #[test]
    fn test_api_response_parses_error_shape() {
        let json = r#"{"ok":false,"description":"Bad Request: chat not found"}"#;
        let resp: ApiResponse<Message> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert_eq!(
            resp.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }
}
