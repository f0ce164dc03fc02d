//! OpenAI implementation of the [`Scorer`] trait.
//!
//! Chat completions with `json_object` output and temperature 0. The
//! model is told to answer with exactly one of the four outcome tiers;
//! anything else fails closed in the reviewer, never here.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ReviewError;
use crate::review::{ReviewRequest, Scorer, ScorerResponse};

const SYSTEM_PROMPT: &str = "You evaluate residential real-estate listings \
for a buyer who requires a finished basement, or an unfinished basement \
with at least 600 square feet that could be finished. Judge only from the \
listing text provided. Respond with a JSON object with exactly two keys: \
\"tier\", one of \"complete_match\", \"close_match\", \"partial_match\", \
\"reject\", and \"rationale\", one short sentence citing the listing text. \
Use \"complete_match\" when the basement requirement is explicitly \
satisfied, \"close_match\" when it is very likely satisfied, \
\"partial_match\" when the listing is plausible but the basement is \
unconfirmed, and \"reject\" when the requirement is contradicted or the \
property is otherwise unsuitable. Never invent details not present in the \
text.";

/// OpenAI-backed listing scorer.
#[derive(Clone)]
pub struct OpenAiScorer {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiScorer {
    /// Create a scorer with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct TierReply {
    tier: String,
    #[serde(default)]
    rationale: String,
}

#[async_trait]
impl Scorer for OpenAiScorer {
    async fn score(&self, request: &ReviewRequest) -> Result<ScorerResponse, ReviewError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.rendered.clone(),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ReviewError::transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReviewError::transport(std::io::Error::other(format!(
                "OpenAI returned {status}: {error_text}"
            ))));
        }

        let chat: ChatResponse = response.json().await.map_err(ReviewError::transport)?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ReviewError::Malformed("empty choices from OpenAI".into()))?;

        let reply: TierReply = serde_json::from_str(&content)
            .map_err(|e| ReviewError::Malformed(format!("unparseable scorer reply: {e}")))?;

        Ok(ScorerResponse {
            tier: reply.tier,
            rationale: reply.rationale,
        })
    }
}
