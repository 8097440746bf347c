//! Chat-completion backed decision oracle.
//!
//! The model only ever emits prose; the strict classifier at the domain
//! boundary turns its leading token into a closed `Advice` value and every
//! transport, status or parse failure degrades to `Hold`. The oracle is
//! advisory and must never fail a decision cycle.

use crate::domain::services::oracle::{classify_advice, Advice, DecisionOracle, MarketSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4";
const SYSTEM_PROMPT: &str = "You are a helpful and knowledgeable trading assistant.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

pub struct OpenAiOracle {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DEFAULT_API_URL)
    }

    pub fn with_endpoint(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        OpenAiOracle {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn build_prompt(snapshot: &MarketSnapshot) -> String {
        format!(
            "You are a trading expert. Based on the following data, decide whether to Buy, Hold, or Sell Bitcoin:\n\n\
             - Latest price: ${:.2}\n\
             - Historical price trend: {} trend over the past period with a change of ${:.2}.\n\
             - Sentiment score: {:.2}.\n\
             - Moving average: {:.2}, RSI: {:.2}, MACD: {:.4}, Signal: {:.4}.\n\
             - Portfolio allocation (BTC): HODL {:.6}, YIELD {:.6}, TRADING {:.6}.\n\n\
             Answer with a single word first (Buy, Hold, or Sell), then explain the reasoning in under 100 words.",
            snapshot.latest_price,
            snapshot.trend_direction(),
            snapshot.trend_change,
            snapshot.sentiment,
            snapshot.moving_average,
            snapshot.rsi,
            snapshot.macd,
            snapshot.signal,
            snapshot.allocation.hodl,
            snapshot.allocation.yield_reserve,
            snapshot.allocation.trading,
        )
    }

    async fn request_advice(&self, snapshot: &MarketSnapshot) -> Result<Advice, String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::build_prompt(snapshot),
                },
            ],
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("oracle returned HTTP {}", response.status()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("unparseable response: {}", e))?;
        let content = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or("response carried no choices")?;

        info!(response = content, "oracle responded");
        Ok(classify_advice(content))
    }
}

#[async_trait]
impl DecisionOracle for OpenAiOracle {
    async fn advise(&self, snapshot: &MarketSnapshot) -> Advice {
        match self.request_advice(snapshot).await {
            Ok(advice) => advice,
            Err(reason) => {
                error!(%reason, "oracle unavailable, failing safe to hold");
                Advice::Hold
            }
        }
    }
}
