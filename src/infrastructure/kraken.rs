//! Kraken REST client.
//!
//! Public endpoints are plain GETs; private endpoints POST a url-encoded
//! body carrying a strictly increasing nonce and are signed per
//! [`crate::infrastructure::signing`]. Every call funnels through one
//! dispatch loop that retries transient failures with capped exponential
//! backoff and returns all other failures immediately. A non-empty `error`
//! array in the response envelope is a failure regardless of HTTP status.

use crate::domain::entities::order::{OrderReceipt, OrderSide};
use crate::domain::entities::order_book::{OrderBookSnapshot, PriceLevel};
use crate::domain::errors::ExchangeError;
use crate::domain::repositories::exchange::{ExchangeApi, ExchangeResult};
use crate::infrastructure::signing::Credentials;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use url::form_urlencoded;

pub const DEFAULT_API_DOMAIN: &str = "https://api.kraken.com";
const PUBLIC_PREFIX: &str = "/0/public/";
const PRIVATE_PREFIX: &str = "/0/private/";
const USER_AGENT: &str = "mawimbi/0.1.0";

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    error: Vec<String>,
    result: Option<Value>,
}

enum Visibility {
    Public,
    Private,
}

/// Authenticated Kraken client. Owns its credentials and HTTP transport;
/// construct once and share by reference.
pub struct KrakenClient {
    http: reqwest::Client,
    domain: String,
    credentials: Credentials,
    retry: RetryPolicy,
    last_nonce: AtomicU64,
}

impl KrakenClient {
    pub fn new(credentials: Credentials, domain: impl Into<String>, retry: RetryPolicy) -> Self {
        KrakenClient {
            http: reqwest::Client::new(),
            domain: domain.into(),
            credentials,
            retry,
            last_nonce: AtomicU64::new(0),
        }
    }

    /// Wall-clock-millisecond nonce, forced strictly increasing even when
    /// calls land within the same millisecond or the clock steps back.
    fn next_nonce(&self) -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut prev = self.last_nonce.load(Ordering::Relaxed);
        loop {
            let next = now_ms.max(prev + 1);
            match self.last_nonce.compare_exchange_weak(
                prev,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Issue an unauthenticated GET against a public endpoint.
    pub async fn call_public(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<Value> {
        self.dispatch(Visibility::Public, endpoint, params).await
    }

    /// Issue a signed POST against a private endpoint. A fresh nonce is
    /// injected per attempt, so retries never reuse one.
    pub async fn call_private(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<Value> {
        self.dispatch(Visibility::Private, endpoint, params).await
    }

    async fn dispatch(
        &self,
        visibility: Visibility,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<Value> {
        let mut attempt = 0u32;
        let mut delay = self.retry.base_delay;
        loop {
            attempt += 1;
            let result = match visibility {
                Visibility::Public => self.send_public(endpoint, params).await,
                Visibility::Private => self.send_private(endpoint, params).await,
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt >= self.retry.max_attempts {
                        return Err(ExchangeError::RetriesExhausted {
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }
                    warn!(endpoint, attempt, error = %e, "transient exchange failure, backing off");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.retry.max_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_public(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<Value> {
        let url = format!("{}{}{}", self.domain, PUBLIC_PREFIX, endpoint);
        debug!(%url, "public request");
        let response = self
            .http
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .query(params)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Self::unwrap_envelope(response).await
    }

    async fn send_private(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<Value> {
        let path = format!("{}{}", PRIVATE_PREFIX, endpoint);
        let url = format!("{}{}", self.domain, path);
        let nonce = self.next_nonce();

        let body = {
            let mut body = form_urlencoded::Serializer::new(String::new());
            body.append_pair("nonce", &nonce.to_string());
            for (key, value) in params {
                body.append_pair(key, value);
            }
            body.finish()
        };

        let signature = self
            .credentials
            .sign(&path, nonce, &body)
            .map_err(|e| ExchangeError::Signing(e.to_string()))?;

        debug!(%url, nonce, "private request");
        let response = self
            .http
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .header("API-Key", self.credentials.key())
            .header("API-Sign", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope(response: reqwest::Response) -> ExchangeResult<Value> {
        let status = response.status();
        if status.is_server_error() {
            return Err(ExchangeError::ServerError(status.as_u16()));
        }
        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|e| ExchangeError::MalformedResponse(e.to_string()))?;
        if !envelope.error.is_empty() {
            // The partial result is discarded on any application error.
            return Err(ExchangeError::Api(envelope.error));
        }
        envelope
            .result
            .ok_or_else(|| ExchangeError::MissingField("result".to_string()))
    }

    /// Result entry for a pair. Ticker and Depth results are keyed by the
    /// exchange's canonical pair name, which may differ from the requested
    /// one, so fall back to the first non-bookkeeping key.
    fn pair_entry<'a>(result: &'a Value, pair: &str) -> ExchangeResult<&'a Value> {
        result
            .get(pair)
            .or_else(|| {
                result
                    .as_object()
                    .and_then(|map| map.iter().find(|(k, _)| *k != "last"))
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| ExchangeError::MissingField(format!("result.{}", pair)))
    }

    /// The exchange encodes most numbers as strings.
    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn parse_levels(value: Option<&Value>) -> Vec<PriceLevel> {
        value
            .and_then(Value::as_array)
            .map(|levels| {
                levels
                    .iter()
                    .filter_map(|level| {
                        let entries = level.as_array()?;
                        Some(PriceLevel {
                            price: Self::as_f64(entries.first()?)?,
                            volume: Self::as_f64(entries.get(1)?)?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExchangeApi for KrakenClient {
    async fn latest_price(&self, pair: &str) -> ExchangeResult<f64> {
        let result = self
            .call_public("Ticker", &[("pair", pair.to_string())])
            .await?;
        let entry = Self::pair_entry(&result, pair)?;
        entry
            .get("c")
            .and_then(|c| c.get(0))
            .and_then(Self::as_f64)
            .ok_or_else(|| ExchangeError::MissingField("c[0]".to_string()))
    }

    async fn market_volume_24h(&self, pair: &str) -> ExchangeResult<f64> {
        let result = self
            .call_public("Ticker", &[("pair", pair.to_string())])
            .await?;
        let entry = Self::pair_entry(&result, pair)?;
        // v[1] is the trailing 24-hour volume.
        entry
            .get("v")
            .and_then(|v| v.get(1))
            .and_then(Self::as_f64)
            .ok_or_else(|| ExchangeError::MissingField("v[1]".to_string()))
    }

    async fn order_book(&self, pair: &str) -> ExchangeResult<OrderBookSnapshot> {
        let result = self
            .call_public("Depth", &[("pair", pair.to_string())])
            .await?;
        let entry = Self::pair_entry(&result, pair)?;
        Ok(OrderBookSnapshot::new(
            Self::parse_levels(entry.get("asks")),
            Self::parse_levels(entry.get("bids")),
        ))
    }

    async fn historical_closes(
        &self,
        pair: &str,
        interval: u32,
        since: Option<u64>,
    ) -> ExchangeResult<Vec<f64>> {
        let mut params = vec![
            ("pair", pair.to_string()),
            ("interval", interval.to_string()),
        ];
        if let Some(since) = since {
            params.push(("since", since.to_string()));
        }
        let result = self.call_public("OHLC", &params).await?;
        let entry = Self::pair_entry(&result, pair)?;
        let candles = entry
            .as_array()
            .ok_or_else(|| ExchangeError::MalformedResponse("OHLC series is not an array".to_string()))?;
        // Candle layout: [time, open, high, low, close, vwap, volume, count].
        Ok(candles
            .iter()
            .filter_map(|candle| candle.get(4).and_then(Self::as_f64))
            .collect())
    }

    async fn account_balance(&self, asset: &str) -> ExchangeResult<f64> {
        let result = self.call_private("Balance", &[]).await?;
        result
            .get(asset)
            .and_then(Self::as_f64)
            .ok_or_else(|| ExchangeError::MissingField(format!("balance for {}", asset)))
    }

    async fn place_limit_order(
        &self,
        pair: &str,
        side: OrderSide,
        price: f64,
        volume: f64,
    ) -> ExchangeResult<OrderReceipt> {
        let params = [
            ("pair", pair.to_string()),
            ("type", side.as_str().to_string()),
            ("ordertype", "limit".to_string()),
            ("price", price.to_string()),
            ("volume", volume.to_string()),
        ];
        let result = self.call_private("AddOrder", &params).await?;
        serde_json::from_value(result).map_err(|e| ExchangeError::MalformedResponse(e.to_string()))
    }
}
