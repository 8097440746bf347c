use thiserror::Error;

/// Failures surfaced by the exchange boundary.
///
/// Transient variants are retried by the client with bounded backoff; all
/// others return to the caller immediately. Callers treat any variant as
/// "no data this cycle", never as a process-ending event.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("server error: HTTP {0}")]
    ServerError(u16),

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("exchange returned errors: {0:?}")]
    Api(Vec<String>),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("missing field in response: {0}")]
    MissingField(String),

    #[error("request signing failed: {0}")]
    Signing(String),
}

impl ExchangeError {
    /// Transient failures are worth another attempt; everything else is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExchangeError::Transport(_) | ExchangeError::ServerError(_)
        )
    }
}

/// Credential and signature failures. Only possible at client construction
/// or while signing; malformed credentials are fatal at startup.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("API secret is not valid base64: {0}")]
    InvalidSecret(String),

    #[error("failed to initialize HMAC: {0}")]
    Hmac(String),
}

/// Configuration loading failures. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    #[error("allocation fractions must be non-negative and sum to 1.0 (got {0})")]
    InvalidAllocations(f64),
}

/// Sentiment collaborator failures. Degrade to the previous score, never
/// abort a cycle.
#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("sentiment source unavailable: {0}")]
    Unavailable(String),
}
