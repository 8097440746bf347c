//! Advisory decision oracle boundary.
//!
//! The oracle sees the same market snapshot the engine does and answers with
//! one of three closed advice values. Implementations that can only emit
//! prose must classify it at this boundary and fail safe to `Hold` on
//! anything ambiguous. The engine trades on its own technical signals; the
//! advice is logged alongside each cycle.

use crate::domain::services::portfolio::Allocation;
use async_trait::async_trait;
use std::fmt;

/// Closed advice enumeration. Prose never crosses this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    Buy,
    Hold,
    Sell,
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::Buy => write!(f, "buy"),
            Advice::Hold => write!(f, "hold"),
            Advice::Sell => write!(f, "sell"),
        }
    }
}

/// Strict classifier for prose responses: only the leading alphabetic token
/// counts, case-insensitively. Anything else is `Hold`.
pub fn classify_advice(text: &str) -> Advice {
    let token: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    match token.to_ascii_lowercase().as_str() {
        "buy" => Advice::Buy,
        "sell" => Advice::Sell,
        "hold" => Advice::Hold,
        _ => Advice::Hold,
    }
}

/// Inputs handed to the oracle for one cycle.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub latest_price: f64,
    /// Change from the oldest to the newest price in the current window.
    pub trend_change: f64,
    pub sentiment: f64,
    pub moving_average: f64,
    pub rsi: f64,
    pub macd: f64,
    pub signal: f64,
    pub allocation: Allocation,
}

impl MarketSnapshot {
    pub fn trend_direction(&self) -> &'static str {
        if self.trend_change > 0.0 {
            "upward"
        } else if self.trend_change < 0.0 {
            "downward"
        } else {
            "flat"
        }
    }
}

/// Oracle collaborator. Implementations must never fail a cycle: transport
/// or parse problems degrade to `Advice::Hold`.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn advise(&self, snapshot: &MarketSnapshot) -> Advice;
}
