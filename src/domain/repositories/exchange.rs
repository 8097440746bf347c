//! Exchange API Trait
//!
//! Common interface between the decision engine and the exchange. The engine
//! only sees this seam, which keeps the trading logic independent of the
//! concrete REST client and lets tests drive full decision cycles without a
//! network.

use crate::domain::entities::order::{OrderReceipt, OrderSide};
use crate::domain::entities::order_book::OrderBookSnapshot;
use crate::domain::errors::ExchangeError;
use async_trait::async_trait;

/// Common result type for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Market data and order placement operations the engine relies on.
///
/// Every method degrades to `Err` on failure; callers treat that as "no data
/// this cycle", never as a reason to terminate.
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Last trade price for the pair.
    async fn latest_price(&self, pair: &str) -> ExchangeResult<f64>;

    /// 24-hour traded volume for the pair, in base units.
    async fn market_volume_24h(&self, pair: &str) -> ExchangeResult<f64>;

    /// Fresh order book snapshot for the pair.
    async fn order_book(&self, pair: &str) -> ExchangeResult<OrderBookSnapshot>;

    /// Closing prices for the pair at the given candle interval (minutes),
    /// most recent last. `since` is an optional unix timestamp lower bound.
    async fn historical_closes(
        &self,
        pair: &str,
        interval: u32,
        since: Option<u64>,
    ) -> ExchangeResult<Vec<f64>>;

    /// Balance for one asset key as reported by the exchange.
    async fn account_balance(&self, asset: &str) -> ExchangeResult<f64>;

    /// Place a limit order and return the exchange's receipt.
    async fn place_limit_order(
        &self,
        pair: &str,
        side: OrderSide,
        price: f64,
        volume: f64,
    ) -> ExchangeResult<OrderReceipt>;
}
