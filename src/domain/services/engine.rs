//! Trading decision engine.
//!
//! One cycle: refresh sentiment, fetch the price, append it to the bounded
//! history, compute indicators, pick at most one action from the sentiment
//! regime table, then run it through the buy or sell gate. Cycles that take
//! no action are normal outcomes, not errors, and every skip logs its
//! reason.

use crate::domain::entities::order::OrderSide;
use crate::domain::repositories::exchange::ExchangeApi;
use crate::domain::services::indicators::{self, IndicatorPipeline};
use crate::domain::services::oracle::MarketSnapshot;
use crate::domain::services::portfolio::PortfolioAllocator;
use crate::domain::services::position::PositionTracker;
use crate::domain::services::sentiment::SentimentSource;
use crate::domain::value_objects::price_history::PriceHistory;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The bounded set of actions a cycle can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
    PartialSell,
}

/// Why an attempted action was not executed.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// 24h market volume below the liquidity floor.
    LowVolume(f64),
    /// Previous trade was already a sell; no redundant consecutive sells.
    AlreadySold,
    /// Profitability gate rejected the computed profit/loss percentage.
    NotProfitable(f64),
    /// Still inside the post-trade cooldown window.
    CooldownActive,
    /// Sized order is below the configured minimum trade volume.
    TradeTooSmall(f64),
    /// Order book fetch or order placement failed.
    OrderFailed(String),
}

/// Observable outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Price fetch failed; nothing was mutated.
    PriceUnavailable,
    /// Not enough history for the required indicators. Quiescent, expected
    /// during warm-up.
    WarmingUp,
    /// Indicators present but no regime condition matched.
    NoSignal,
    /// An order was placed and position state updated.
    Traded(TradeAction),
    /// An action matched but a gate rejected it.
    Skipped {
        action: TradeAction,
        reason: SkipReason,
    },
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub pair: String,
    /// Absolute 24h-volume floor below which buys are rejected.
    pub volume_floor: f64,
    /// Minimum profit/loss percentage the profitability gate accepts.
    pub profit_threshold_pct: f64,
    /// Price offset applied inside the spread when placing limit orders.
    pub price_buffer: f64,
    /// Orders smaller than this are skipped rather than placed.
    pub min_trade_volume: f64,
    /// Pause after any executed trade before the gates open again.
    /// Zero disables enforcement.
    pub trade_cooldown: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pair: "XBTUSDT".to_string(),
            volume_floor: 100.0,
            profit_threshold_pct: 0.0,
            price_buffer: 0.05,
            min_trade_volume: 0.0,
            trade_cooldown: Duration::ZERO,
        }
    }
}

/// Picks at most one action from the sentiment regime table. Regimes are
/// evaluated strong-positive, moderate-positive, strong-negative,
/// moderate-negative, neutral; first match wins. All sentiment bounds are
/// strict, so 0.5 falls to moderate-positive and -0.5 to moderate-negative.
pub fn decide(sentiment: f64, macd: f64, signal: f64, rsi: f64) -> Option<TradeAction> {
    if sentiment > 0.5 {
        (macd > signal * 0.9 && rsi < 65.0).then_some(TradeAction::Buy)
    } else if sentiment > 0.1 {
        (macd > signal && rsi < 60.0).then_some(TradeAction::Buy)
    } else if sentiment < -0.5 {
        (macd < signal * 1.1 && rsi > 50.0).then_some(TradeAction::Sell)
    } else if sentiment < -0.1 {
        (macd < signal && rsi > 45.0).then_some(TradeAction::Sell)
    } else if macd > signal && rsi < 40.0 {
        Some(TradeAction::Buy)
    } else if macd < signal && rsi > 60.0 {
        Some(TradeAction::PartialSell)
    } else {
        None
    }
}

/// The per-pair decision state machine. Owns the price history and position
/// tracker; nothing else mutates them.
pub struct TradingEngine {
    settings: EngineSettings,
    prices: PriceHistory,
    position: PositionTracker,
    sentiment_score: f64,
    exchange: Arc<dyn ExchangeApi>,
    allocator: Arc<PortfolioAllocator>,
    sentiment: Arc<dyn SentimentSource>,
    indicators: Box<dyn IndicatorPipeline>,
}

impl TradingEngine {
    pub fn new(
        settings: EngineSettings,
        exchange: Arc<dyn ExchangeApi>,
        allocator: Arc<PortfolioAllocator>,
        sentiment: Arc<dyn SentimentSource>,
        indicators: Box<dyn IndicatorPipeline>,
    ) -> Self {
        TradingEngine {
            settings,
            prices: PriceHistory::with_default_capacity(),
            position: PositionTracker::new(),
            sentiment_score: 0.0,
            exchange,
            allocator,
            sentiment,
            indicators,
        }
    }

    /// Preload the price window from historical closes so indicators are
    /// available before the first live cycle.
    pub fn seed_history(&mut self, closes: Vec<f64>) {
        for close in closes {
            self.prices.push(close);
        }
        info!(len = self.prices.len(), "price history seeded");
    }

    pub fn position(&self) -> &PositionTracker {
        &self.position
    }

    pub fn history_len(&self) -> usize {
        self.prices.len()
    }

    pub fn sentiment_score(&self) -> f64 {
        self.sentiment_score
    }

    /// Current market view for the advisory oracle, if indicators are ready.
    pub fn market_snapshot(&self) -> Option<MarketSnapshot> {
        let series = self.prices.as_slice();
        let latest = *series.last()?;
        let oldest = *series.first()?;
        let moving_average = self.indicators.moving_average(&series)?;
        let rsi = self.indicators.rsi(&series)?;
        let (macd, signal) = self.indicators.macd(&series)?;
        Some(MarketSnapshot {
            latest_price: latest,
            trend_change: latest - oldest,
            sentiment: self.sentiment_score,
            moving_average,
            rsi,
            macd,
            signal,
            allocation: self.allocator.snapshot(),
        })
    }

    /// Run one full decision cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.refresh_sentiment().await;

        let current_price = match self.exchange.latest_price(&self.settings.pair).await {
            Ok(price) => price,
            Err(e) => {
                warn!(error = %e, "price fetch failed, aborting cycle");
                return CycleOutcome::PriceUnavailable;
            }
        };
        self.prices.push(current_price);

        let series = self.prices.as_slice();
        let (moving_average, rsi, (macd, signal)) = match (
            self.indicators.moving_average(&series),
            self.indicators.rsi(&series),
            self.indicators.macd(&series),
        ) {
            (Some(ma), Some(rsi), Some(macd)) => (ma, rsi, macd),
            _ => {
                debug!(
                    history = series.len(),
                    "indicators unavailable, still warming up"
                );
                return CycleOutcome::WarmingUp;
            }
        };

        info!(
            price = current_price,
            moving_average,
            rsi,
            macd,
            signal,
            sentiment = self.sentiment_score,
            "cycle signals"
        );

        match decide(self.sentiment_score, macd, signal, rsi) {
            Some(TradeAction::Buy) => self.try_buy(current_price).await,
            Some(action @ (TradeAction::Sell | TradeAction::PartialSell)) => {
                self.try_sell(current_price, action).await
            }
            None => {
                info!(
                    macd,
                    signal, rsi, "no trade signal under current sentiment regime"
                );
                CycleOutcome::NoSignal
            }
        }
    }

    async fn refresh_sentiment(&mut self) {
        match self.sentiment.latest_score().await {
            Ok(score) => {
                self.sentiment_score = score;
                debug!(score, "sentiment score updated");
            }
            Err(e) => {
                warn!(error = %e, "sentiment refresh failed, keeping previous score");
            }
        }
    }

    /// Buy gate: cooldown, liquidity floor, then profitability against the
    /// last sell. A first buy with no prior sell passes the profit gate.
    /// There is deliberately no "already bought" suppression here; only the
    /// sell path suppresses same-direction repeats.
    async fn try_buy(&mut self, current_price: f64) -> CycleOutcome {
        if self.position.in_cooldown(Instant::now()) {
            info!("buy skipped: trade cooldown still active");
            return CycleOutcome::Skipped {
                action: TradeAction::Buy,
                reason: SkipReason::CooldownActive,
            };
        }

        match self.exchange.market_volume_24h(&self.settings.pair).await {
            Ok(volume) if volume < self.settings.volume_floor => {
                info!(volume, floor = self.settings.volume_floor, "buy skipped: market volume too low");
                return CycleOutcome::Skipped {
                    action: TradeAction::Buy,
                    reason: SkipReason::LowVolume(volume),
                };
            }
            Ok(volume) => debug!(volume, "market volume clears the floor"),
            // A failed volume check does not block the buy.
            Err(e) => warn!(error = %e, "volume check unavailable, proceeding"),
        }

        // Favorable means buying back no higher than we last sold.
        let profit_pct = self
            .position
            .last_sell_price()
            .map(|sell| indicators::potential_profit_loss(sell, current_price));
        if let Some(pct) = profit_pct {
            if !indicators::is_profitable(pct, self.settings.profit_threshold_pct) {
                info!(profit_pct = pct, "buy skipped: not yet profitable");
                return CycleOutcome::Skipped {
                    action: TradeAction::Buy,
                    reason: SkipReason::NotProfitable(pct),
                };
            }
        }

        let volume = self.allocator.trading_bucket();
        match self.execute_order(OrderSide::Buy, volume).await {
            Ok(()) => {
                self.position
                    .record_buy(current_price, self.settings.trade_cooldown);
                info!(
                    price = current_price,
                    volume,
                    profit_pct = profit_pct.unwrap_or(0.0),
                    "buy executed"
                );
                CycleOutcome::Traded(TradeAction::Buy)
            }
            Err(reason) => CycleOutcome::Skipped {
                action: TradeAction::Buy,
                reason,
            },
        }
    }

    /// Sell gate: cooldown, same-direction suppression, then profitability
    /// against the last buy. Partial sells use half the trading bucket.
    async fn try_sell(&mut self, current_price: f64, action: TradeAction) -> CycleOutcome {
        if self.position.in_cooldown(Instant::now()) {
            info!("sell skipped: trade cooldown still active");
            return CycleOutcome::Skipped {
                action,
                reason: SkipReason::CooldownActive,
            };
        }

        if self.position.last_trade() == Some(OrderSide::Sell) {
            info!("sell skipped: already in sell mode");
            return CycleOutcome::Skipped {
                action,
                reason: SkipReason::AlreadySold,
            };
        }

        // Favorable means selling no lower than we last bought.
        let profit_pct = self
            .position
            .last_buy_price()
            .map(|buy| indicators::potential_profit_loss(current_price, buy));
        if let Some(pct) = profit_pct {
            if !indicators::is_profitable(pct, self.settings.profit_threshold_pct) {
                info!(profit_pct = pct, "sell skipped: not yet profitable");
                return CycleOutcome::Skipped {
                    action,
                    reason: SkipReason::NotProfitable(pct),
                };
            }
        }

        let bucket = self.allocator.trading_bucket();
        let volume = match action {
            TradeAction::PartialSell => bucket / 2.0,
            _ => bucket,
        };
        match self.execute_order(OrderSide::Sell, volume).await {
            Ok(()) => {
                self.position
                    .record_sell(current_price, self.settings.trade_cooldown);
                info!(
                    price = current_price,
                    volume,
                    partial = (action == TradeAction::PartialSell),
                    profit_pct = profit_pct.unwrap_or(0.0),
                    "sell executed"
                );
                CycleOutcome::Traded(action)
            }
            Err(reason) => CycleOutcome::Skipped { action, reason },
        }
    }

    /// Fetch a fresh book, price the order just inside the spread, place it.
    async fn execute_order(&self, side: OrderSide, volume: f64) -> Result<(), SkipReason> {
        if volume < self.settings.min_trade_volume {
            info!(volume, minimum = self.settings.min_trade_volume, "order skipped: below minimum trade volume");
            return Err(SkipReason::TradeTooSmall(volume));
        }

        let book = self
            .exchange
            .order_book(&self.settings.pair)
            .await
            .map_err(|e| SkipReason::OrderFailed(e.to_string()))?;
        let price = book
            .optimal_limit_price(side, self.settings.price_buffer)
            .ok_or_else(|| SkipReason::OrderFailed("order book side is empty".to_string()))?;

        let receipt = self
            .exchange
            .place_limit_order(&self.settings.pair, side, price, volume)
            .await
            .map_err(|e| SkipReason::OrderFailed(e.to_string()))?;
        info!(side = %side, price, volume, txid = ?receipt.txid, "limit order placed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_positive_regime() {
        // MACD above 0.9x signal with RSI under 65 buys.
        assert_eq!(decide(0.6, 0.95, 1.0, 64.0), Some(TradeAction::Buy));
        // RSI at the bound blocks.
        assert_eq!(decide(0.6, 0.95, 1.0, 65.0), None);
        // MACD at exactly 0.9x signal blocks (strict comparison).
        assert_eq!(decide(0.6, 0.9, 1.0, 50.0), None);
    }

    #[test]
    fn test_sentiment_half_is_moderate_positive() {
        // Strong-positive is strict > 0.5, so 0.5 uses the moderate branch:
        // this MACD/RSI combination buys under strong rules but not moderate.
        assert_eq!(decide(0.51, 0.95, 1.0, 62.0), Some(TradeAction::Buy));
        assert_eq!(decide(0.5, 0.95, 1.0, 62.0), None);
        // And a moderate-qualifying combination still buys at 0.5.
        assert_eq!(decide(0.5, 1.1, 1.0, 59.0), Some(TradeAction::Buy));
    }

    #[test]
    fn test_sentiment_point_one_is_neutral() {
        // Moderate-positive is strict > 0.1: at 0.1 the neutral rules apply,
        // which need RSI < 40 to buy.
        assert_eq!(decide(0.11, 1.1, 1.0, 55.0), Some(TradeAction::Buy));
        assert_eq!(decide(0.1, 1.1, 1.0, 55.0), None);
        assert_eq!(decide(0.1, 1.1, 1.0, 39.0), Some(TradeAction::Buy));
    }

    #[test]
    fn test_sentiment_minus_half_is_moderate_negative() {
        // Strong-negative is strict < -0.5. At exactly -0.5 the moderate
        // branch needs MACD < signal; 1.05 > 1.0 sells only under strong.
        assert_eq!(decide(-0.51, 1.05, 1.0, 55.0), Some(TradeAction::Sell));
        assert_eq!(decide(-0.5, 1.05, 1.0, 55.0), None);
        assert_eq!(decide(-0.5, 0.9, 1.0, 46.0), Some(TradeAction::Sell));
    }

    #[test]
    fn test_sentiment_minus_point_one_is_neutral() {
        // Moderate-negative is strict < -0.1: at -0.1 neutral rules apply.
        assert_eq!(decide(-0.11, 0.9, 1.0, 50.0), Some(TradeAction::Sell));
        assert_eq!(decide(-0.1, 0.9, 1.0, 50.0), None);
        assert_eq!(
            decide(-0.1, 0.9, 1.0, 61.0),
            Some(TradeAction::PartialSell)
        );
    }

    #[test]
    fn test_neutral_regime() {
        assert_eq!(decide(0.0, 1.1, 1.0, 39.0), Some(TradeAction::Buy));
        assert_eq!(decide(0.0, 0.9, 1.0, 61.0), Some(TradeAction::PartialSell));
        assert_eq!(decide(0.0, 1.1, 1.0, 41.0), None);
        assert_eq!(decide(0.0, 0.9, 1.0, 59.0), None);
    }

    #[test]
    fn test_moderate_negative_rsi_bound() {
        assert_eq!(decide(-0.3, 0.9, 1.0, 46.0), Some(TradeAction::Sell));
        assert_eq!(decide(-0.3, 0.9, 1.0, 45.0), None);
    }

    #[test]
    fn test_strong_negative_regime() {
        // MACD under 1.1x signal with RSI above 50 sells.
        assert_eq!(decide(-0.6, 1.05, 1.0, 51.0), Some(TradeAction::Sell));
        assert_eq!(decide(-0.6, 1.05, 1.0, 50.0), None);
        assert_eq!(decide(-0.6, 1.1, 1.0, 55.0), None);
    }
}
