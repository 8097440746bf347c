//! Position state carried between decision cycles.
//!
//! Single writer: the decision engine mutates this immediately after a
//! successful order placement and nowhere else. In-memory only; a restart
//! loses trade-direction memory by design.

use crate::domain::entities::order::OrderSide;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct PositionTracker {
    last_buy_price: Option<f64>,
    last_sell_price: Option<f64>,
    last_trade: Option<OrderSide>,
    cooldown_until: Option<Instant>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_buy_price(&self) -> Option<f64> {
        self.last_buy_price
    }

    pub fn last_sell_price(&self) -> Option<f64> {
        self.last_sell_price
    }

    pub fn last_trade(&self) -> Option<OrderSide> {
        self.last_trade
    }

    /// True while a freshly executed trade still blocks new ones.
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    pub fn record_buy(&mut self, price: f64, cooldown: Duration) {
        self.last_buy_price = Some(price);
        self.last_trade = Some(OrderSide::Buy);
        self.arm_cooldown(cooldown);
    }

    pub fn record_sell(&mut self, price: f64, cooldown: Duration) {
        self.last_sell_price = Some(price);
        self.last_trade = Some(OrderSide::Sell);
        self.arm_cooldown(cooldown);
    }

    fn arm_cooldown(&mut self, cooldown: Duration) {
        self.cooldown_until = if cooldown.is_zero() {
            None
        } else {
            Some(Instant::now() + cooldown)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let position = PositionTracker::new();
        assert_eq!(position.last_buy_price(), None);
        assert_eq!(position.last_sell_price(), None);
        assert_eq!(position.last_trade(), None);
        assert!(!position.in_cooldown(Instant::now()));
    }

    #[test]
    fn test_record_buy_sets_direction() {
        let mut position = PositionTracker::new();
        position.record_buy(40000.0, Duration::ZERO);
        assert_eq!(position.last_buy_price(), Some(40000.0));
        assert_eq!(position.last_trade(), Some(OrderSide::Buy));
        // Zero cooldown never blocks.
        assert!(!position.in_cooldown(Instant::now()));
    }

    #[test]
    fn test_record_sell_keeps_buy_price() {
        let mut position = PositionTracker::new();
        position.record_buy(40000.0, Duration::ZERO);
        position.record_sell(41000.0, Duration::ZERO);
        assert_eq!(position.last_buy_price(), Some(40000.0));
        assert_eq!(position.last_sell_price(), Some(41000.0));
        assert_eq!(position.last_trade(), Some(OrderSide::Sell));
    }

    #[test]
    fn test_cooldown_window() {
        let mut position = PositionTracker::new();
        position.record_buy(40000.0, Duration::from_secs(300));
        assert!(position.in_cooldown(Instant::now()));
        assert!(!position.in_cooldown(Instant::now() + Duration::from_secs(301)));
    }
}
