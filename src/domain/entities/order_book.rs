use crate::domain::entities::order::OrderSide;

/// One resting level of the order book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    pub price: f64,
    pub volume: f64,
}

/// A point-in-time view of the book for one pair. Asks ascend by price,
/// bids descend. Fetched fresh per decision, never cached across cycles.
#[derive(Debug, Clone, Default)]
pub struct OrderBookSnapshot {
    pub asks: Vec<PriceLevel>,
    pub bids: Vec<PriceLevel>,
}

impl OrderBookSnapshot {
    pub fn new(asks: Vec<PriceLevel>, bids: Vec<PriceLevel>) -> Self {
        OrderBookSnapshot { asks, bids }
    }

    /// Limit price slightly inside the spread: best ask minus `buffer` for a
    /// buy, best bid plus `buffer` for a sell, snapped to the exchange's
    /// minimum price increment (one decimal place). The snap is directional,
    /// down for buys and up for sells, so the grid never pushes the order
    /// across the touch. `None` when the relevant side of the book is empty.
    pub fn optimal_limit_price(&self, side: OrderSide, buffer: f64) -> Option<f64> {
        // Tolerance for float slop when the raw price already sits on the grid.
        const GRID_EPSILON: f64 = 1e-9;
        match side {
            OrderSide::Buy => {
                let raw = self.asks.first()?.price - buffer;
                Some((raw * 10.0 + GRID_EPSILON).floor() / 10.0)
            }
            OrderSide::Sell => {
                let raw = self.bids.first()?.price + buffer;
                Some((raw * 10.0 - GRID_EPSILON).ceil() / 10.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: f64, volume: f64) -> PriceLevel {
        PriceLevel { price, volume }
    }

    #[test]
    fn test_optimal_buy_price_undercuts_best_ask() {
        let book = OrderBookSnapshot::new(
            vec![level(100.0, 1.0), level(101.0, 2.0)],
            vec![level(99.5, 1.0)],
        );
        assert_eq!(book.optimal_limit_price(OrderSide::Buy, 0.05), Some(99.9));
    }

    #[test]
    fn test_optimal_sell_price_overbids_best_bid() {
        let book = OrderBookSnapshot::new(vec![level(100.0, 1.0)], vec![level(99.0, 1.0)]);
        assert_eq!(book.optimal_limit_price(OrderSide::Sell, 0.05), Some(99.1));
    }

    #[test]
    fn test_optimal_price_snaps_toward_the_passive_side() {
        let book = OrderBookSnapshot::new(vec![level(27501.23, 0.4)], vec![level(27501.23, 0.4)]);
        // 27501.18 snaps down for a buy, 27501.28 snaps up for a sell.
        assert_eq!(
            book.optimal_limit_price(OrderSide::Buy, 0.05),
            Some(27501.1)
        );
        assert_eq!(
            book.optimal_limit_price(OrderSide::Sell, 0.05),
            Some(27501.3)
        );
    }

    #[test]
    fn test_optimal_price_empty_side() {
        let book = OrderBookSnapshot::default();
        assert_eq!(book.optimal_limit_price(OrderSide::Buy, 0.05), None);
        assert_eq!(book.optimal_limit_price(OrderSide::Sell, 0.05), None);
    }
}
