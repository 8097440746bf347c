use std::collections::VecDeque;

/// Default number of prices retained by the decision engine.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded FIFO window over observed prices, oldest first. Single writer:
/// the decision engine appends the latest price once per cycle.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    prices: VecDeque<f64>,
    capacity: usize,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        PriceHistory {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Seed the window from a historical series, keeping only the most
    /// recent `capacity` entries.
    pub fn from_closes(closes: Vec<f64>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for close in closes {
            history.push(close);
        }
        history
    }

    /// Append the latest price, evicting the oldest once full.
    pub fn push(&mut self, price: f64) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    /// Contiguous view for indicator computation.
    pub fn as_slice(&self) -> Vec<f64> {
        self.prices.iter().copied().collect()
    }
}
