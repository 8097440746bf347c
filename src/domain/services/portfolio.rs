//! Portfolio allocation buckets.
//!
//! The total balance is split into fixed fractions: long-term hold, yield
//! reserve, and the TRADING bucket the engine sizes orders from. Rebalancing
//! replaces all three buckets in one write from a freshly polled total;
//! readers take a single consistent snapshot. Buckets are deliberately not
//! reconciled against the exchange after each trade.

use crate::domain::errors::ConfigError;
use std::sync::RwLock;

/// Fixed split of the total balance. Must be non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationFractions {
    pub hodl: f64,
    pub yield_reserve: f64,
    pub trading: f64,
}

impl AllocationFractions {
    pub fn new(hodl: f64, yield_reserve: f64, trading: f64) -> Result<Self, ConfigError> {
        let sum = hodl + yield_reserve + trading;
        if hodl < 0.0 || yield_reserve < 0.0 || trading < 0.0 || (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::InvalidAllocations(sum));
        }
        Ok(AllocationFractions {
            hodl,
            yield_reserve,
            trading,
        })
    }
}

/// Bucket amounts derived from one observed total balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub hodl: f64,
    pub yield_reserve: f64,
    pub trading: f64,
}

impl Allocation {
    pub fn total(&self) -> f64 {
        self.hodl + self.yield_reserve + self.trading
    }
}

/// Allocator owning the current bucket amounts. A rebalance and a trade-
/// sizing read may race; the lock guarantees the reader sees one coherent
/// allocation, at worst one rebalance stale.
pub struct PortfolioAllocator {
    fractions: AllocationFractions,
    buckets: RwLock<Allocation>,
}

impl PortfolioAllocator {
    pub fn new(fractions: AllocationFractions, initial_total: f64) -> Self {
        let allocator = PortfolioAllocator {
            fractions,
            buckets: RwLock::new(Allocation {
                hodl: 0.0,
                yield_reserve: 0.0,
                trading: 0.0,
            }),
        };
        allocator.rebalance(initial_total);
        allocator
    }

    /// Recompute all buckets from a freshly polled total balance.
    pub fn rebalance(&self, total: f64) {
        let next = Allocation {
            hodl: total * self.fractions.hodl,
            yield_reserve: total * self.fractions.yield_reserve,
            trading: total * self.fractions.trading,
        };
        let mut guard = self
            .buckets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = next;
        tracing::info!(
            hodl = next.hodl,
            yield_reserve = next.yield_reserve,
            trading = next.trading,
            "portfolio rebalanced"
        );
    }

    /// One consistent copy of the current allocation.
    pub fn snapshot(&self) -> Allocation {
        *self
            .buckets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Amount currently earmarked for trading.
    pub fn trading_bucket(&self) -> f64 {
        self.snapshot().trading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fractions() -> AllocationFractions {
        AllocationFractions::new(0.5, 0.3, 0.2).unwrap()
    }

    #[test]
    fn test_fractions_must_sum_to_one() {
        assert!(AllocationFractions::new(0.5, 0.3, 0.2).is_ok());
        assert!(AllocationFractions::new(0.5, 0.3, 0.3).is_err());
        assert!(AllocationFractions::new(-0.1, 0.6, 0.5).is_err());
    }

    #[test]
    fn test_initial_allocation() {
        let allocator = PortfolioAllocator::new(fractions(), 2.0);
        let allocation = allocator.snapshot();
        assert_eq!(allocation.hodl, 1.0);
        assert_eq!(allocation.yield_reserve, 0.6);
        assert!((allocation.trading - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_rebalance_replaces_all_buckets() {
        let allocator = PortfolioAllocator::new(fractions(), 2.0);
        allocator.rebalance(10.0);
        let allocation = allocator.snapshot();
        assert_eq!(allocation.hodl, 5.0);
        assert_eq!(allocation.yield_reserve, 3.0);
        assert_eq!(allocation.trading, 2.0);
        assert!((allocation.total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_buckets_sum_to_last_observed_total() {
        let allocator = PortfolioAllocator::new(fractions(), 1.2345);
        assert!((allocator.snapshot().total() - 1.2345).abs() < 1e-9);
        assert!((allocator.trading_bucket() - 1.2345 * 0.2).abs() < 1e-9);
    }
}
