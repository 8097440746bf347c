//! Technical indicators over a plain price series.
//!
//! Every indicator returns `None` while the history is too short; that is a
//! quiescent warm-up state, not an error.

/// Simple moving average window.
pub const MA_PERIOD: usize = 20;
/// Wilder RSI window.
pub const RSI_PERIOD: usize = 14;
/// MACD fast / slow / signal EMA periods.
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Simple moving average of the trailing `period` prices.
pub fn moving_average(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Relative strength index over the trailing `period` price changes,
/// bounded to [0, 100].
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }
    let changes = &prices[prices.len() - period - 1..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in changes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum += change.abs();
        }
    }
    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Exponential moving average series. The first value is the SMA of the
/// initial `period` inputs.
fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() || period == 0 {
        return vec![];
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let initial = period.min(values.len());
    let mut ema = values[..initial].iter().sum::<f64>() / initial as f64;
    let mut series = vec![ema];
    for &value in values.iter().skip(period) {
        ema = (value - ema) * multiplier + ema;
        series.push(ema);
    }
    series
}

/// MACD line and its smoothed signal line, as `(macd, signal)`. MACD above
/// signal is a bullish crossover.
pub fn macd(prices: &[f64]) -> Option<(f64, f64)> {
    if prices.len() < MACD_SLOW + MACD_SIGNAL {
        return None;
    }
    let fast = ema_series(prices, MACD_FAST);
    let slow = ema_series(prices, MACD_SLOW);
    // Fast series is longer; align both on their tails.
    let len = fast.len().min(slow.len());
    let macd_line: Vec<f64> = fast[fast.len() - len..]
        .iter()
        .zip(&slow[slow.len() - len..])
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_series(&macd_line, MACD_SIGNAL);
    Some((*macd_line.last()?, *signal_line.last()?))
}

/// Percentage move from `entry` to `exit`. The caller supplies the two in
/// the order that makes a positive value favorable for the trade it gates.
pub fn potential_profit_loss(exit_price: f64, entry_price: f64) -> f64 {
    ((exit_price - entry_price) / entry_price) * 100.0
}

/// Profitability predicate; accepts any value at or above the configured
/// threshold (default 0.0).
pub fn is_profitable(profit_pct: f64, threshold_pct: f64) -> bool {
    profit_pct >= threshold_pct
}

/// Indicator computation as a collaborator boundary so tests can inject
/// fixed values and the engine stays independent of the math above.
pub trait IndicatorPipeline: Send + Sync {
    fn moving_average(&self, prices: &[f64]) -> Option<f64>;
    fn rsi(&self, prices: &[f64]) -> Option<f64>;
    fn macd(&self, prices: &[f64]) -> Option<(f64, f64)>;
}

/// Default pipeline backed by the functions in this module.
pub struct StandardIndicators {
    pub ma_period: usize,
    pub rsi_period: usize,
}

impl Default for StandardIndicators {
    fn default() -> Self {
        StandardIndicators {
            ma_period: MA_PERIOD,
            rsi_period: RSI_PERIOD,
        }
    }
}

impl IndicatorPipeline for StandardIndicators {
    fn moving_average(&self, prices: &[f64]) -> Option<f64> {
        moving_average(prices, self.ma_period)
    }

    fn rsi(&self, prices: &[f64]) -> Option<f64> {
        rsi(prices, self.rsi_period)
    }

    fn macd(&self, prices: &[f64]) -> Option<(f64, f64)> {
        macd(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_average_insufficient_history() {
        assert_eq!(moving_average(&[1.0, 2.0], 3), None);
        assert_eq!(moving_average(&[], 1), None);
    }

    #[test]
    fn test_moving_average_uses_trailing_window() {
        let prices = vec![10.0, 20.0, 30.0, 40.0];
        assert_eq!(moving_average(&prices, 2), Some(35.0));
        assert_eq!(moving_average(&prices, 4), Some(25.0));
    }

    #[test]
    fn test_rsi_bounds() {
        // Monotonically rising prices: no losses, RSI saturates at 100.
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&rising, 14), Some(100.0));

        let falling: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let value = rsi(&falling, 14).unwrap();
        assert!(value < 1.0);
    }

    #[test]
    fn test_rsi_insufficient_history() {
        let prices: Vec<f64> = (0..14).map(|i| i as f64).collect();
        assert_eq!(rsi(&prices, 14), None);
    }

    #[test]
    fn test_rsi_mixed_series_in_range() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28,
        ];
        let value = rsi(&prices, 14).unwrap();
        assert!(value > 0.0 && value < 100.0);
        assert!(value > 50.0); // net gains in this series
    }

    #[test]
    fn test_macd_insufficient_history() {
        let prices: Vec<f64> = (0..30).map(|i| i as f64).collect();
        assert_eq!(macd(&prices), None);
    }

    #[test]
    fn test_macd_bullish_on_uptrend() {
        // Flat then accelerating upward: fast EMA pulls above slow, MACD
        // rises faster than its signal smoothing.
        let mut prices = vec![100.0; 40];
        for i in 0..20 {
            prices.push(100.0 + (i as f64 + 1.0) * 2.0);
        }
        let (macd_value, signal_value) = macd(&prices).unwrap();
        assert!(macd_value > 0.0);
        assert!(macd_value > signal_value);
    }

    #[test]
    fn test_potential_profit_loss() {
        assert_eq!(potential_profit_loss(110.0, 100.0), 10.0);
        assert_eq!(potential_profit_loss(90.0, 100.0), -10.0);
    }

    #[test]
    fn test_is_profitable_threshold() {
        assert!(is_profitable(0.0, 0.0));
        assert!(is_profitable(2.5, 0.0));
        assert!(!is_profitable(-0.1, 0.0));
        assert!(!is_profitable(0.5, 1.0));
    }

    #[test]
    fn test_standard_pipeline_matches_functions() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).sin()).collect();
        let pipeline = StandardIndicators::default();
        assert_eq!(
            pipeline.moving_average(&prices),
            moving_average(&prices, MA_PERIOD)
        );
        assert_eq!(pipeline.rsi(&prices), rsi(&prices, RSI_PERIOD));
        assert_eq!(pipeline.macd(&prices), macd(&prices));
    }
}
