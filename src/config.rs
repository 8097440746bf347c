//! Runtime configuration.
//!
//! Everything is environment-driven (loaded through dotenv in `main`).
//! Missing or malformed credentials and allocation fractions are fatal at
//! startup; every other variable falls back to its default with a warning.

use crate::domain::errors::ConfigError;
use crate::domain::services::engine::EngineSettings;
use crate::domain::services::portfolio::AllocationFractions;
use crate::infrastructure::kraken::{RetryPolicy, DEFAULT_API_DOMAIN};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_secret: String,
    pub api_domain: String,
    pub pair: String,
    /// Asset key the exchange reports the total balance under.
    pub balance_asset: String,
    pub allocations: AllocationFractions,
    pub min_trade_volume: f64,
    pub volume_floor: f64,
    pub profit_threshold_pct: f64,
    pub price_buffer: f64,
    pub trade_cooldown: Duration,
    pub cycle_interval: Duration,
    /// OHLC candle interval used to seed the price history, in minutes.
    pub warmup_interval_minutes: u32,
    pub max_retry_attempts: u32,
    pub openai_api_key: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable lookup. `from_env` delegates here;
    /// tests pass a closure over a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("API_KEY").ok_or(ConfigError::MissingVar("API_KEY"))?;
        let api_secret = lookup("API_SECRET").ok_or(ConfigError::MissingVar("API_SECRET"))?;

        let allocations = AllocationFractions::new(
            float_var(&lookup, "ALLOC_HODL", 0.5),
            float_var(&lookup, "ALLOC_YIELD", 0.3),
            float_var(&lookup, "ALLOC_TRADING", 0.2),
        )?;

        Ok(Settings {
            api_key,
            api_secret,
            api_domain: lookup("API_DOMAIN").unwrap_or_else(|| DEFAULT_API_DOMAIN.to_string()),
            pair: lookup("TRADING_PAIR").unwrap_or_else(|| "XBTUSDT".to_string()),
            balance_asset: lookup("BALANCE_ASSET").unwrap_or_else(|| "XBT.F".to_string()),
            allocations,
            min_trade_volume: float_var(&lookup, "MIN_TRADE_VOLUME", 0.0),
            volume_floor: float_var(&lookup, "VOLUME_FLOOR", 100.0),
            profit_threshold_pct: float_var(&lookup, "PROFIT_THRESHOLD_PCT", 0.0),
            price_buffer: float_var(&lookup, "PRICE_BUFFER", 0.05),
            trade_cooldown: Duration::from_secs(int_var(&lookup, "GLOBAL_TRADE_COOLDOWN", 0)),
            cycle_interval: Duration::from_secs(int_var(&lookup, "SLEEP_DURATION", 900).max(1)),
            warmup_interval_minutes: int_var(&lookup, "WARMUP_INTERVAL_MINUTES", 60) as u32,
            max_retry_attempts: int_var(&lookup, "MAX_RETRY_ATTEMPTS", 5).clamp(1, 10) as u32,
            openai_api_key: lookup("OPENAI_API_KEY"),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            pair: self.pair.clone(),
            volume_floor: self.volume_floor,
            profit_threshold_pct: self.profit_threshold_pct,
            price_buffer: self.price_buffer,
            min_trade_volume: self.min_trade_volume,
            trade_cooldown: self.trade_cooldown,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retry_attempts,
            ..RetryPolicy::default()
        }
    }
}

fn float_var(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: f64) -> f64 {
    match lookup(name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                warn!(name, %raw, default, "invalid numeric value, using default");
                default
            }
        },
        None => default,
    }
}

fn int_var(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: u64) -> u64 {
    match lookup(name) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) => value,
            Err(_) => {
                warn!(name, %raw, default, "invalid integer value, using default");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([("API_KEY", "key"), ("API_SECRET", "c2VjcmV0")])
    }

    fn settings_from(vars: HashMap<&'static str, &'static str>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(base_vars()).unwrap();
        assert_eq!(settings.api_domain, DEFAULT_API_DOMAIN);
        assert_eq!(settings.pair, "XBTUSDT");
        assert_eq!(settings.balance_asset, "XBT.F");
        assert_eq!(settings.volume_floor, 100.0);
        assert_eq!(settings.price_buffer, 0.05);
        assert_eq!(settings.trade_cooldown, Duration::ZERO);
        assert_eq!(settings.cycle_interval, Duration::from_secs(900));
        assert_eq!(settings.max_retry_attempts, 5);
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn test_missing_credentials_fatal() {
        let result = settings_from(HashMap::new());
        assert!(matches!(result, Err(ConfigError::MissingVar("API_KEY"))));

        let result = settings_from(HashMap::from([("API_KEY", "key")]));
        assert!(matches!(result, Err(ConfigError::MissingVar("API_SECRET"))));
    }

    #[test]
    fn test_invalid_allocations_fatal() {
        let mut vars = base_vars();
        vars.insert("ALLOC_HODL", "0.9");
        vars.insert("ALLOC_YIELD", "0.3");
        vars.insert("ALLOC_TRADING", "0.2");
        assert!(matches!(
            settings_from(vars),
            Err(ConfigError::InvalidAllocations(_))
        ));
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let mut vars = base_vars();
        vars.insert("VOLUME_FLOOR", "lots");
        vars.insert("SLEEP_DURATION", "-5");
        let settings = settings_from(vars).unwrap();
        assert_eq!(settings.volume_floor, 100.0);
        assert_eq!(settings.cycle_interval, Duration::from_secs(900));
    }

    #[test]
    fn test_overrides_applied() {
        let mut vars = base_vars();
        vars.insert("TRADING_PAIR", "ETHUSDT");
        vars.insert("GLOBAL_TRADE_COOLDOWN", "300");
        vars.insert("MAX_RETRY_ATTEMPTS", "99");
        let settings = settings_from(vars).unwrap();
        assert_eq!(settings.pair, "ETHUSDT");
        assert_eq!(settings.trade_cooldown, Duration::from_secs(300));
        // Retry ceiling is clamped to a sane bound.
        assert_eq!(settings.max_retry_attempts, 10);

        let engine = settings.engine_settings();
        assert_eq!(engine.pair, "ETHUSDT");
        assert_eq!(engine.trade_cooldown, Duration::from_secs(300));
    }
}
