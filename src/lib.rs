//! Mawimbi: single-pair spot trading bot for the Kraken REST API.
//!
//! Each cycle polls market state, derives technical signals, and pushes them
//! through a sentiment-gated decision engine that may place one limit order.

pub mod config;
pub mod domain;
pub mod infrastructure;
