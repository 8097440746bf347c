pub mod price_history;
