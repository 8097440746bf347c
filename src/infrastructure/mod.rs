pub mod kraken;
pub mod openai_oracle;
pub mod signing;
