pub mod engine;
pub mod indicators;
pub mod oracle;
pub mod portfolio;
pub mod position;
pub mod sentiment;
