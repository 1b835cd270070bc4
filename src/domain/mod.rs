//! Replay engine, indicators and metrics.

pub mod candle;
pub mod indicator;
pub mod snapshot;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod portfolio;
pub mod backtest;
pub mod metrics;
pub mod correlation;
pub mod batch;
pub mod sweep;
pub mod config_validation;
pub mod error;
