//! replaytrader: candle-by-candle strategy backtester.
//!
//! The replay engine, indicators and metrics live in [`domain`]; collaborator
//! traits in [`ports`]; CSV, INI and logging implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
