//! Technical indicator implementations.
//!
//! Every function takes a price series and returns one entry per input price.
//! Entries inside the warmup window are `None`. All functions are pure.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::ema;
pub use macd::{macd, MacdSeries, DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
pub use rsi::{rsi, DEFAULT_PERIOD as DEFAULT_RSI_PERIOD};
pub use sma::sma;

use std::fmt;

/// Indicator identity plus parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    /// Index of the first defined value for this indicator.
    pub fn warmup(&self) -> usize {
        match *self {
            IndicatorType::Sma(period) | IndicatorType::Ema(period) => period.saturating_sub(1),
            IndicatorType::Rsi(period) => period,
            IndicatorType::Macd { fast, slow, signal } => {
                fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
            }
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
