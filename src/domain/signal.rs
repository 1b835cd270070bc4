//! Signal generation: indicator readings to Buy / Sell / Hold.
//!
//! Each configured indicator produces a directional reading. The strategy
//! type maps readings to signals, then the signals are combined by majority
//! vote.

use crate::domain::snapshot::IndicatorSnapshot;
use crate::domain::strategy::{SignalIndicator, StrategyConfig, StrategyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn opposes(self, other: Signal) -> bool {
        matches!(
            (self, other),
            (Signal::Buy, Signal::Sell) | (Signal::Sell, Signal::Buy)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Bullish,
    Bearish,
    Neutral,
}

/// Reading of one indicator at one candle. Undefined values read Neutral.
pub fn reading(
    indicator: SignalIndicator,
    snapshot: &IndicatorSnapshot,
    config: &StrategyConfig,
) -> Reading {
    match indicator {
        SignalIndicator::Rsi => match snapshot.rsi {
            Some(rsi) if rsi <= config.oversold => Reading::Bullish,
            Some(rsi) if rsi >= config.overbought => Reading::Bearish,
            _ => Reading::Neutral,
        },
        SignalIndicator::Macd => sign_reading(snapshot.macd_histogram),
        SignalIndicator::Sma => sign_reading(snapshot.sma.map(|ma| snapshot.close - ma)),
        SignalIndicator::Ema => sign_reading(snapshot.ema.map(|ma| snapshot.close - ma)),
    }
}

fn sign_reading(value: Option<f64>) -> Reading {
    match value {
        Some(v) if v > 0.0 => Reading::Bullish,
        Some(v) if v < 0.0 => Reading::Bearish,
        _ => Reading::Neutral,
    }
}

/// Strategy-type mapping table from reading to signal.
pub fn interpret(strategy_type: StrategyType, reading: Reading) -> Signal {
    match (strategy_type, reading) {
        (_, Reading::Neutral) => Signal::Hold,
        (StrategyType::TrendFollowing, Reading::Bullish) => Signal::Buy,
        (StrategyType::TrendFollowing, Reading::Bearish) => Signal::Sell,
        (StrategyType::MeanReversion, Reading::Bullish) => Signal::Sell,
        (StrategyType::MeanReversion, Reading::Bearish) => Signal::Buy,
    }
}

/// Majority vote among directional signals. Hold votes abstain; a tie
/// between Buy and Sell (including no votes at all) resolves to Hold.
pub fn combine(signals: &[Signal]) -> Signal {
    let buys = signals.iter().filter(|&&s| s == Signal::Buy).count();
    let sells = signals.iter().filter(|&&s| s == Signal::Sell).count();
    match buys.cmp(&sells) {
        std::cmp::Ordering::Greater => Signal::Buy,
        std::cmp::Ordering::Less => Signal::Sell,
        std::cmp::Ordering::Equal => Signal::Hold,
    }
}

pub fn generate(snapshot: &IndicatorSnapshot, config: &StrategyConfig) -> Signal {
    let votes: Vec<Signal> = config
        .indicators
        .iter()
        .map(|&indicator| interpret(config.strategy_type, reading(indicator, snapshot, config)))
        .collect();
    combine(&votes)
}
