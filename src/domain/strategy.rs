//! Strategy configuration.

use std::fmt;

use crate::domain::indicator::{
    IndicatorType, DEFAULT_FAST, DEFAULT_RSI_PERIOD, DEFAULT_SIGNAL, DEFAULT_SLOW,
};

/// How a strategy interprets a bullish indicator reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    /// Follow the reading: bullish means Buy.
    TrendFollowing,
    /// Fade the reading: bullish means Sell.
    MeanReversion,
}

impl StrategyType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "trend_following" | "trend" => Some(StrategyType::TrendFollowing),
            "mean_reversion" | "reversion" => Some(StrategyType::MeanReversion),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyType::TrendFollowing => write!(f, "trend_following"),
            StrategyType::MeanReversion => write!(f, "mean_reversion"),
        }
    }
}

/// An indicator that casts a vote in the signal generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalIndicator {
    Rsi,
    Macd,
    Sma,
    Ema,
}

impl SignalIndicator {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rsi" => Some(SignalIndicator::Rsi),
            "macd" => Some(SignalIndicator::Macd),
            "sma" => Some(SignalIndicator::Sma),
            "ema" => Some(SignalIndicator::Ema),
            _ => None,
        }
    }

    /// Parse a comma-separated list such as `rsi, macd`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Self::parse(part).ok_or_else(|| format!("unknown indicator '{}'", part)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub strategy_type: StrategyType,
    pub indicators: Vec<SignalIndicator>,
    pub rsi_period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ma_period: usize,
    /// Percent below (long) or above (short) entry; 0 disables.
    pub stop_loss_pct: f64,
    /// Percent above (long) or below (short) entry; 0 disables.
    pub take_profit_pct: f64,
    pub trailing_stop_enabled: bool,
    pub trailing_stop_activation_pct: f64,
    pub trailing_stop_distance_pct: f64,
    /// Percent of the realized balance committed as notional per entry.
    pub risk_per_trade_pct: f64,
    pub max_open_positions: usize,
    pub allow_shorting: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            name: "Unnamed".into(),
            strategy_type: StrategyType::TrendFollowing,
            indicators: vec![SignalIndicator::Rsi],
            rsi_period: DEFAULT_RSI_PERIOD,
            overbought: 70.0,
            oversold: 30.0,
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            ma_period: 20,
            stop_loss_pct: 2.0,
            take_profit_pct: 4.0,
            trailing_stop_enabled: false,
            trailing_stop_activation_pct: 1.0,
            trailing_stop_distance_pct: 1.0,
            risk_per_trade_pct: 10.0,
            max_open_positions: 1,
            allow_shorting: true,
        }
    }
}

impl StrategyConfig {
    /// The indicator series this strategy needs computed.
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        let mut types: Vec<IndicatorType> = self
            .indicators
            .iter()
            .map(|indicator| match indicator {
                SignalIndicator::Rsi => IndicatorType::Rsi(self.rsi_period),
                SignalIndicator::Macd => IndicatorType::Macd {
                    fast: self.macd_fast,
                    slow: self.macd_slow,
                    signal: self.macd_signal,
                },
                SignalIndicator::Sma => IndicatorType::Sma(self.ma_period),
                SignalIndicator::Ema => IndicatorType::Ema(self.ma_period),
            })
            .collect();
        types.dedup();
        types
    }
}
