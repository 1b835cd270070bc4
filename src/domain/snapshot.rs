//! Precomputed indicator series and per-candle snapshots.

use std::collections::HashMap;

use crate::domain::candle::{closes, Candle};
use crate::domain::indicator::{ema, macd, rsi, sma, IndicatorType, MacdSeries};
use crate::domain::strategy::StrategyConfig;

/// Indicator readings available at one candle. `None` during warmup.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub rsi: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub sma: Option<f64>,
    pub ema: Option<f64>,
}

enum Series {
    Simple(Vec<Option<f64>>),
    Macd(MacdSeries),
}

/// All indicator series a strategy needs, computed once per run.
pub struct IndicatorSet {
    closes: Vec<f64>,
    series: HashMap<IndicatorType, Series>,
    config: StrategyConfig,
}

impl IndicatorSet {
    pub fn compute(candles: &[Candle], config: &StrategyConfig) -> Self {
        let closes = closes(candles);
        let series = config
            .indicator_types()
            .into_iter()
            .map(|t| {
                let s = match t {
                    IndicatorType::Sma(period) => Series::Simple(sma(&closes, period)),
                    IndicatorType::Ema(period) => Series::Simple(ema(&closes, period)),
                    IndicatorType::Rsi(period) => Series::Simple(rsi(&closes, period)),
                    IndicatorType::Macd { fast, slow, signal } => {
                        Series::Macd(macd(&closes, fast, slow, signal))
                    }
                };
                (t, s)
            })
            .collect();

        IndicatorSet {
            closes,
            series,
            config: config.clone(),
        }
    }

    /// Longest warmup among the computed indicators.
    pub fn warmup(&self) -> usize {
        self.series.keys().map(IndicatorType::warmup).max().unwrap_or(0)
    }

    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot {
        let c = &self.config;
        IndicatorSnapshot {
            close: self.closes.get(index).copied().unwrap_or(0.0),
            rsi: self.simple(IndicatorType::Rsi(c.rsi_period), index),
            macd_histogram: match self.series.get(&IndicatorType::Macd {
                fast: c.macd_fast,
                slow: c.macd_slow,
                signal: c.macd_signal,
            }) {
                Some(Series::Macd(m)) => m.histogram.get(index).copied().flatten(),
                _ => None,
            },
            sma: self.simple(IndicatorType::Sma(c.ma_period), index),
            ema: self.simple(IndicatorType::Ema(c.ma_period), index),
        }
    }

    fn simple(&self, indicator_type: IndicatorType, index: usize) -> Option<f64> {
        match self.series.get(&indicator_type) {
            Some(Series::Simple(values)) => values.get(index).copied().flatten(),
            _ => None,
        }
    }
}
