#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use replaytrader::domain::backtest::BacktestConfig;
use replaytrader::domain::candle::Candle;
use replaytrader::domain::error::ReplayError;
use replaytrader::domain::strategy::{SignalIndicator, StrategyConfig, StrategyType};
use replaytrader::ports::data_port::CandleSource;
use replaytrader::ports::log_port::{LogLevel, LogPort};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockCandleSource {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl CandleSource for MockCandleSource {
    fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, ReplayError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ReplayError::data(reason.clone()));
        }
        Ok(self
            .data
            .get(symbol)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| {
                        let d = c.timestamp.date();
                        d >= start_date && d <= end_date
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Captures every log line for assertions.
#[derive(Default)]
pub struct RecordingLog {
    pub lines: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(_, m)| m.contains(needle))
    }
}

impl LogPort for RecordingLog {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(i: usize) -> NaiveDateTime {
    date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap() + chrono::Duration::days(i as i64)
}

pub fn make_candle(i: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: day(i),
        open,
        high,
        low,
        close,
        volume: 1_000.0,
    }
}

/// Candles whose open/high/low equal the close.
pub fn flat_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i, c, c, c, c))
        .collect()
}

/// A deterministic oscillating series with a mild upward drift.
pub fn wave_candles(count: usize, start_price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = start_price + (t * 0.35).sin() * start_price * 0.05 + t * 0.05;
            make_candle(i, close, close * 1.01, close * 0.99, close)
        })
        .collect()
}

/// Trend-following on close vs SMA(2): buys up-moves, sells down-moves.
pub fn sma_trend_strategy() -> StrategyConfig {
    StrategyConfig {
        name: "SMA2 Trend".into(),
        strategy_type: StrategyType::TrendFollowing,
        indicators: vec![SignalIndicator::Sma],
        ma_period: 2,
        stop_loss_pct: 0.0,
        take_profit_pct: 0.0,
        risk_per_trade_pct: 50.0,
        allow_shorting: false,
        ..StrategyConfig::default()
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        symbol: "BTCUSDT".into(),
        timeframe: "1d".into(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        initial_capital: 1_000.0,
        risk_free_rate: 0.0,
        periods_per_year: 252.0,
    }
}
