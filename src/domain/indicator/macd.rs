//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is defined from slow-1, signal and histogram from
//! slow-1 + signal-1.

use crate::domain::indicator::ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    fn undefined(len: usize) -> Self {
        MacdSeries {
            line: vec![None; len],
            signal: vec![None; len],
            histogram: vec![None; len],
        }
    }
}

pub fn macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries::undefined(prices.len());
    }

    let ema_fast = ema(prices, fast);
    let ema_slow = ema(prices, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // The signal EMA runs over the defined tail of the line only.
    let line_start = fast.max(slow) - 1;
    let mut signal = vec![None; prices.len()];
    if prices.len() > line_start {
        let defined: Vec<f64> = line[line_start..].iter().flatten().copied().collect();
        for (offset, value) in ema(&defined, signal_period).into_iter().enumerate() {
            signal[line_start + offset] = value;
        }
    }

    let histogram = line
        .iter()
        .zip(signal.iter())
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}
