//! OHLCV candle representation.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Describes why this candle cannot be replayed, if it cannot.
    pub fn anomaly(&self) -> Option<String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Some(format!("non-finite price at {}", self.timestamp));
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Some(format!("non-positive price at {}", self.timestamp));
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Some(format!("invalid volume {} at {}", self.volume, self.timestamp));
        }
        if self.high < self.low {
            return Some(format!(
                "high {} below low {} at {}",
                self.high, self.low, self.timestamp
            ));
        }
        for (label, price) in [("open", self.open), ("close", self.close)] {
            if price < self.low || price > self.high {
                return Some(format!(
                    "{} {} outside range {}..{} at {}",
                    label, price, self.low, self.high, self.timestamp
                ));
            }
        }
        None
    }
}

/// Close prices of a candle slice, in order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
