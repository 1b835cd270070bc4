//! Historical candle provider port.

use crate::domain::candle::Candle;
use crate::domain::error::ReplayError;
use chrono::NaiveDate;

/// Supplies an ordered, gap-free candle sequence for a symbol and timeframe.
/// Resampling and gap-filling are the provider's job.
pub trait CandleSource {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, ReplayError>;
}
