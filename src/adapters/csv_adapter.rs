//! CSV candle source.
//!
//! Reads `{symbol}_{timeframe}.csv` from a base directory. Expected columns:
//! `timestamp,open,high,low,close,volume`, where `timestamp` is either
//! `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare `YYYY-MM-DD`.

use crate::domain::candle::Candle;
use crate::domain::error::ReplayError;
use crate::ports::data_port::CandleSource;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

pub struct CsvCandleSource {
    base_path: PathBuf,
}

impl CsvCandleSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_field(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<f64, ReplayError> {
    let raw = record
        .get(index)
        .ok_or_else(|| ReplayError::data(format!("line {}: missing {} column", line, name)))?;
    raw.trim()
        .parse()
        .map_err(|e| ReplayError::data(format!("line {}: invalid {} value '{}': {}", line, name, raw, e)))
}

impl CandleSource for CsvCandleSource {
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Candle>, ReplayError> {
        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| {
            ReplayError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", path.display(), e),
            ))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| ReplayError::data(format!("CSV parse error: {}", e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let ts_str = record
                .get(0)
                .ok_or_else(|| ReplayError::data(format!("line {}: missing timestamp column", line)))?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
                ReplayError::data(format!("line {}: invalid timestamp '{}'", line, ts_str))
            })?;

            let date = timestamp.date();
            if date < start_date || date > end_date {
                continue;
            }

            candles.push(Candle {
                timestamp,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}
