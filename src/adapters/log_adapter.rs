//! Logger port implementations.

use crate::ports::log_port::{LogLevel, LogPort};

/// Forwards to the `log` facade under the `replaytrader` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCrateAdapter;

impl LogPort for LogCrateAdapter {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => log::debug!(target: "replaytrader", "{}", message),
            LogLevel::Info => log::info!(target: "replaytrader", "{}", message),
            LogLevel::Warn => log::warn!(target: "replaytrader", "{}", message),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl LogPort for NullLog {
    fn log(&self, _level: LogLevel, _message: &str) {}
}
