//! Domain error types.

/// Top-level error type for replaytrader.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("invalid configuration {field}: {reason}")]
    Configuration { field: String, reason: String },

    #[error("invalid data: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("series length mismatch: {left} vs {right}")]
    SeriesLengthMismatch { left: usize, right: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReplayError {
    pub fn configuration(field: &str, reason: impl Into<String>) -> Self {
        ReplayError::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        ReplayError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&ReplayError> for std::process::ExitCode {
    fn from(err: &ReplayError) -> Self {
        let code: u8 = match err {
            ReplayError::Io(_) => 1,
            ReplayError::Configuration { .. }
            | ReplayError::ConfigParse { .. }
            | ReplayError::ConfigMissing { .. } => 2,
            ReplayError::Data { .. } | ReplayError::SeriesLengthMismatch { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_display() {
        let err = ReplayError::configuration("rsi_period", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid configuration rsi_period: must be positive"
        );
    }

    #[test]
    fn data_display() {
        let err = ReplayError::data("candle sequence is empty");
        assert_eq!(err.to_string(), "invalid data: candle sequence is empty");
    }

    #[test]
    fn config_missing_display() {
        let err = ReplayError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        };
        assert_eq!(err.to_string(), "missing config key [backtest] symbol");
    }
}
