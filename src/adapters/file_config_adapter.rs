//! INI file configuration adapter.

use crate::domain::error::ReplayError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| ReplayError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ReplayError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ReplayError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[backtest]
symbol = ETHUSDT
timeframe = 4h
initial_capital = 25000.5
periods_per_year = 2190

[strategy]
name = RSI Fade
strategy_type = mean_reversion
indicators = rsi, macd
rsi_period = 9
trailing_stop_enabled = yes
"#;

    #[test]
    fn from_string_reads_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("backtest", "symbol"), Some("ETHUSDT".to_string()));
        assert_eq!(
            adapter.get_string("strategy", "indicators"),
            Some("rsi, macd".to_string())
        );
        assert_eq!(adapter.get_int("strategy", "rsi_period", 14), 9);
        assert_eq!(adapter.get_double("backtest", "initial_capital", 0.0), 25000.5);
        assert!(adapter.get_bool("strategy", "trailing_stop_enabled", false));
    }

    #[test]
    fn missing_keys_fall_back() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert_eq!(adapter.get_int("strategy", "missing", 42), 42);
        assert_eq!(adapter.get_double("backtest", "missing", 99.9), 99.9);
        assert!(adapter.get_bool("strategy", "missing", true));
    }

    #[test]
    fn non_numeric_values_fall_back() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nrsi_period = abc\noversold = low\n").unwrap();
        assert_eq!(adapter.get_int("strategy", "rsi_period", 14), 14);
        assert_eq!(adapter.get_double("strategy", "oversold", 30.0), 30.0);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[s]\na = true\nb = YES\nc = 1\nd = off\ne = no\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("s", "a", false));
        assert!(adapter.get_bool("s", "b", false));
        assert!(adapter.get_bool("s", "c", false));
        assert!(!adapter.get_bool("s", "d", true));
        assert!(!adapter.get_bool("s", "e", true));
        assert!(adapter.get_bool("s", "f", true));
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[strategy]\nname = From File\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("strategy", "name"),
            Some("From File".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, ReplayError::ConfigParse { .. }));
    }
}
