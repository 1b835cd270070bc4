//! Configuration and input validation.
//!
//! Everything here runs before a backtest starts; a run never begins with a
//! config or candle sequence that fails these checks.

use crate::domain::backtest::BacktestConfig;
use crate::domain::candle::Candle;
use crate::domain::error::ReplayError;
use crate::domain::strategy::StrategyConfig;

pub fn validate_strategy_config(config: &StrategyConfig) -> Result<(), ReplayError> {
    validate_name(config)?;
    validate_indicators(config)?;
    validate_periods(config)?;
    validate_thresholds(config)?;
    validate_macd(config)?;
    validate_stop_loss(config)?;
    validate_take_profit(config)?;
    validate_trailing_stop(config)?;
    validate_risk_per_trade(config)?;
    validate_max_positions(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &BacktestConfig) -> Result<(), ReplayError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_periods_per_year(config)?;
    validate_dates(config)?;
    Ok(())
}

/// The candle sequence must be non-empty and strictly increasing in time.
pub fn validate_candles(candles: &[Candle]) -> Result<(), ReplayError> {
    if candles.is_empty() {
        return Err(ReplayError::data("candle sequence is empty"));
    }
    for (i, pair) in candles.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(ReplayError::data(format!(
                "timestamps not strictly increasing at index {}: {} after {}",
                i + 1,
                pair[1].timestamp,
                pair[0].timestamp
            )));
        }
    }
    Ok(())
}

fn validate_name(config: &StrategyConfig) -> Result<(), ReplayError> {
    if config.name.trim().is_empty() {
        return Err(ReplayError::configuration("name", "must not be empty"));
    }
    Ok(())
}

fn validate_indicators(config: &StrategyConfig) -> Result<(), ReplayError> {
    if config.indicators.is_empty() {
        return Err(ReplayError::configuration(
            "indicators",
            "at least one indicator is required",
        ));
    }
    Ok(())
}

fn validate_periods(config: &StrategyConfig) -> Result<(), ReplayError> {
    if config.rsi_period == 0 {
        return Err(ReplayError::configuration("rsi_period", "must be positive"));
    }
    if config.ma_period == 0 {
        return Err(ReplayError::configuration("ma_period", "must be positive"));
    }
    Ok(())
}

fn validate_thresholds(config: &StrategyConfig) -> Result<(), ReplayError> {
    for (field, value) in [
        ("oversold", config.oversold),
        ("overbought", config.overbought),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ReplayError::configuration(
                field,
                format!("must be between 0 and 100, got {}", value),
            ));
        }
    }
    if config.overbought <= config.oversold {
        return Err(ReplayError::configuration(
            "overbought",
            format!(
                "overbought ({}) must be greater than oversold ({})",
                config.overbought, config.oversold
            ),
        ));
    }
    Ok(())
}

fn validate_macd(config: &StrategyConfig) -> Result<(), ReplayError> {
    for (field, value) in [
        ("macd_fast", config.macd_fast),
        ("macd_slow", config.macd_slow),
        ("macd_signal", config.macd_signal),
    ] {
        if value == 0 {
            return Err(ReplayError::configuration(field, "must be positive"));
        }
    }
    if config.macd_fast >= config.macd_slow {
        return Err(ReplayError::configuration(
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &StrategyConfig) -> Result<(), ReplayError> {
    let value = config.stop_loss_pct;
    if !value.is_finite() || !(0.0..100.0).contains(&value) {
        return Err(ReplayError::configuration(
            "stop_loss_pct",
            "must be in [0, 100)",
        ));
    }
    Ok(())
}

fn validate_take_profit(config: &StrategyConfig) -> Result<(), ReplayError> {
    let value = config.take_profit_pct;
    if !value.is_finite() || value < 0.0 {
        return Err(ReplayError::configuration(
            "take_profit_pct",
            "must be non-negative",
        ));
    }
    Ok(())
}

fn validate_trailing_stop(config: &StrategyConfig) -> Result<(), ReplayError> {
    if !config.trailing_stop_enabled {
        return Ok(());
    }
    let activation = config.trailing_stop_activation_pct;
    if !activation.is_finite() || activation < 0.0 {
        return Err(ReplayError::configuration(
            "trailing_stop_activation_pct",
            "must be non-negative",
        ));
    }
    let distance = config.trailing_stop_distance_pct;
    if !distance.is_finite() || distance <= 0.0 || distance >= 100.0 {
        return Err(ReplayError::configuration(
            "trailing_stop_distance_pct",
            "must be in (0, 100)",
        ));
    }
    Ok(())
}

fn validate_risk_per_trade(config: &StrategyConfig) -> Result<(), ReplayError> {
    let value = config.risk_per_trade_pct;
    if !value.is_finite() || value <= 0.0 || value > 100.0 {
        return Err(ReplayError::configuration(
            "risk_per_trade_pct",
            "must be in (0, 100]",
        ));
    }
    Ok(())
}

fn validate_max_positions(config: &StrategyConfig) -> Result<(), ReplayError> {
    if config.max_open_positions == 0 {
        return Err(ReplayError::configuration(
            "max_open_positions",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &BacktestConfig) -> Result<(), ReplayError> {
    let value = config.initial_capital;
    if !value.is_finite() || value <= 0.0 {
        return Err(ReplayError::configuration(
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &BacktestConfig) -> Result<(), ReplayError> {
    let value = config.risk_free_rate;
    if !(0.0..1.0).contains(&value) {
        return Err(ReplayError::configuration(
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_periods_per_year(config: &BacktestConfig) -> Result<(), ReplayError> {
    let value = config.periods_per_year;
    if !value.is_finite() || value <= 0.0 {
        return Err(ReplayError::configuration(
            "periods_per_year",
            "must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &BacktestConfig) -> Result<(), ReplayError> {
    if config.start_date > config.end_date {
        return Err(ReplayError::configuration(
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}
