//! Backtest engine and candle replay loop.
//!
//! BacktestConfig defines run-level parameters; `run_backtest` replays an
//! ordered candle sequence strictly in order, one candle at a time.

use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::domain::candle::Candle;
use crate::domain::config_validation::{
    validate_backtest_config, validate_candles, validate_strategy_config,
};
use crate::domain::error::ReplayError;
use crate::domain::metrics::Metrics;
use crate::domain::portfolio::{EquityPoint, Portfolio};
use crate::domain::position::{advance, ClosedTrade, ExitReason, Position, Side, Transition};
use crate::domain::signal::{self, Signal};
use crate::domain::snapshot::IndicatorSet;
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::CandleSource;
use crate::ports::log_port::LogPort;

pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub timeframe: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    /// Annualization factor for Sharpe/Sortino.
    pub periods_per_year: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            symbol: "BTCUSDT".into(),
            timeframe: "1d".into(),
            start_date: NaiveDate::MIN,
            end_date: NaiveDate::MAX,
            initial_capital: 10_000.0,
            risk_free_rate: 0.0,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

/// Cooperative cancellation, checked once per candle.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub cancel: Option<Arc<AtomicBool>>,
    pub deadline: Option<Instant>,
}

impl RunControl {
    pub fn none() -> Self {
        RunControl::default()
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn check(&self) -> Option<AbortReason> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Some(AbortReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(AbortReason::DeadlineExceeded);
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Cancelled,
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub final_balance: f64,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
    /// Positions left open. Always empty for a completed run.
    pub open_positions: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(BacktestResult),
    Aborted {
        partial: BacktestResult,
        processed: usize,
        reason: AbortReason,
    },
    Failed {
        error: String,
        processed: usize,
    },
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        match self {
            RunOutcome::Completed(_) => RunStatus::Completed,
            RunOutcome::Aborted { .. } => RunStatus::Aborted,
            RunOutcome::Failed { .. } => RunStatus::Failed,
        }
    }

    /// The completed result, if the run finished.
    pub fn completed(&self) -> Option<&BacktestResult> {
        match self {
            RunOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn into_completed(self) -> Option<BacktestResult> {
        match self {
            RunOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }
}

/// Replay `candles` through `strategy`.
///
/// Configuration and candle-sequence problems are returned as `Err` before
/// any candle is processed. Once replay starts, a malformed candle yields
/// `RunOutcome::Failed` and cancellation yields `RunOutcome::Aborted`.
pub fn run_backtest(
    candles: &[Candle],
    strategy: &StrategyConfig,
    config: &BacktestConfig,
    control: &RunControl,
    log: &dyn LogPort,
) -> Result<RunOutcome, ReplayError> {
    validate_strategy_config(strategy)?;
    validate_backtest_config(config)?;
    validate_candles(candles)?;

    let indicators = IndicatorSet::compute(candles, strategy);
    log.info(&format!(
        "running '{}' ({}) on {} {}: {} candles, warmup {}",
        strategy.name,
        strategy.strategy_type,
        config.symbol,
        config.timeframe,
        candles.len(),
        indicators.warmup()
    ));
    let mut portfolio = Portfolio::new(config.initial_capital);

    for (i, candle) in candles.iter().enumerate() {
        if let Some(reason) = control.check() {
            log.warn(&format!(
                "run '{}' aborted ({:?}) after {} candles",
                strategy.name, reason, i
            ));
            return Ok(RunOutcome::Aborted {
                partial: finish(portfolio, config),
                processed: i,
                reason,
            });
        }

        if let Some(anomaly) = candle.anomaly() {
            log.warn(&format!("run '{}' failed: {}", strategy.name, anomaly));
            return Ok(RunOutcome::Failed {
                error: anomaly,
                processed: i,
            });
        }

        let equity = portfolio.mark_to_market(candle.close);
        portfolio.record_equity(candle.timestamp, equity);

        let signal = signal::generate(&indicators.snapshot(i), strategy);
        process_candle(&mut portfolio, candle, signal, strategy, log);
    }

    if let Some(last) = candles.last() {
        for position in portfolio.take_positions() {
            let trade = position.close(last.close, last.timestamp, ExitReason::ForcedEndOfData);
            log_exit(log, &trade);
            portfolio.record_trade(trade);
        }
    }

    let result = finish(portfolio, config);
    log.info(&format!(
        "run '{}' completed: {} trades, final balance {:.2}",
        strategy.name,
        result.trades.len(),
        result.final_balance
    ));
    Ok(RunOutcome::Completed(result))
}

/// Fetch the configured symbol, timeframe and date range from `source`, then
/// replay it with [`run_backtest`].
pub fn run_backtest_from_source(
    source: &dyn CandleSource,
    strategy: &StrategyConfig,
    config: &BacktestConfig,
    control: &RunControl,
    log: &dyn LogPort,
) -> Result<RunOutcome, ReplayError> {
    let candles = source.fetch_candles(
        &config.symbol,
        &config.timeframe,
        config.start_date,
        config.end_date,
    )?;
    log.debug(&format!(
        "fetched {} candles for {} {}",
        candles.len(),
        config.symbol,
        config.timeframe
    ));
    run_backtest(&candles, strategy, config, control, log)
}

/// Advance open positions, then consider an entry if there was room at the
/// start of the candle and nothing exited on it.
fn process_candle(
    portfolio: &mut Portfolio,
    candle: &Candle,
    signal: Signal,
    strategy: &StrategyConfig,
    log: &dyn LogPort,
) {
    let open_at_start = portfolio.position_count();
    let mut exited = false;

    for position in portfolio.take_positions() {
        match advance(position, candle, signal, strategy) {
            Transition::Held(p) => portfolio.add_position(p),
            Transition::Closed(trade) => {
                log_exit(log, &trade);
                portfolio.record_trade(trade);
                exited = true;
            }
        }
    }

    if exited || open_at_start >= strategy.max_open_positions {
        return;
    }

    let Some(side) = Side::from_signal(signal) else {
        return;
    };
    if side == Side::Short && !strategy.allow_shorting {
        return;
    }
    if portfolio.positions.iter().any(|p| p.side != side) {
        return;
    }

    if let Some(position) = Position::open(side, candle, portfolio.balance, strategy) {
        log.debug(&format!(
            "enter {:?} {:.6} @ {:.4} at {}",
            position.side, position.quantity, position.entry_price, position.entry_time
        ));
        portfolio.add_position(position);
    }
}

fn log_exit(log: &dyn LogPort, trade: &ClosedTrade) {
    log.debug(&format!(
        "exit {:?} @ {:.4} at {} ({}) after {}h, pnl {:.4}",
        trade.side,
        trade.exit_price,
        trade.exit_time,
        trade.exit_reason,
        trade.holding_period().num_hours(),
        trade.realized_pnl
    ));
}

fn finish(portfolio: Portfolio, config: &BacktestConfig) -> BacktestResult {
    let metrics = Metrics::compute(
        &portfolio.closed_trades,
        &portfolio.equity_curve,
        config.initial_capital,
        config.risk_free_rate,
        config.periods_per_year,
    );
    BacktestResult {
        final_balance: portfolio.balance,
        trades: portfolio.closed_trades,
        equity_curve: portfolio.equity_curve,
        metrics,
        open_positions: portfolio.positions,
    }
}
