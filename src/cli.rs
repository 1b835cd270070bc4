//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crate::adapters::csv_adapter::CsvCandleSource;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_adapter::LogCrateAdapter;
use crate::domain::backtest::{
    run_backtest_from_source, BacktestConfig, BacktestResult, RunControl, RunOutcome,
    DEFAULT_PERIODS_PER_YEAR,
};
use crate::domain::batch::{run_batch, BatchJob};
use crate::domain::candle::Candle;
use crate::domain::config_validation::validate_strategy_config;
use crate::domain::correlation::correlation_matrix;
use crate::domain::error::ReplayError;
use crate::domain::metrics::{equity_returns, Metrics};
use crate::domain::strategy::{SignalIndicator, StrategyConfig, StrategyType};
use crate::domain::sweep::{run_sweep, ParamGrid};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::CandleSource;
use crate::ports::log_port::LogPort;

/// Exit code for a run stopped by its deadline.
const EXIT_ABORTED: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "replaytrader", about = "Candle replay backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding {symbol}_{timeframe}.csv files
        #[arg(short, long)]
        data: PathBuf,
        /// Strategy INI; defaults to the [strategy] section of --config
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
        /// Abort the run after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Correlate the equity returns of several strategies on the same data
    Correlate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long, num_args = 2.., required = true)]
        strategy: Vec<PathBuf>,
    },
    /// Sweep RSI period, stop loss and take profit; rank by Sharpe
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        rsi_periods: Vec<usize>,
        #[arg(long, value_delimiter = ',')]
        stop_losses: Vec<f64>,
        #[arg(long, value_delimiter = ',')]
        take_profits: Vec<f64>,
        /// Rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let log = LogCrateAdapter;
    match cli.command {
        Command::Backtest {
            config,
            data,
            strategy,
            symbol,
            timeframe,
            timeout_secs,
        } => run_backtest_command(
            &config,
            &data,
            strategy.as_ref(),
            symbol.as_deref(),
            timeframe.as_deref(),
            timeout_secs,
            &log,
        ),
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Correlate {
            config,
            data,
            strategy,
        } => run_correlate(&config, &data, &strategy, &log),
        Command::Sweep {
            config,
            data,
            strategy,
            rsi_periods,
            stop_losses,
            take_profits,
            top,
        } => {
            let grid = ParamGrid {
                rsi_periods,
                stop_loss_pcts: stop_losses,
                take_profit_pcts: take_profits,
            };
            run_sweep_command(&config, &data, strategy.as_ref(), &grid, top, &log)
        }
    }
}

fn fail(err: &ReplayError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Strategy from `strategy_path` if given, otherwise from the main config.
fn load_strategy(
    adapter: &FileConfigAdapter,
    strategy_path: Option<&PathBuf>,
) -> Result<StrategyConfig, ExitCode> {
    let strategy = match strategy_path {
        Some(path) => {
            eprintln!("Loading strategy from {}", path.display());
            build_strategy_config(&load_config(path)?)
        }
        None => build_strategy_config(adapter),
    };
    strategy.map_err(|e| fail(&e))
}

fn parse_date(adapter: &dyn ConfigPort, key: &str) -> Result<NaiveDate, ReplayError> {
    let value = adapter
        .get_string("backtest", key)
        .ok_or_else(|| ReplayError::ConfigMissing {
            section: "backtest".into(),
            key: key.into(),
        })?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ReplayError::configuration(key, "invalid date format (expected YYYY-MM-DD)")
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, ReplayError> {
    let start_date = parse_date(adapter, "start_date")?;
    let end_date = parse_date(adapter, "end_date")?;
    let defaults = BacktestConfig::default();

    Ok(BacktestConfig {
        symbol: adapter
            .get_string("backtest", "symbol")
            .unwrap_or(defaults.symbol),
        timeframe: adapter
            .get_string("backtest", "timeframe")
            .unwrap_or(defaults.timeframe),
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", defaults.risk_free_rate),
        periods_per_year: adapter.get_double(
            "backtest",
            "periods_per_year",
            DEFAULT_PERIODS_PER_YEAR,
        ),
    })
}

fn get_period(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, ReplayError> {
    let value = adapter.get_int("strategy", key, default as i64);
    usize::try_from(value)
        .map_err(|_| ReplayError::configuration(key, format!("must be non-negative, got {}", value)))
}

pub fn build_strategy_config(adapter: &dyn ConfigPort) -> Result<StrategyConfig, ReplayError> {
    let d = StrategyConfig::default();

    let strategy_type = match adapter.get_string("strategy", "strategy_type") {
        Some(s) => StrategyType::parse(&s).ok_or_else(|| {
            ReplayError::configuration("strategy_type", format!("unknown strategy type '{}'", s))
        })?,
        None => d.strategy_type,
    };
    let indicators = match adapter.get_string("strategy", "indicators") {
        Some(s) => SignalIndicator::parse_list(&s)
            .map_err(|reason| ReplayError::configuration("indicators", reason))?,
        None => d.indicators.clone(),
    };

    Ok(StrategyConfig {
        name: adapter.get_string("strategy", "name").unwrap_or(d.name),
        strategy_type,
        indicators,
        rsi_period: get_period(adapter, "rsi_period", d.rsi_period)?,
        overbought: adapter.get_double("strategy", "overbought", d.overbought),
        oversold: adapter.get_double("strategy", "oversold", d.oversold),
        macd_fast: get_period(adapter, "macd_fast", d.macd_fast)?,
        macd_slow: get_period(adapter, "macd_slow", d.macd_slow)?,
        macd_signal: get_period(adapter, "macd_signal", d.macd_signal)?,
        ma_period: get_period(adapter, "ma_period", d.ma_period)?,
        stop_loss_pct: adapter.get_double("strategy", "stop_loss_pct", d.stop_loss_pct),
        take_profit_pct: adapter.get_double("strategy", "take_profit_pct", d.take_profit_pct),
        trailing_stop_enabled: adapter.get_bool(
            "strategy",
            "trailing_stop_enabled",
            d.trailing_stop_enabled,
        ),
        trailing_stop_activation_pct: adapter.get_double(
            "strategy",
            "trailing_stop_activation_pct",
            d.trailing_stop_activation_pct,
        ),
        trailing_stop_distance_pct: adapter.get_double(
            "strategy",
            "trailing_stop_distance_pct",
            d.trailing_stop_distance_pct,
        ),
        risk_per_trade_pct: adapter.get_double("strategy", "risk_per_trade_pct", d.risk_per_trade_pct),
        max_open_positions: get_period(adapter, "max_open_positions", d.max_open_positions)?,
        allow_shorting: adapter.get_bool("strategy", "allow_shorting", d.allow_shorting),
    })
}

fn run_backtest_command(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    strategy_path: Option<&PathBuf>,
    symbol_override: Option<&str>,
    timeframe_override: Option<&str>,
    timeout_secs: Option<u64>,
    log: &dyn LogPort,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Some(symbol) = symbol_override {
        bt_config.symbol = symbol.to_string();
    }
    if let Some(timeframe) = timeframe_override {
        bt_config.timeframe = timeframe.to_string();
    }
    let strategy = match load_strategy(&adapter, strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut control = RunControl::none();
    if let Some(secs) = timeout_secs {
        control = control.with_deadline(Instant::now() + Duration::from_secs(secs));
    }

    let source = CsvCandleSource::new(data_dir.clone());
    run_backtest_pipeline(&source, &strategy, &bt_config, &control, log)
}

/// Fetch candles, run one backtest and print its summary.
pub fn run_backtest_pipeline(
    source: &dyn CandleSource,
    strategy: &StrategyConfig,
    bt_config: &BacktestConfig,
    control: &RunControl,
    log: &dyn LogPort,
) -> ExitCode {
    eprintln!(
        "Running '{}' on {} {}, {} to {}",
        strategy.name,
        bt_config.symbol,
        bt_config.timeframe,
        bt_config.start_date,
        bt_config.end_date,
    );

    match run_backtest_from_source(source, strategy, bt_config, control, log) {
        Ok(RunOutcome::Completed(result)) => {
            print_summary(&result, bt_config.initial_capital);
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Aborted {
            partial,
            processed,
            reason,
        }) => {
            eprintln!("Run aborted ({:?}) after {} candles", reason, processed);
            print_summary(&partial, bt_config.initial_capital);
            ExitCode::from(EXIT_ABORTED)
        }
        Ok(RunOutcome::Failed { error, processed }) => {
            eprintln!("error: run failed at candle {}: {}", processed, error);
            ExitCode::from(5)
        }
        Err(e) => fail(&e),
    }
}

pub fn print_summary(result: &BacktestResult, initial_capital: f64) {
    let m: &Metrics = &result.metrics;
    eprintln!("\n=== Results ===");
    eprintln!("Initial Capital:  {:.2}", initial_capital);
    eprintln!("Final Balance:    {:.2}", result.final_balance);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown_pct);
    eprintln!(
        "Total Trades:     {} ({} won, {} lost, {} even)",
        m.total_trades, m.winning_trades, m.losing_trades, m.breakeven_trades
    );
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Avg Win / Loss:   {:.2} / {:.2}", m.avg_win, m.avg_loss);
    if !result.open_positions.is_empty() {
        eprintln!("Open Positions:   {}", result.open_positions.len());
    }
}

fn run_validate(strategy_path: &PathBuf) -> ExitCode {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = match load_config(strategy_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if let Err(e) = validate_strategy_config(&strategy) {
        return fail(&e);
    }

    let indicators: Vec<String> = strategy
        .indicator_types()
        .iter()
        .map(|t| t.to_string())
        .collect();
    eprintln!("\nName:        {}", strategy.name);
    eprintln!("Type:        {}", strategy.strategy_type);
    eprintln!("Indicators:  {}", indicators.join(", "));
    eprintln!(
        "Exits:       stop {}%, target {}%, trailing {}",
        strategy.stop_loss_pct,
        strategy.take_profit_pct,
        if strategy.trailing_stop_enabled {
            format!(
                "{}% after {}%",
                strategy.trailing_stop_distance_pct, strategy.trailing_stop_activation_pct
            )
        } else {
            "off".to_string()
        }
    );
    eprintln!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}

fn fetch_for(
    source: &dyn CandleSource,
    bt_config: &BacktestConfig,
) -> Result<Vec<Candle>, ExitCode> {
    source
        .fetch_candles(
            &bt_config.symbol,
            &bt_config.timeframe,
            bt_config.start_date,
            bt_config.end_date,
        )
        .map_err(|e| fail(&e))
}

fn run_correlate(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    strategy_paths: &[PathBuf],
    log: &dyn LogPort,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let mut strategies = Vec::with_capacity(strategy_paths.len());
    for path in strategy_paths {
        match load_strategy(&adapter, Some(path)) {
            Ok(s) => strategies.push(s),
            Err(code) => return code,
        }
    }

    let source = CsvCandleSource::new(data_dir.clone());
    let candles = match fetch_for(&source, &bt_config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let jobs: Vec<BatchJob<'_>> = strategies
        .into_iter()
        .map(|strategy| BatchJob {
            label: strategy.name.clone(),
            candles: &candles,
            strategy,
            config: bt_config.clone(),
        })
        .collect();

    let mut labels = Vec::new();
    let mut series = Vec::new();
    for entry in run_batch(&jobs, &RunControl::none(), log) {
        match &entry.outcome {
            Ok(outcome) => match outcome.completed() {
                Some(result) => {
                    series.push(equity_returns(&result.equity_curve));
                    labels.push(entry.label);
                }
                None => eprintln!("warning: skipping '{}' ({:?})", entry.label, outcome.status()),
            },
            Err(e) => eprintln!("warning: skipping '{}' ({})", entry.label, e),
        }
    }

    if series.len() < 2 {
        eprintln!("error: need at least two completed runs to correlate");
        return ExitCode::from(5);
    }

    let matrix = match correlation_matrix(&series) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };

    eprintln!("\n=== Return Correlation ===");
    for (i, row) in matrix.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|c| format!("{:>6.3}", c)).collect();
        eprintln!("{:<24} {}", labels[i], cells.join(" "));
    }
    ExitCode::SUCCESS
}

fn run_sweep_command(
    config_path: &PathBuf,
    data_dir: &PathBuf,
    strategy_path: Option<&PathBuf>,
    grid: &ParamGrid,
    top: usize,
    log: &dyn LogPort,
) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let base = match load_strategy(&adapter, strategy_path) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let source = CsvCandleSource::new(data_dir.clone());
    let candles = match fetch_for(&source, &bt_config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("Sweeping {} configurations", grid.size());
    let results = run_sweep(grid, &base, &candles, &bt_config, &RunControl::none(), log);

    eprintln!("\n=== Top {} by Sharpe ===", top.min(results.ranked.len()));
    for row in results.ranked.iter().take(top) {
        eprintln!(
            "{:<40} sharpe {:>7.2}  return {:>7.2}%  dd {:>5.1}%  trades {}",
            row.strategy.name,
            row.metrics.sharpe_ratio,
            row.metrics.total_return_pct,
            row.metrics.max_drawdown_pct,
            row.metrics.total_trades,
        );
    }
    if !results.skipped.is_empty() {
        eprintln!("\n{} configurations did not complete", results.skipped.len());
    }

    match results.best() {
        Some(best) => {
            eprintln!(
                "\nBest: rsi_period {}, stop {}%, target {}% (final balance {:.2})",
                best.strategy.rsi_period,
                best.strategy.stop_loss_pct,
                best.strategy.take_profit_pct,
                best.final_balance
            );
            ExitCode::SUCCESS
        }
        None => ExitCode::from(5),
    }
}
