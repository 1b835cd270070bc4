//! Parameter grid sweep over strategy settings.

use crate::domain::backtest::{BacktestConfig, RunControl, RunOutcome};
use crate::domain::batch::{run_batch, BatchEntry, BatchJob};
use crate::domain::candle::Candle;
use crate::domain::metrics::Metrics;
use crate::domain::strategy::StrategyConfig;
use crate::ports::log_port::LogPort;

/// Values to sweep. An empty list keeps the base config's value.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    pub rsi_periods: Vec<usize>,
    pub stop_loss_pcts: Vec<f64>,
    pub take_profit_pcts: Vec<f64>,
}

impl ParamGrid {
    pub fn size(&self) -> usize {
        self.rsi_periods.len().max(1)
            * self.stop_loss_pcts.len().max(1)
            * self.take_profit_pcts.len().max(1)
    }

    /// Every combination, each named after its parameters.
    pub fn generate_configs(&self, base: &StrategyConfig) -> Vec<StrategyConfig> {
        let rsi_periods = or_base(&self.rsi_periods, base.rsi_period);
        let stop_losses = or_base(&self.stop_loss_pcts, base.stop_loss_pct);
        let take_profits = or_base(&self.take_profit_pcts, base.take_profit_pct);

        let mut configs = Vec::with_capacity(self.size());
        for &rsi_period in &rsi_periods {
            for &stop_loss_pct in &stop_losses {
                for &take_profit_pct in &take_profits {
                    configs.push(StrategyConfig {
                        name: format!(
                            "{} rsi={} sl={} tp={}",
                            base.name, rsi_period, stop_loss_pct, take_profit_pct
                        ),
                        rsi_period,
                        stop_loss_pct,
                        take_profit_pct,
                        ..base.clone()
                    });
                }
            }
        }
        configs
    }
}

fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

#[derive(Debug, Clone)]
pub struct SweepRow {
    pub strategy: StrategyConfig,
    pub metrics: Metrics,
    pub final_balance: f64,
}

#[derive(Debug)]
pub struct SweepResults {
    /// Completed runs, best Sharpe first.
    pub ranked: Vec<SweepRow>,
    /// Runs that were rejected, aborted, or failed.
    pub skipped: Vec<BatchEntry>,
}

impl SweepResults {
    pub fn best(&self) -> Option<&SweepRow> {
        self.ranked.first()
    }
}

/// Run the whole grid over one candle sequence and rank by Sharpe ratio.
pub fn run_sweep(
    grid: &ParamGrid,
    base: &StrategyConfig,
    candles: &[Candle],
    config: &BacktestConfig,
    control: &RunControl,
    log: &dyn LogPort,
) -> SweepResults {
    let jobs: Vec<BatchJob<'_>> = grid
        .generate_configs(base)
        .into_iter()
        .map(|strategy| BatchJob {
            label: strategy.name.clone(),
            candles,
            strategy,
            config: config.clone(),
        })
        .collect();

    let mut ranked = Vec::new();
    let mut skipped = Vec::new();
    for entry in run_batch(&jobs, control, log) {
        match entry.outcome {
            Ok(RunOutcome::Completed(result)) => ranked.push(SweepRow {
                strategy: entry.strategy,
                metrics: result.metrics,
                final_balance: result.final_balance,
            }),
            _ => skipped.push(entry),
        }
    }

    ranked.sort_by(|a, b| b.metrics.sharpe_ratio.total_cmp(&a.metrics.sharpe_ratio));
    SweepResults { ranked, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_adapter::NullLog;
    use chrono::NaiveDate;

    #[test]
    fn grid_size_and_configs() {
        let grid = ParamGrid {
            rsi_periods: vec![7, 14],
            stop_loss_pcts: vec![1.0, 2.0, 3.0],
            take_profit_pcts: vec![],
        };
        let base = StrategyConfig::default();
        let configs = grid.generate_configs(&base);

        assert_eq!(grid.size(), 6);
        assert_eq!(configs.len(), 6);
        assert!(configs.iter().all(|c| c.take_profit_pct == base.take_profit_pct));
        assert_eq!(configs[0].rsi_period, 7);
        assert_eq!(configs[0].stop_loss_pct, 1.0);
        assert_eq!(configs[5].rsi_period, 14);
        assert_eq!(configs[5].stop_loss_pct, 3.0);
        assert!(configs[0].name.contains("rsi=7"));
    }

    #[test]
    fn empty_grid_is_base_config() {
        let base = StrategyConfig::default();
        let configs = ParamGrid::default().generate_configs(&base);
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].rsi_period, base.rsi_period);
    }

    #[test]
    fn ranked_by_sharpe_descending() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let candles: Vec<Candle> = (0..80)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.4).sin() * 8.0 + i as f64 * 0.1;
                Candle {
                    timestamp: start + chrono::Duration::days(i),
                    open: close,
                    high: close + 1.5,
                    low: close - 1.5,
                    close,
                    volume: 1.0,
                }
            })
            .collect();

        let grid = ParamGrid {
            rsi_periods: vec![3, 5, 0],
            stop_loss_pcts: vec![2.0],
            take_profit_pcts: vec![4.0],
        };
        let results = run_sweep(
            &grid,
            &StrategyConfig::default(),
            &candles,
            &BacktestConfig::default(),
            &RunControl::none(),
            &NullLog,
        );

        assert_eq!(results.ranked.len(), 2);
        assert_eq!(results.skipped.len(), 1);
        assert!(results.best().is_some());
        for pair in results.ranked.windows(2) {
            assert!(pair[0].metrics.sharpe_ratio >= pair[1].metrics.sharpe_ratio);
        }
    }
}
