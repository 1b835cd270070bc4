//! Parallel execution of independent backtests.
//!
//! Each job owns its own run state, so jobs are spread over the rayon pool
//! without locking. A job's validation error, mid-run failure or panic is
//! captured in its own entry and never affects its siblings.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use crate::domain::backtest::{run_backtest, BacktestConfig, RunControl, RunOutcome, RunStatus};
use crate::domain::candle::Candle;
use crate::domain::error::ReplayError;
use crate::domain::strategy::StrategyConfig;
use crate::ports::log_port::LogPort;

#[derive(Debug, Clone)]
pub struct BatchJob<'a> {
    pub label: String,
    pub candles: &'a [Candle],
    pub strategy: StrategyConfig,
    pub config: BacktestConfig,
}

#[derive(Debug)]
pub struct BatchEntry {
    pub label: String,
    pub strategy: StrategyConfig,
    pub outcome: Result<RunOutcome, ReplayError>,
}

impl BatchEntry {
    /// Completed, aborted or failed. `None` when the job was rejected before
    /// running.
    pub fn status(&self) -> Option<RunStatus> {
        self.outcome.as_ref().ok().map(RunOutcome::status)
    }
}

/// Run every job, preserving input order in the output.
pub fn run_batch(jobs: &[BatchJob<'_>], control: &RunControl, log: &dyn LogPort) -> Vec<BatchEntry> {
    log.info(&format!("running batch of {} backtests", jobs.len()));

    let entries: Vec<BatchEntry> = jobs
        .par_iter()
        .map(|job| BatchEntry {
            label: job.label.clone(),
            strategy: job.strategy.clone(),
            outcome: run_isolated(job, control, log),
        })
        .collect();

    let completed = entries
        .iter()
        .filter(|e| e.status() == Some(RunStatus::Completed))
        .count();
    log.info(&format!(
        "batch finished: {}/{} completed",
        completed,
        entries.len()
    ));
    entries
}

/// A panicking job becomes `RunOutcome::Failed` with `processed` of 0, since
/// the replay position is lost with the unwound stack.
fn run_isolated(
    job: &BatchJob<'_>,
    control: &RunControl,
    log: &dyn LogPort,
) -> Result<RunOutcome, ReplayError> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        run_backtest(job.candles, &job.strategy, &job.config, control, log)
    }))
    .unwrap_or_else(|payload| {
        Ok(RunOutcome::Failed {
            error: format!("panicked: {}", panic_message(&*payload)),
            processed: 0,
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
