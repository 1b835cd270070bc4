//! Performance metrics derived from a finished run.

use super::portfolio::EquityPoint;
use super::position::ClosedTrade;

/// Reported profit factor when there are winning trades but no losing ones.
pub const PROFIT_FACTOR_CAP: f64 = 9_999.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Fraction in [0, 1].
    pub win_rate: f64,
    pub profit_factor: f64,
    pub gross_profit: f64,
    /// Sum of losing P&L, as a positive number.
    pub gross_loss: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_abs: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub total_return_pct: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl Metrics {
    pub fn compute(
        trades: &[ClosedTrade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Self {
        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut breakeven_trades = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in trades {
            let pnl = trade.realized_pnl;
            if pnl > 0.0 {
                winning_trades += 1;
                gross_profit += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                losing_trades += 1;
                gross_loss += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                breakeven_trades += 1;
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            winning_trades as f64 / total_trades as f64
        } else {
            0.0
        };

        let avg_win = if winning_trades > 0 {
            gross_profit / winning_trades as f64
        } else {
            0.0
        };
        let avg_loss = if losing_trades > 0 {
            gross_loss / losing_trades as f64
        } else {
            0.0
        };

        let total_return_pct = if initial_capital > 0.0 {
            (gross_profit - gross_loss) / initial_capital * 100.0
        } else {
            0.0
        };

        let max_drawdown_pct = equity_curve
            .iter()
            .map(|p| p.drawdown_pct)
            .fold(0.0_f64, f64::max);
        let max_drawdown_abs = equity_curve
            .iter()
            .map(|p| p.drawdown_abs)
            .fold(0.0_f64, f64::max);

        let returns = equity_returns(equity_curve);
        let (sharpe_ratio, sortino_ratio) =
            sharpe_sortino(&returns, risk_free_rate, periods_per_year);

        Metrics {
            total_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            win_rate,
            profit_factor: profit_factor(gross_profit, gross_loss),
            gross_profit,
            gross_loss,
            max_drawdown_pct,
            max_drawdown_abs,
            sharpe_ratio,
            sortino_ratio,
            total_return_pct,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
        }
    }
}

/// Gross profit over gross loss, capped at [`PROFIT_FACTOR_CAP`].
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss > 0.0 {
        (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
    } else if gross_profit > 0.0 {
        PROFIT_FACTOR_CAP
    } else {
        0.0
    }
}

/// Period-over-period returns of an equity curve. A non-positive previous
/// equity contributes a zero return.
pub fn equity_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized Sharpe and Sortino ratios of a return series.
///
/// `risk_free_rate` is annual and is spread evenly over `periods_per_year`.
/// Both ratios use population deviations. Downside deviation is taken over
/// returns below the per-period risk-free rate, divided by the full sample
/// count. Fewer than two returns, or a zero deviation, gives 0.
pub fn sharpe_sortino(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> (f64, f64) {
    if returns.len() < 2 {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let period_rf = if periods_per_year > 0.0 {
        risk_free_rate / periods_per_year
    } else {
        0.0
    };
    let excess = mean - period_rf;
    let scale = periods_per_year.max(0.0).sqrt();

    let sharpe = if stddev > 0.0 {
        excess / stddev * scale
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < period_rf)
        .map(|&r| (r - period_rf).powi(2))
        .sum();
    let downside_dev = (downside_sq / n).sqrt();

    let sortino = if downside_dev > 0.0 {
        excess / downside_dev * scale
    } else {
        0.0
    };

    (finite_or_zero(sharpe), finite_or_zero(sortino))
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
