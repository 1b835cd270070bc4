//! Portfolio state and equity tracking for a single run.

use chrono::NaiveDateTime;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub drawdown_abs: f64,
    pub drawdown_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    /// Realized balance: initial capital plus closed-trade P&L.
    pub balance: f64,
    pub initial_capital: f64,
    pub peak_equity: f64,
    pub positions: Vec<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            balance: initial_capital,
            initial_capital,
            peak_equity: initial_capital,
            positions: Vec::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.push(position);
    }

    pub fn take_positions(&mut self) -> Vec<Position> {
        std::mem::take(&mut self.positions)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.balance += trade.realized_pnl;
        self.closed_trades.push(trade);
    }

    /// Balance plus unrealized P&L of open positions at `price`.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        let unrealized: f64 = self.positions.iter().map(|p| p.unrealized_pnl(price)).sum();
        self.balance + unrealized
    }

    /// Append an equity point, updating the running peak and drawdown.
    pub fn record_equity(&mut self, timestamp: NaiveDateTime, equity: f64) -> &EquityPoint {
        self.peak_equity = self.peak_equity.max(equity);
        let (drawdown_abs, drawdown_pct) = drawdown(self.peak_equity, equity);
        self.equity_curve.push(EquityPoint {
            timestamp,
            equity,
            drawdown_abs,
            drawdown_pct,
        });
        &self.equity_curve[self.equity_curve.len() - 1]
    }
}

/// Drawdown from `peak` to `equity`: absolute and percent, percent in [0, 100].
/// A non-positive peak yields zero drawdown.
pub fn drawdown(peak: f64, equity: f64) -> (f64, f64) {
    let abs = (peak - equity).max(0.0);
    if peak <= 0.0 || abs == 0.0 {
        return (abs, 0.0);
    }
    (abs, (abs / peak * 100.0).clamp(0.0, 100.0))
}
