//! Position lifecycle: entry, in-flight tracking, exit.
//!
//! A `Position` is a value. `advance` consumes it together with the next
//! candle and either hands back the updated position or the `ClosedTrade`
//! it turned into. Nothing here reads state beyond its arguments.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::candle::Candle;
use crate::domain::signal::Signal;
use crate::domain::strategy::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// The entry side a signal asks for, if any.
    pub fn from_signal(signal: Signal) -> Option<Side> {
        match signal {
            Signal::Buy => Some(Side::Long),
            Signal::Sell => Some(Side::Short),
            Signal::Hold => None,
        }
    }

    /// +1 for long, -1 for short.
    pub fn direction(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
    Signal,
    ForcedEndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::Signal => "signal",
            ExitReason::ForcedEndOfData => "end_of_data",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub highest_price_seen: f64,
    pub lowest_price_seen: f64,
}

impl Position {
    /// Open at the candle's close, sized as `risk_per_trade_pct` of `balance`.
    /// Returns `None` when the resulting quantity is not positive.
    pub fn open(side: Side, candle: &Candle, balance: f64, config: &StrategyConfig) -> Option<Self> {
        let entry_price = candle.close;
        let quantity = config.risk_per_trade_pct / 100.0 * balance / entry_price;
        if !quantity.is_finite() || quantity <= 0.0 {
            return None;
        }

        let dir = side.direction();
        let stop_loss = if config.stop_loss_pct > 0.0 {
            Some(entry_price * (1.0 - dir * config.stop_loss_pct / 100.0))
        } else {
            None
        };
        let take_profit = if config.take_profit_pct > 0.0 {
            Some(entry_price * (1.0 + dir * config.take_profit_pct / 100.0))
        } else {
            None
        };

        Some(Position {
            side,
            entry_price,
            entry_time: candle.timestamp,
            quantity,
            stop_loss,
            take_profit,
            trailing_stop: None,
            highest_price_seen: entry_price,
            lowest_price_seen: entry_price,
        })
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.direction() * (price - self.entry_price) * self.quantity
    }

    /// Track the candle's extremes and ratchet the trailing stop. The stop
    /// only ever tightens.
    pub fn track(mut self, candle: &Candle, config: &StrategyConfig) -> Self {
        self.highest_price_seen = self.highest_price_seen.max(candle.high);
        self.lowest_price_seen = self.lowest_price_seen.min(candle.low);

        if !config.trailing_stop_enabled {
            return self;
        }

        let distance = config.trailing_stop_distance_pct / 100.0;
        match self.side {
            Side::Long => {
                let gain_pct = (self.highest_price_seen - self.entry_price) / self.entry_price * 100.0;
                if gain_pct >= config.trailing_stop_activation_pct {
                    let candidate = self.highest_price_seen * (1.0 - distance);
                    self.trailing_stop = Some(match self.trailing_stop {
                        Some(current) => current.max(candidate),
                        None => candidate,
                    });
                }
            }
            Side::Short => {
                let gain_pct = (self.entry_price - self.lowest_price_seen) / self.entry_price * 100.0;
                if gain_pct >= config.trailing_stop_activation_pct {
                    let candidate = self.lowest_price_seen * (1.0 + distance);
                    self.trailing_stop = Some(match self.trailing_stop {
                        Some(current) => current.min(candidate),
                        None => candidate,
                    });
                }
            }
        }
        self
    }

    /// Level breached against the position during the candle, if any.
    fn adverse_breach(&self, level: Option<f64>, candle: &Candle) -> Option<f64> {
        let level = level?;
        let hit = match self.side {
            Side::Long => candle.low <= level,
            Side::Short => candle.high >= level,
        };
        hit.then_some(level)
    }

    fn favorable_breach(&self, level: Option<f64>, candle: &Candle) -> Option<f64> {
        let level = level?;
        let hit = match self.side {
            Side::Long => candle.high >= level,
            Side::Short => candle.low <= level,
        };
        hit.then_some(level)
    }

    /// First satisfied exit condition, in precedence order, with its fill price.
    pub fn exit_condition(&self, candle: &Candle, signal: Signal) -> Option<(ExitReason, f64)> {
        if let Some(price) = self.adverse_breach(self.stop_loss, candle) {
            return Some((ExitReason::StopLoss, price));
        }
        if let Some(price) = self.favorable_breach(self.take_profit, candle) {
            return Some((ExitReason::TakeProfit, price));
        }
        if let Some(price) = self.adverse_breach(self.trailing_stop, candle) {
            return Some((ExitReason::TrailingStop, price));
        }
        let held = match self.side {
            Side::Long => Signal::Buy,
            Side::Short => Signal::Sell,
        };
        if signal.opposes(held) {
            return Some((ExitReason::Signal, candle.close));
        }
        None
    }

    pub fn close(self, exit_price: f64, exit_time: NaiveDateTime, exit_reason: ExitReason) -> ClosedTrade {
        let realized_pnl = self.unrealized_pnl(exit_price);
        let notional = self.entry_price * self.quantity;
        let realized_pnl_pct = if notional > 0.0 {
            realized_pnl / notional * 100.0
        } else {
            0.0
        };

        ClosedTrade {
            side: self.side,
            entry_price: self.entry_price,
            entry_time: self.entry_time,
            quantity: self.quantity,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            trailing_stop: self.trailing_stop,
            highest_price_seen: self.highest_price_seen,
            lowest_price_seen: self.lowest_price_seen,
            exit_price,
            exit_time: exit_time.max(self.entry_time),
            exit_reason,
            realized_pnl,
            realized_pnl_pct,
        }
    }
}

/// Result of advancing an open position by one candle.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Held(Position),
    Closed(ClosedTrade),
}

/// Advance an open position through one candle: track first, then test exits.
pub fn advance(position: Position, candle: &Candle, signal: Signal, config: &StrategyConfig) -> Transition {
    let position = position.track(candle, config);
    match position.exit_condition(candle, signal) {
        Some((reason, price)) => Transition::Closed(position.close(price, candle.timestamp, reason)),
        None => Transition::Held(position),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub quantity: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop: Option<f64>,
    pub highest_price_seen: f64,
    pub lowest_price_seen: f64,
    pub exit_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_reason: ExitReason,
    pub realized_pnl: f64,
    pub realized_pnl_pct: f64,
}

impl ClosedTrade {
    pub fn holding_period(&self) -> chrono::Duration {
        self.exit_time - self.entry_time
    }
}
