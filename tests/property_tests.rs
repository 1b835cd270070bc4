//! Property tests for indicator, metric and engine invariants.

mod common;

use common::*;
use proptest::prelude::*;
use replaytrader::adapters::log_adapter::NullLog;
use replaytrader::domain::backtest::{run_backtest, RunControl, RunStatus};
use replaytrader::domain::correlation::pearson_correlation;
use replaytrader::domain::indicator::{ema, rsi, sma};
use replaytrader::domain::metrics::profit_factor;
use replaytrader::domain::portfolio::Portfolio;
use replaytrader::domain::strategy::{SignalIndicator, StrategyConfig};

fn arb_prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1_000.0_f64, 2..120)
}

fn arb_series(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.1..0.1_f64, len)
}

proptest! {
    #[test]
    fn rsi_stays_in_range(prices in arb_prices(), period in 1usize..30) {
        for value in rsi(&prices, period).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }

    #[test]
    fn moving_averages_of_constant_series(price in 1.0..10_000.0_f64, len in 1usize..80, period in 1usize..20) {
        let prices = vec![price; len];
        for value in sma(&prices, period).into_iter().flatten() {
            prop_assert!((value - price).abs() <= price * 1e-12);
        }
        for value in ema(&prices, period).into_iter().flatten() {
            prop_assert!((value - price).abs() <= price * 1e-12);
        }
    }

    #[test]
    fn correlation_symmetric_and_bounded(
        (a, b) in (2usize..60).prop_flat_map(|n| (arb_series(n), arb_series(n)))
    ) {
        let ab = pearson_correlation(&a, &b).unwrap();
        let ba = pearson_correlation(&b, &a).unwrap();
        prop_assert_eq!(ab, ba);
        prop_assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn self_correlation_is_one(a in arb_series(30)) {
        let c = pearson_correlation(&a, &a).unwrap();
        let varies = a.iter().any(|&x| x != a[0]);
        if varies {
            prop_assert!((c - 1.0).abs() < 1e-9);
        } else {
            prop_assert_eq!(c, 0.0);
        }
    }

    #[test]
    fn profit_factor_non_negative(profit in 0.0..1e6_f64, loss in 0.0..1e6_f64) {
        let pf = profit_factor(profit, loss);
        prop_assert!(pf >= 0.0);
        prop_assert!(pf.is_finite());
    }

    #[test]
    fn drawdown_bounded_and_zero_at_peak(equity in prop::collection::vec(0.0..5_000.0_f64, 1..100)) {
        let mut portfolio = Portfolio::new(1_000.0);
        for (i, &e) in equity.iter().enumerate() {
            let prev_peak = portfolio.peak_equity;
            let point = portfolio.record_equity(day(i), e).clone();
            prop_assert!((0.0..=100.0).contains(&point.drawdown_pct));
            if e >= prev_peak {
                prop_assert_eq!(point.drawdown_pct, 0.0);
            }
        }
    }

    #[test]
    fn engine_invariants_hold(
        seed_prices in prop::collection::vec(10.0..200.0_f64, 3..80),
        stop in 0.0..10.0_f64,
        target in 0.0..20.0_f64,
        trailing in any::<bool>(),
    ) {
        let candles: Vec<_> = seed_prices
            .iter()
            .enumerate()
            .map(|(i, &c)| make_candle(i, c, c * 1.02, c * 0.98, c))
            .collect();
        let strategy = StrategyConfig {
            indicators: vec![SignalIndicator::Sma, SignalIndicator::Ema],
            ma_period: 3,
            stop_loss_pct: stop,
            take_profit_pct: target,
            trailing_stop_enabled: trailing,
            ..StrategyConfig::default()
        };
        let config = sample_config();
        let outcome = run_backtest(&candles, &strategy, &config, &RunControl::none(), &NullLog).unwrap();
        prop_assert_eq!(outcome.status(), RunStatus::Completed);

        let result = outcome.into_completed().unwrap();
        prop_assert_eq!(result.equity_curve.len(), candles.len());
        prop_assert!((0.0..=1.0).contains(&result.metrics.win_rate));
        for trade in &result.trades {
            prop_assert!(trade.exit_time >= trade.entry_time);
        }
        for pair in result.trades.windows(2) {
            prop_assert!(pair[1].entry_time > pair[0].exit_time);
        }
        let pnl: f64 = result.trades.iter().map(|t| t.realized_pnl).sum();
        prop_assert!((result.final_balance - (config.initial_capital + pnl)).abs() < 1e-6);
    }
}
