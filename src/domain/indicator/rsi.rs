//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n deltas
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n values are undefined (n deltas are needed for the seed).

pub const DEFAULT_PERIOD: usize = 14;

pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; prices.len()];
    if period == 0 || prices.len() <= period {
        return values;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |d: f64| if d > 0.0 { d } else { 0.0 };
    let loss = |d: f64| if d < 0.0 { -d } else { 0.0 };

    let mut avg_gain = deltas[..period].iter().map(|&d| gain(d)).sum::<f64>() / period as f64;
    let mut avg_loss = deltas[..period].iter().map(|&d| loss(d)).sum::<f64>() / period as f64;
    values[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    for (i, &delta) in deltas.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(delta)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(delta)) / period as f64;
        values[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
    rsi.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_empty() {
        assert!(rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_price() {
        assert_eq!(rsi(&[100.0], 14), vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let values = rsi(&prices, 14);

        assert_eq!(values.len(), 15);
        for (i, v) in values.iter().enumerate().take(14) {
            assert!(v.is_none(), "index {} should be undefined", i);
        }
        assert!(values[14].is_some());
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let values = rsi(&prices, 14);
        assert_relative_eq!(values[14].unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let values = rsi(&prices, 14);
        assert_relative_eq!(values[14].unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        let values = rsi(&[50.0; 6], 3);
        assert_relative_eq!(values[3].unwrap(), 100.0);
        assert_relative_eq!(values[5].unwrap(), 100.0);
    }

    #[test]
    fn rsi_wilder_smoothing() {
        // deltas +2, -1 seed the averages (gain 1.0, loss 0.5); +1 is smoothed
        let values = rsi(&[10.0, 12.0, 11.0, 12.0], 2);
        let seed = 100.0 - 100.0 / (1.0 + 1.0 / 0.5);
        assert_relative_eq!(values[2].unwrap(), seed, epsilon = 1e-12);

        let avg_gain = (1.0 * 1.0 + 1.0) / 2.0;
        let avg_loss = (0.5 * 1.0 + 0.0) / 2.0;
        let next = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert_relative_eq!(values[3].unwrap(), next, epsilon = 1e-12);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();

        for v in rsi(&prices, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_zero_period() {
        assert_eq!(rsi(&[100.0, 101.0], 0), vec![None, None]);
    }

    #[test]
    fn rsi_known_calculation() {
        let prices = [
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ];
        let value = rsi(&prices, 14)[14].unwrap();
        assert!(value > 50.0 && value < 100.0, "RSI should be in bullish territory");
    }
}
