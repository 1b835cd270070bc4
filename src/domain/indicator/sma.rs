//! Simple Moving Average.
//!
//! SMA[i] = mean(P[i-n+1..=i]). Warmup: first (n-1) values are undefined.

/// Window-mean SMA over `prices`.
pub fn sma(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }

    (0..prices.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &prices[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
