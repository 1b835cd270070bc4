//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n prices, then
//! EMA[i] = (P[i] - EMA[i-1]) * k + EMA[i-1].
//! Warmup: first (n-1) values are undefined.

pub fn ema(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; prices.len()];
    }

    let mut values = Vec::with_capacity(prices.len());
    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, &price) in prices.iter().enumerate() {
        if i < period - 1 {
            sum += price;
            values.push(None);
        } else if i == period - 1 {
            sum += price;
            ema = sum / period as f64;
            values.push(Some(ema));
        } else {
            ema += (price - ema) * k;
            values.push(Some(ema));
        }
    }

    values
}
