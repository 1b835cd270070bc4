//! Cross-strategy Pearson correlation.

use crate::domain::error::ReplayError;

/// Pearson correlation of two equal-length series, clamped to [-1, 1].
///
/// Fewer than two points, or zero variance in either series, gives 0.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, ReplayError> {
    if a.len() != b.len() {
        return Err(ReplayError::SeriesLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < 2 {
        return Ok(0.0);
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(0.0);
    }
    Ok((cov / denom).clamp(-1.0, 1.0))
}

/// Symmetric matrix of pairwise correlations. All series must share a length.
pub fn correlation_matrix(series: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ReplayError> {
    let n = series.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let c = pearson_correlation(&series[i], &series[j])?;
            matrix[i][j] = c;
            matrix[j][i] = c;
        }
    }
    Ok(matrix)
}
