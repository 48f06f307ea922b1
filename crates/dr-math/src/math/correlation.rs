//! Dependence measures between paired series.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{MathError, Result};

fn ensure_same_len(x_len: usize, y_len: usize) -> Result<()> {
    if x_len != y_len {
        return Err(MathError::LengthMismatch {
            left: "x",
            left_len: x_len,
            right: "y",
            right_len: y_len,
        });
    }
    Ok(())
}

/// Pearson correlation coefficient `r ∈ [-1, 1]`.
///
/// Returns 0 when either series has no variation (including empty input):
/// a constant series carries no correlation signal.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    ensure_same_len(x.len(), y.len())?;
    if x.is_empty() {
        return Ok(0.0);
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut ss_x = 0.0;
    let mut ss_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        numerator += dx * dy;
        ss_x += dx * dx;
        ss_y += dy * dy;
    }

    let denominator = (ss_x * ss_y).sqrt();
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok(numerator / denominator)
}

/// Mutual information (in nats) between two discrete label sequences.
///
/// Uses the empirical joint distribution:
/// `I(X;Y) = Σ p(x,y) · ln(p(x,y) / (p(x)·p(y)))`.
pub fn mutual_information<X, Y>(x: &[X], y: &[Y]) -> Result<f64>
where
    X: Eq + Hash,
    Y: Eq + Hash,
{
    ensure_same_len(x.len(), y.len())?;
    if x.is_empty() {
        return Ok(0.0);
    }
    let n = x.len() as f64;

    let mut joint: HashMap<(&X, &Y), usize> = HashMap::new();
    let mut marginal_x: HashMap<&X, usize> = HashMap::new();
    let mut marginal_y: HashMap<&Y, usize> = HashMap::new();
    for (a, b) in x.iter().zip(y) {
        *joint.entry((a, b)).or_default() += 1;
        *marginal_x.entry(a).or_default() += 1;
        *marginal_y.entry(b).or_default() += 1;
    }

    let mi = joint
        .iter()
        .map(|((a, b), &count)| {
            let p_xy = count as f64 / n;
            let p_x = marginal_x[a] as f64 / n;
            let p_y = marginal_y[b] as f64 / n;
            p_xy * (p_xy / (p_x * p_y)).ln()
        })
        .sum::<f64>();
    // Rounding can leave a tiny negative residue for independent inputs.
    Ok(mi.max(0.0))
}
