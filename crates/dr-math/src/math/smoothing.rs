//! Exponential and weighted moving averages.
//!
//! Both filters are used to damp telemetry noise before risk scoring:
//! - EMA: `alpha * current + (1 - alpha) * previous`, with `alpha ∈ (0, 1]`
//! - WMA: `Σ(w·v) / Σw` over an explicit weight vector
//!
//! `alpha = 0` would freeze the average forever and is rejected, as is a
//! weight vector summing to zero (0/0 has no meaningful fallback).

use crate::error::{MathError, Result};

/// Default EMA smoothing factor.
pub const DEFAULT_EMA_ALPHA: f64 = 0.2;

fn validate_alpha(alpha: f64) -> Result<()> {
    if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
        return Err(MathError::InvalidParameter {
            name: "alpha",
            value: alpha,
            expected: "0 < alpha <= 1",
        });
    }
    Ok(())
}

/// One exponential moving average step.
///
/// # Errors
/// [`MathError::InvalidParameter`] unless `0 < alpha <= 1`.
///
/// # Example
/// ```
/// use dr_math::ema;
///
/// let next = ema(10.0, 20.0, 0.2).unwrap();
/// assert!((next - 18.0).abs() < 1e-12);
/// ```
pub fn ema(current: f64, previous: f64, alpha: f64) -> Result<f64> {
    validate_alpha(alpha)?;
    Ok(alpha * current + (1.0 - alpha) * previous)
}

/// Fold a series (oldest first) through [`ema`], seeded with the first value.
///
/// Returns `Ok(None)` for an empty series.
pub fn ema_series(values: &[f64], alpha: f64) -> Result<Option<f64>> {
    validate_alpha(alpha)?;
    let Some((&first, rest)) = values.split_first() else {
        return Ok(None);
    };
    let smoothed = rest
        .iter()
        .fold(first, |prev, &v| alpha * v + (1.0 - alpha) * prev);
    Ok(Some(smoothed))
}

/// Weighted moving average `Σ(w·v) / Σw`.
///
/// # Errors
/// - [`MathError::LengthMismatch`] if `values` and `weights` differ in length
/// - [`MathError::ZeroWeightSum`] if the weights sum to 0 (including empty input)
pub fn wma(values: &[f64], weights: &[f64]) -> Result<f64> {
    if values.len() != weights.len() {
        return Err(MathError::LengthMismatch {
            left: "values",
            left_len: values.len(),
            right: "weights",
            right_len: weights.len(),
        });
    }
    let weight_sum: f64 = weights.iter().sum();
    if weight_sum == 0.0 {
        return Err(MathError::ZeroWeightSum);
    }
    let weighted: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Ok(weighted / weight_sum)
}
