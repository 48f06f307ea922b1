//! Risk transforms: bounded sigmoid and weighted linear scores.
//!
//! All keyed transforms require an explicit weight for every input dimension:
//! key sets must match exactly. A missing weight is a caller error, never a
//! silent default of 0 or 1.
//!
//! - [`sigmoid_modified`]: `1 / (1 + exp(-k · Σ wᵢ(xᵢ - x0)))`, a probability in (0, 1)
//! - [`weighted_score`]: `Σ wᵢ·fᵢ` for arbitrary factors
//! - [`composite_risk_score`]: the same sum over components pre-normalized to `[0, 1]`
//! - [`user_risk_score`]: `Σ wᵢ·|zᵢ|` over per-activity z-scores

use std::collections::BTreeMap;
use std::fmt::Display;

use super::keys::ensure_same_keys;
use super::zscore::zscore;
use crate::error::{MathError, Result};

/// Default sigmoid steepness.
pub const DEFAULT_SIGMOID_K: f64 = 10.0;
/// Default sigmoid inflection point.
pub const DEFAULT_SIGMOID_X0: f64 = 0.5;

/// Logistic function `1 / (1 + e^-x)`.
///
/// Saturates to exactly 0 or 1 for very large `|x|` instead of overflowing.
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Weighted, centred sigmoid over keyed inputs.
///
/// # Arguments
/// * `values` - Input values, typically normalized to `[0, 1]`
/// * `weights` - Weight per input; keys must equal those of `values`
/// * `k` - Steepness of the curve
/// * `x0` - Inflection point each value is centred on
///
/// # Errors
/// [`MathError::KeyMismatch`] if the key sets differ;
/// [`MathError::InvalidParameter`] if `k` or `x0` is not finite.
///
/// # Example
/// ```
/// use std::collections::BTreeMap;
/// use dr_math::sigmoid_modified;
///
/// let values = BTreeMap::from([("a", 1.0)]);
/// let weights = BTreeMap::from([("a", 1.0)]);
/// let p = sigmoid_modified(&values, &weights, 10.0, 0.5).unwrap();
/// assert!((p - 0.9933).abs() < 1e-4);
/// ```
pub fn sigmoid_modified<K>(
    values: &BTreeMap<K, f64>,
    weights: &BTreeMap<K, f64>,
    k: f64,
    x0: f64,
) -> Result<f64>
where
    K: Ord + Display,
{
    if !k.is_finite() {
        return Err(MathError::InvalidParameter {
            name: "k",
            value: k,
            expected: "finite steepness",
        });
    }
    if !x0.is_finite() {
        return Err(MathError::InvalidParameter {
            name: "x0",
            value: x0,
            expected: "finite inflection point",
        });
    }
    ensure_same_keys("values", values, "weights", weights)?;

    let weighted_sum: f64 = values
        .iter()
        .map(|(key, value)| weights[key] * (value - x0))
        .sum();
    Ok(logistic(k * weighted_sum))
}

/// Weighted linear score `Σ wᵢ·fᵢ`.
pub fn weighted_score<K>(factors: &BTreeMap<K, f64>, weights: &BTreeMap<K, f64>) -> Result<f64>
where
    K: Ord + Display,
{
    ensure_same_keys("factors", factors, "weights", weights)?;
    Ok(factors.iter().map(|(key, f)| weights[key] * f).sum())
}

/// Composite risk score over components normalized to `[0, 1]`.
///
/// Same weighted-sum contract as [`weighted_score`], with the additional
/// precondition that every component lies in `[0, 1]`. This is the weighted
/// composition; the state machine's unweighted sum of raw factors is a
/// separate operation and is not interchangeable with this one.
pub fn composite_risk_score<K>(
    components: &BTreeMap<K, f64>,
    weights: &BTreeMap<K, f64>,
) -> Result<f64>
where
    K: Ord + Display,
{
    ensure_same_keys("components", components, "weights", weights)?;
    for (key, value) in components {
        if !(0.0..=1.0).contains(value) {
            return Err(MathError::OutOfRange {
                key: key.to_string(),
                value: *value,
                expected: "0 <= component <= 1",
            });
        }
    }
    Ok(components.iter().map(|(key, c)| weights[key] * c).sum())
}

/// User (insider) risk score `Σ wᵢ·|zᵢ|`.
///
/// Each activity is standardized against its own mean and standard deviation
/// (z = 0 for a zero deviation). Deviations in either direction add risk.
pub fn user_risk_score<K>(
    activities: &BTreeMap<K, f64>,
    means: &BTreeMap<K, f64>,
    std_devs: &BTreeMap<K, f64>,
    weights: &BTreeMap<K, f64>,
) -> Result<f64>
where
    K: Ord + Display,
{
    ensure_same_keys("activities", activities, "means", means)?;
    ensure_same_keys("activities", activities, "std_devs", std_devs)?;
    ensure_same_keys("activities", activities, "weights", weights)?;

    Ok(activities
        .iter()
        .map(|(key, value)| weights[key] * zscore(*value, means[key], std_devs[key]).abs())
        .sum())
}
