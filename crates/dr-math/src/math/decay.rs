//! Exponential time decay of risk influence.
//!
//! `v(t) = v₀ · exp(-λ·t)` with decay rate `λ >= 0` and elapsed time `t >= 0`.
//! A negative rate would amplify rather than decay and is rejected.
//!
//! Decay is always re-derived from the original value: applying it to an
//! already-decayed value would compound the elapsed time.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::keys::ensure_same_keys;
use crate::error::{MathError, Result};

fn validate(decay_rate: f64, elapsed: f64) -> Result<()> {
    if !decay_rate.is_finite() || decay_rate < 0.0 {
        return Err(MathError::InvalidParameter {
            name: "decay_rate",
            value: decay_rate,
            expected: "finite rate >= 0",
        });
    }
    if !elapsed.is_finite() || elapsed < 0.0 {
        return Err(MathError::InvalidParameter {
            name: "elapsed",
            value: elapsed,
            expected: "finite elapsed time >= 0",
        });
    }
    Ok(())
}

/// Decay `initial` by `exp(-decay_rate * elapsed)`.
///
/// # Example
/// ```
/// use dr_math::decay;
///
/// let half = decay(8.0, std::f64::consts::LN_2, 1.0).unwrap();
/// assert!((half - 4.0).abs() < 1e-12);
/// assert_eq!(decay(8.0, 0.0, 1e6).unwrap(), 8.0);
/// ```
pub fn decay(initial: f64, decay_rate: f64, elapsed: f64) -> Result<f64> {
    validate(decay_rate, elapsed)?;
    Ok(initial * (-decay_rate * elapsed).exp())
}

/// Decay each value by its own rate over a shared elapsed time.
///
/// # Errors
/// [`MathError::KeyMismatch`] if `initial_values` and `decay_rates` differ in
/// keys; [`MathError::InvalidParameter`] for a negative rate or elapsed time.
pub fn decay_multiple<K>(
    initial_values: &BTreeMap<K, f64>,
    decay_rates: &BTreeMap<K, f64>,
    elapsed: f64,
) -> Result<BTreeMap<K, f64>>
where
    K: Ord + Display + Clone,
{
    ensure_same_keys("initial_values", initial_values, "decay_rates", decay_rates)?;
    initial_values
        .iter()
        .map(|(key, value)| Ok((key.clone(), decay(*value, decay_rates[key], elapsed)?)))
        .collect()
}

/// A decayed value together with the inputs that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayedValue {
    pub initial: f64,
    pub decay_rate: f64,
    pub elapsed: f64,
    pub value: f64,
}

impl DecayedValue {
    pub fn new(initial: f64, decay_rate: f64, elapsed: f64) -> Result<Self> {
        Ok(Self {
            initial,
            decay_rate,
            elapsed,
            value: decay(initial, decay_rate, elapsed)?,
        })
    }

    /// Re-derive the value at a different elapsed time from the original value.
    pub fn at(&self, elapsed: f64) -> Result<Self> {
        Self::new(self.initial, self.decay_rate, elapsed)
    }

    /// Fraction of the original influence that remains.
    pub fn retained_fraction(&self) -> f64 {
        (-self.decay_rate * self.elapsed).exp()
    }
}
