//! Population summary statistics over a fleet-wide metric sample.
//!
//! A population sample is the set of non-absent current values of a single
//! metric across all devices. Its spread uses the n-1 (Bessel-corrected)
//! estimator; a sample of one value has no observable variance, so its
//! standard deviation is reported as exactly 0.

use serde::{Deserialize, Serialize};

/// Mean and spread of one metric across the device population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Number of finite values that contributed.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation; 0 when `count <= 1`.
    pub std_dev: f64,
}

impl PopulationStats {
    /// Whether the population has no spread (z-scores are all 0).
    pub fn is_flat(&self) -> bool {
        self.std_dev == 0.0
    }
}

/// Compute mean and standard deviation of a population sample.
///
/// Non-finite values are ignored. Returns `None` when no finite values
/// remain: the metric is not analyzable, which is not the same as a mean of 0.
///
/// # Example
/// ```
/// use dr_math::population_stats;
///
/// let stats = population_stats(&[10.0, 20.0, 30.0]).unwrap();
/// assert_eq!(stats.mean, 20.0);
/// assert!((stats.std_dev - 10.0).abs() < 1e-12);
/// ```
pub fn population_stats(values: &[f64]) -> Option<PopulationStats> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let mean = mean(&finite)?;
    let std_dev = sample_std_dev(&finite, mean);
    Some(PopulationStats {
        count: finite.len(),
        mean,
        std_dev,
    })
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bessel-corrected standard deviation around a known mean.
///
/// Defined as 0 for fewer than two values.
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sample_has_no_opinion() {
        assert!(population_stats(&[]).is_none());
    }

    #[test]
    fn single_value_is_flat() {
        let stats = population_stats(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std_dev, 0.0);
        assert!(stats.is_flat());
    }

    #[test]
    fn three_values_use_bessel_correction() {
        let stats = population_stats(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 20.0);
        assert!((stats.std_dev - 10.0).abs() < 1e-12);
    }

    #[test]
    fn identical_values_are_flat() {
        let stats = population_stats(&[5.0, 5.0, 5.0, 5.0]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let stats = population_stats(&[1.0, f64::NAN, 3.0, f64::INFINITY]).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 2.0);
    }

    #[test]
    fn only_non_finite_is_absent() {
        assert!(population_stats(&[f64::NAN, f64::NEG_INFINITY]).is_none());
    }
}
