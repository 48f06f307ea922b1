//! Standardized deviation scores and their severity bands.

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of `|z|` for [`Status::Normal`].
pub const NORMAL_BAND: f64 = 1.0;
/// Upper bound (inclusive) of `|z|` for [`Status::Warning`].
pub const WARNING_BAND: f64 = 2.0;
/// Upper bound (inclusive) of `|z|` for [`Status::Critical`].
pub const CRITICAL_BAND: f64 = 3.0;

/// Z-score of `value` against a population mean and standard deviation.
///
/// A flat population (`std_dev == 0`) carries no deviation signal, so the
/// score is 0 rather than a division fault. This is a policy, not an identity.
///
/// # Example
/// ```
/// use dr_math::zscore;
///
/// assert_eq!(zscore(30.0, 20.0, 10.0), 1.0);
/// assert_eq!(zscore(99.0, 20.0, 0.0), 0.0);
/// ```
pub fn zscore(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Severity classification of a z-score magnitude.
///
/// Each band includes its upper boundary: exactly 1.0 is `Normal`,
/// exactly 2.0 is `Warning`, exactly 3.0 is `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Critical,
    Extreme,
}

impl Status {
    /// Classify a z-score by its absolute value.
    pub fn from_zscore(score: f64) -> Self {
        let magnitude = score.abs();
        if magnitude <= NORMAL_BAND {
            Status::Normal
        } else if magnitude <= WARNING_BAND {
            Status::Warning
        } else if magnitude <= CRITICAL_BAND {
            Status::Critical
        } else {
            Status::Extreme
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Warning => "warning",
            Status::Critical => "critical",
            Status::Extreme => "extreme",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zscore_basic() {
        assert_eq!(zscore(30.0, 20.0, 10.0), 1.0);
        assert_eq!(zscore(10.0, 20.0, 10.0), -1.0);
    }

    #[test]
    fn zscore_of_mean_is_zero() {
        assert_eq!(zscore(20.0, 20.0, 7.5), 0.0);
    }

    #[test]
    fn flat_population_yields_zero() {
        assert_eq!(zscore(1e9, 0.0, 0.0), 0.0);
    }

    #[test]
    fn status_boundaries_are_inclusive() {
        assert_eq!(Status::from_zscore(1.0), Status::Normal);
        assert_eq!(Status::from_zscore(2.0), Status::Warning);
        assert_eq!(Status::from_zscore(3.0), Status::Critical);
        assert_eq!(Status::from_zscore(3.0001), Status::Extreme);
    }

    #[test]
    fn status_is_symmetric() {
        assert_eq!(Status::from_zscore(-1.0), Status::Normal);
        assert_eq!(Status::from_zscore(-1.5), Status::Warning);
        assert_eq!(Status::from_zscore(-2.5), Status::Critical);
        assert_eq!(Status::from_zscore(-4.0), Status::Extreme);
    }

    #[test]
    fn status_orders_by_severity() {
        assert!(Status::Normal < Status::Warning);
        assert!(Status::Critical < Status::Extreme);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(Status::Extreme.to_string(), "extreme");
        assert_eq!(Status::Warning.as_str(), "warning");
    }
}
