//! Property-based tests for dr-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use std::collections::BTreeMap;

use dr_math::{
    decay, ema, holt_winters, pearson_correlation, population_stats, sigmoid_modified, wma,
    zscore, MathError, Status,
};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// population / z-score properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The population mean always scores exactly zero.
    #[test]
    fn zscore_of_mean_is_zero(values in prop::collection::vec(-1e6..1e6f64, 2..50)) {
        let stats = population_stats(&values).unwrap();
        let z = zscore(stats.mean, stats.mean, stats.std_dev);
        prop_assert_eq!(z, 0.0);
    }

    /// A single observation has no spread and every score against it is zero.
    #[test]
    fn single_value_population_is_flat(value in -1e6..1e6f64, probe in -1e6..1e6f64) {
        let stats = population_stats(&[value]).unwrap();
        prop_assert_eq!(stats.std_dev, 0.0);
        prop_assert_eq!(zscore(probe, stats.mean, stats.std_dev), 0.0);
    }

    /// Standard deviation is never negative.
    #[test]
    fn std_dev_non_negative(values in prop::collection::vec(-1e6..1e6f64, 1..50)) {
        let stats = population_stats(&values).unwrap();
        prop_assert!(stats.std_dev >= 0.0);
        prop_assert_eq!(stats.count, values.len());
    }

    /// Status depends only on magnitude and is monotone in it.
    #[test]
    fn status_monotone_in_magnitude(a in 0.0..10.0f64, b in 0.0..10.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(Status::from_zscore(lo) <= Status::from_zscore(hi));
        prop_assert_eq!(Status::from_zscore(-a), Status::from_zscore(a));
    }
}

// ============================================================================
// smoothing properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// EMA output lies between the previous average and the current value.
    #[test]
    fn ema_is_convex_combination(
        current in -1e6..1e6f64,
        previous in -1e6..1e6f64,
        alpha in 0.001..=1.0f64,
    ) {
        let out = ema(current, previous, alpha).unwrap();
        let lo = current.min(previous);
        let hi = current.max(previous);
        prop_assert!(out >= lo - TOL * hi.abs().max(1.0));
        prop_assert!(out <= hi + TOL * hi.abs().max(1.0));
    }

    /// WMA with uniform weights equals the arithmetic mean.
    #[test]
    fn wma_uniform_is_mean(values in prop::collection::vec(-1e3..1e3f64, 1..40), w in 0.1..10.0f64) {
        let weights = vec![w; values.len()];
        let out = wma(&values, &weights).unwrap();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert!(approx_eq(out, mean, TOL), "wma={} mean={}", out, mean);
    }

    /// Holt-Winters refuses series shorter than two seasons instead of truncating.
    #[test]
    fn holt_winters_rejects_short_series(season in 1usize..12, deficit in 1usize..12) {
        let len = (season * 2).saturating_sub(deficit);
        let series = vec![1.0; len];
        let err = holt_winters(&series, 0.5, 0.5, 0.5, season, 3).unwrap_err();
        prop_assert_eq!(err, MathError::InsufficientData { required: season * 2, actual: len });
    }

    /// Holt-Winters returns exactly the requested number of forecasts.
    #[test]
    fn holt_winters_forecast_len(season in 1usize..6, extra in 0usize..10, horizon in 0usize..20) {
        let series: Vec<f64> = (0..season * 2 + extra).map(|i| (i % season) as f64 + 1.0).collect();
        let out = holt_winters(&series, 0.3, 0.1, 0.2, season, horizon).unwrap();
        prop_assert_eq!(out.len(), horizon);
    }
}

// ============================================================================
// transform / decay properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Zero decay rate is the identity for any elapsed time.
    #[test]
    fn zero_rate_decay_is_identity(value in -1e9..1e9f64, t in 0.0..1e9f64) {
        prop_assert_eq!(decay(value, 0.0, t).unwrap(), value);
    }

    /// Decay never increases magnitude and is non-increasing in elapsed time.
    #[test]
    fn decay_monotone_in_time(value in 0.0..1e6f64, rate in 0.0..5.0f64, t1 in 0.0..100.0f64, t2 in 0.0..100.0f64) {
        let (early, late) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let a = decay(value, rate, early).unwrap();
        let b = decay(value, rate, late).unwrap();
        prop_assert!(b <= a);
        prop_assert!(a <= value);
    }

    /// Sigmoid output is a probability and is monotone in each input for positive weight.
    #[test]
    fn sigmoid_bounded_and_monotone(x in 0.0..1.0f64, dx in 0.0..0.5f64, w in 0.01..5.0f64) {
        let weights = BTreeMap::from([("a", w)]);
        let p1 = sigmoid_modified(&BTreeMap::from([("a", x)]), &weights, 10.0, 0.5).unwrap();
        let p2 = sigmoid_modified(&BTreeMap::from([("a", x + dx)]), &weights, 10.0, 0.5).unwrap();
        prop_assert!(p1 > 0.0 && p1 < 1.0);
        prop_assert!(p2 >= p1);
    }

    /// Pearson correlation stays in [-1, 1].
    #[test]
    fn pearson_bounded(pairs in prop::collection::vec((-1e3..1e3f64, -1e3..1e3f64), 2..40)) {
        let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let r = pearson_correlation(&x, &y).unwrap();
        prop_assert!((-1.0 - TOL..=1.0 + TOL).contains(&r), "r={}", r);
    }
}
