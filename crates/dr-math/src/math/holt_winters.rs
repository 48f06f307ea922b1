//! Additive Holt-Winters (triple exponential) smoothing and forecasting.
//!
//! The model tracks three components:
//! - level `ℓ`, smoothed by `alpha`
//! - trend `b`, smoothed by `beta`
//! - seasonal offsets `s[0..L)`, smoothed by `gamma`
//!
//! Initialization:
//! - `ℓ₀ = y[0]`
//! - `b₀ = mean over i < L of (y[L+i] - y[i]) / L`
//! - `s[i]` = mean deviation of position `i` from its season's average,
//!   taken across every full season in the series
//!
//! Recurrence for each observed point `y[i]` (with `j = i mod L`):
//! ```text
//! ℓ' = alpha·(y[i] - s[j]) + (1 - alpha)·(ℓ + b)
//! b' = beta·(ℓ' - ℓ) + (1 - beta)·b
//! s[j] = gamma·(y[i] - ℓ') + (1 - gamma)·s[j]
//! ```
//! The m-th step past the series (n points) forecasts
//! `ℓ + m·b + s[(n + m - 1) mod L]`.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};

/// Smoothing coefficients and season length for a Holt-Winters model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoltWintersParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub season_length: usize,
}

impl HoltWintersParams {
    pub fn new(alpha: f64, beta: f64, gamma: f64, season_length: usize) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            season_length,
        }
    }

    /// Validate coefficient ranges and season length.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gamma", self.gamma),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(MathError::InvalidParameter {
                    name,
                    value,
                    expected: "0 <= value <= 1",
                });
            }
        }
        if self.season_length == 0 {
            return Err(MathError::InvalidParameter {
                name: "season_length",
                value: 0.0,
                expected: "season_length >= 1",
            });
        }
        Ok(())
    }

    /// Minimum series length this model can be fitted on.
    pub fn min_series_len(&self) -> usize {
        self.season_length * 2
    }

    /// Fit on `series` and forecast `horizon` steps ahead.
    pub fn forecast(&self, series: &[f64], horizon: usize) -> Result<Vec<f64>> {
        fit_holt_winters(series, self, horizon).map(|fit| fit.forecast)
    }
}

/// Result of fitting a Holt-Winters model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoltWintersFit {
    /// Final level after consuming the series.
    pub level: f64,
    /// Final trend after consuming the series.
    pub trend: f64,
    /// Final seasonal offsets, indexed by position within the season.
    pub seasonals: Vec<f64>,
    /// One-step in-sample outputs `ℓ + b + s[j]`, one per observed point.
    pub fitted: Vec<f64>,
    /// Out-of-sample forecasts, one per horizon step.
    pub forecast: Vec<f64>,
}

/// Holt-Winters forecast of the next `forecast_length` values.
///
/// # Errors
/// - [`MathError::InvalidParameter`] for coefficients outside `[0, 1]` or a zero season
/// - [`MathError::InsufficientData`] if `series.len() < 2 * season_length`
///
/// # Example
/// ```
/// use dr_math::holt_winters;
///
/// let series = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0];
/// let forecast = holt_winters(&series, 1.0, 0.0, 0.0, 3, 3).unwrap();
/// assert_eq!(forecast, vec![1.0, 2.0, 3.0]);
/// ```
pub fn holt_winters(
    series: &[f64],
    alpha: f64,
    beta: f64,
    gamma: f64,
    season_length: usize,
    forecast_length: usize,
) -> Result<Vec<f64>> {
    HoltWintersParams::new(alpha, beta, gamma, season_length).forecast(series, forecast_length)
}

/// Fit a Holt-Winters model and return its components, in-sample outputs
/// and forecast.
pub fn fit_holt_winters(
    series: &[f64],
    params: &HoltWintersParams,
    horizon: usize,
) -> Result<HoltWintersFit> {
    params.validate()?;
    let required = params.min_series_len();
    if series.len() < required {
        return Err(MathError::InsufficientData {
            required,
            actual: series.len(),
        });
    }

    let season = params.season_length;
    let n = series.len();
    let mut seasonals = initial_seasonals(series, season);
    let mut level = series[0];
    let mut trend = initial_trend(series, season);
    let mut fitted = Vec::with_capacity(n);

    for (i, &value) in series.iter().enumerate() {
        let j = i % season;
        let last_level = level;
        level = params.alpha * (value - seasonals[j]) + (1.0 - params.alpha) * (level + trend);
        trend = params.beta * (level - last_level) + (1.0 - params.beta) * trend;
        seasonals[j] = params.gamma * (value - level) + (1.0 - params.gamma) * seasonals[j];
        fitted.push(level + trend + seasonals[j]);
    }

    let forecast = (1..=horizon)
        .map(|m| level + m as f64 * trend + seasonals[(n + m - 1) % season])
        .collect();

    Ok(HoltWintersFit {
        level,
        trend,
        seasonals,
        fitted,
        forecast,
    })
}

/// Initial trend: average per-step change between the first two seasons.
fn initial_trend(series: &[f64], season: usize) -> f64 {
    let l = season as f64;
    let total: f64 = (0..season)
        .map(|i| (series[season + i] - series[i]) / l)
        .sum();
    total / l
}

/// Initial seasonal offsets averaged across all full seasons.
fn initial_seasonals(series: &[f64], season: usize) -> Vec<f64> {
    let n_seasons = series.len() / season;
    let season_averages: Vec<f64> = (0..n_seasons)
        .map(|j| {
            let start = season * j;
            series[start..start + season].iter().sum::<f64>() / season as f64
        })
        .collect();

    (0..season)
        .map(|i| {
            let deviation: f64 = season_averages
                .iter()
                .enumerate()
                .map(|(j, avg)| series[season * j + i] - avg)
                .sum();
            deviation / n_seasons as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    const SEASONAL: [f64; 9] = [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0];

    #[test]
    fn rejects_short_series() {
        let err = holt_winters(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5, 0.5, 0.5, 3, 2).unwrap_err();
        assert_eq!(
            err,
            MathError::InsufficientData {
                required: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn accepts_exactly_two_seasons() {
        let out = holt_winters(&[1.0, 2.0, 3.0, 1.0, 2.0, 3.0], 0.5, 0.1, 0.1, 3, 4).unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn rejects_zero_season() {
        let err = holt_winters(&SEASONAL, 0.5, 0.5, 0.5, 0, 2).unwrap_err();
        assert!(matches!(
            err,
            MathError::InvalidParameter {
                name: "season_length",
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_coefficients() {
        assert!(holt_winters(&SEASONAL, 1.2, 0.1, 0.1, 3, 1).is_err());
        assert!(holt_winters(&SEASONAL, 0.5, -0.1, 0.1, 3, 1).is_err());
        assert!(holt_winters(&SEASONAL, 0.5, 0.1, f64::NAN, 3, 1).is_err());
    }

    #[test]
    fn initial_components_for_pure_season() {
        assert!(approx_eq(initial_trend(&SEASONAL, 3), 0.0, 1e-12));
        let s = initial_seasonals(&SEASONAL, 3);
        assert!(approx_eq(s[0], -1.0, 1e-12));
        assert!(approx_eq(s[1], 0.0, 1e-12));
        assert!(approx_eq(s[2], 1.0, 1e-12));
    }

    #[test]
    fn initial_trend_for_linear_series() {
        let series: Vec<f64> = (0..8).map(|i| i as f64).collect();
        assert!(approx_eq(initial_trend(&series, 2), 1.0, 1e-12));
    }

    #[test]
    fn repeats_a_pure_season() {
        let out = holt_winters(&SEASONAL, 1.0, 0.0, 0.0, 3, 6).unwrap();
        assert_eq!(out, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn fitted_values_reproduce_pure_season() {
        let params = HoltWintersParams::new(1.0, 0.0, 0.0, 3);
        let fit = fit_holt_winters(&SEASONAL, &params, 0).unwrap();
        assert_eq!(fit.fitted.len(), SEASONAL.len());
        for (fitted, observed) in fit.fitted.iter().zip(SEASONAL.iter()) {
            assert!(approx_eq(*fitted, *observed, 1e-12));
        }
        assert!(approx_eq(fit.level, 2.0, 1e-12));
        assert!(approx_eq(fit.trend, 0.0, 1e-12));
    }

    #[test]
    fn zero_horizon_is_empty() {
        let out = holt_winters(&SEASONAL, 0.3, 0.1, 0.2, 3, 0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn forecast_length_matches_request() {
        let series: Vec<f64> = (0..24).map(|i| (i % 4) as f64 + i as f64 * 0.5).collect();
        let out = holt_winters(&series, 0.4, 0.2, 0.3, 4, 7).unwrap();
        assert_eq!(out.len(), 7);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn upward_trend_continues() {
        let series: Vec<f64> = (0..16).map(|i| 10.0 + 2.0 * i as f64).collect();
        let out = holt_winters(&series, 0.5, 0.5, 0.1, 4, 3).unwrap();
        assert!(out[1] > out[0]);
        assert!(out[2] > out[1]);
    }

    #[test]
    fn matches_reference_values() {
        let series: Vec<f64> = (0..16).map(|i| 10.0 + 2.0 * i as f64).collect();
        let out = holt_winters(&series, 0.5, 0.5, 0.1, 4, 3).unwrap();
        let expected = [37.924284586108854, 40.381146895655995, 43.210188156503825];
        for (got, want) in out.iter().zip(expected.iter()) {
            assert!(approx_eq(*got, *want, 1e-9), "got {got}, want {want}");
        }
    }
}
