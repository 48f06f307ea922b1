//! Engine configuration types.
//!
//! Every field has a default, so a partial `engine.json` overrides only what
//! it names. Defaults reproduce the engine's stock behaviour: z-score anomaly
//! threshold 2.0, EMA alpha 0.2, sigmoid `k = 10, x0 = 0.5`, history limit 100.

use std::collections::BTreeMap;
use std::path::Path;

use dr_common::Metric;
use dr_math::{HoltWintersParams, DEFAULT_EMA_ALPHA, DEFAULT_SIGMOID_K, DEFAULT_SIGMOID_X0};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    pub schema_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Metrics scored against the population.
    pub tracked_metrics: Vec<Metric>,

    /// A device is anomalous when any metric has `|z|` strictly above this.
    pub anomaly_threshold: f64,

    /// Maximum number of history records returned per device.
    pub history_limit: usize,

    pub smoothing: SmoothingConfig,

    pub sigmoid: SigmoidConfig,

    /// Weight of each tracked metric in the bounded risk transform.
    pub risk_weights: BTreeMap<Metric, f64>,

    pub state_thresholds: StateThresholds,

    pub decay: DecayConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let tracked_metrics = Metric::CORE.to_vec();
        let weight = 1.0 / tracked_metrics.len() as f64;
        let risk_weights = tracked_metrics.iter().map(|m| (*m, weight)).collect();
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            tracked_metrics,
            anomaly_threshold: 2.0,
            history_limit: 100,
            smoothing: SmoothingConfig::default(),
            sigmoid: SigmoidConfig::default(),
            risk_weights,
            state_thresholds: StateThresholds::default(),
            decay: DecayConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn parse_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// JSON schema of the configuration file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(EngineConfig)
    }

    /// Risk weights restricted to the given metrics.
    ///
    /// Metrics without a configured weight are left out.
    pub fn weights_for<'a>(
        &self,
        metrics: impl IntoIterator<Item = &'a Metric>,
    ) -> BTreeMap<Metric, f64> {
        metrics
            .into_iter()
            .filter_map(|m| self.risk_weights.get(m).map(|w| (*m, *w)))
            .collect()
    }
}

/// Smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SmoothingConfig {
    /// EMA weight of the newest observation, in `(0, 1]`.
    pub ema_alpha: f64,

    pub holt_winters: HoltWintersConfig,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            ema_alpha: DEFAULT_EMA_ALPHA,
            holt_winters: HoltWintersConfig::default(),
        }
    }
}

/// Holt-Winters additive model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HoltWintersConfig {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Observations per seasonal cycle (24 for hourly samples with a daily cycle).
    pub season_length: usize,
}

impl Default for HoltWintersConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.1,
            gamma: 0.1,
            season_length: 24,
        }
    }
}

impl HoltWintersConfig {
    pub fn params(&self) -> HoltWintersParams {
        HoltWintersParams::new(self.alpha, self.beta, self.gamma, self.season_length)
    }
}

/// Bounded sigmoid transform parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SigmoidConfig {
    /// Steepness.
    pub k: f64,
    /// Inflection point.
    pub x0: f64,
}

impl Default for SigmoidConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_SIGMOID_K,
            x0: DEFAULT_SIGMOID_X0,
        }
    }
}

/// Composite-risk thresholds for risk state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StateThresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            warning: 0.5,
            critical: 0.8,
        }
    }
}

/// Time decay of stale risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DecayConfig {
    /// Exponential decay rate per hour since the newest observation.
    pub rate_per_hour: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            rate_per_hour: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tracks_core_metrics() {
        let config = EngineConfig::default();
        assert_eq!(config.tracked_metrics, Metric::CORE.to_vec());
        assert_eq!(config.anomaly_threshold, 2.0);
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.smoothing.ema_alpha, 0.2);
        assert_eq!(config.sigmoid.k, 10.0);
        assert_eq!(config.sigmoid.x0, 0.5);
    }

    #[test]
    fn default_weights_sum_to_one() {
        let config = EngineConfig::default();
        let total: f64 = config.risk_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(config.risk_weights.len(), config.tracked_metrics.len());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::parse_json(r#"{"anomaly_threshold": 3.0}"#).unwrap();
        assert_eq!(config.anomaly_threshold, 3.0);
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.schema_version, crate::CONFIG_SCHEMA_VERSION);
    }

    #[test]
    fn nested_partial_json_keeps_defaults() {
        let config =
            EngineConfig::parse_json(r#"{"smoothing": {"holt_winters": {"season_length": 7}}}"#)
                .unwrap();
        assert_eq!(config.smoothing.holt_winters.season_length, 7);
        assert_eq!(config.smoothing.holt_winters.alpha, 0.5);
        assert_eq!(config.smoothing.ema_alpha, 0.2);
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = EngineConfig::parse_json("{not json").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn unknown_metric_is_parse_error() {
        let err = EngineConfig::parse_json(r#"{"tracked_metrics": ["gpu_usage"]}"#).unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn weights_for_skips_unweighted_metrics() {
        let mut config = EngineConfig::default();
        config.risk_weights.remove(&Metric::DiskUsage);
        let weights = config.weights_for(&[Metric::CpuUsage, Metric::DiskUsage]);
        assert_eq!(weights.len(), 1);
        assert!(weights.contains_key(&Metric::CpuUsage));
    }

    #[test]
    fn schema_names_top_level_fields() {
        let schema = serde_json::to_value(EngineConfig::json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("tracked_metrics"));
        assert!(properties.contains_key("state_thresholds"));
    }
}
