//! Configuration validation errors and semantic validation.

use std::collections::BTreeSet;

use dr_math::MathError;
use thiserror::Error;

use crate::engine::EngineConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

impl From<ValidationError> for dr_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) => dr_common::Error::Config(msg),
            other => dr_common::Error::InvalidConfig(other.to_string()),
        }
    }
}

/// Validate an engine configuration semantically.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_tracked_metrics(config)?;

    if !config.anomaly_threshold.is_finite() || config.anomaly_threshold <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "anomaly_threshold".to_string(),
            message: format!("Must be positive and finite, got {}", config.anomaly_threshold),
        });
    }

    if config.history_limit == 0 {
        return Err(ValidationError::InvalidValue {
            field: "history_limit".to_string(),
            message: "Must be at least 1".to_string(),
        });
    }

    let alpha = config.smoothing.ema_alpha;
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(ValidationError::InvalidValue {
            field: "smoothing.ema_alpha".to_string(),
            message: format!("Must be in (0, 1], got {}", alpha),
        });
    }

    config
        .smoothing
        .holt_winters
        .params()
        .validate()
        .map_err(|e| math_to_invalid("smoothing.holt_winters", e))?;

    for (name, value) in [("k", config.sigmoid.k), ("x0", config.sigmoid.x0)] {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("sigmoid.{}", name),
                message: format!("Must be finite, got {}", value),
            });
        }
    }

    validate_risk_weights(config)?;

    let thresholds = &config.state_thresholds;
    for (name, value) in [
        ("warning", thresholds.warning),
        ("critical", thresholds.critical),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: format!("state_thresholds.{}", name),
                message: format!("Must be finite, got {}", value),
            });
        }
    }
    if thresholds.warning > thresholds.critical {
        return Err(ValidationError::SemanticError(format!(
            "state_thresholds.warning ({}) must not exceed state_thresholds.critical ({})",
            thresholds.warning, thresholds.critical
        )));
    }

    let rate = config.decay.rate_per_hour;
    if !rate.is_finite() || rate < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "decay.rate_per_hour".to_string(),
            message: format!("Must be finite and >= 0, got {}", rate),
        });
    }

    Ok(())
}

fn validate_tracked_metrics(config: &EngineConfig) -> ValidationResult<()> {
    if config.tracked_metrics.is_empty() {
        return Err(ValidationError::MissingField("tracked_metrics".to_string()));
    }
    let mut seen = BTreeSet::new();
    for metric in &config.tracked_metrics {
        if !seen.insert(metric) {
            return Err(ValidationError::InvalidValue {
                field: "tracked_metrics".to_string(),
                message: format!("Duplicate metric {}", metric),
            });
        }
    }
    Ok(())
}

/// Every tracked metric needs a weight and every weight a tracked metric.
fn validate_risk_weights(config: &EngineConfig) -> ValidationResult<()> {
    for metric in &config.tracked_metrics {
        if !config.risk_weights.contains_key(metric) {
            return Err(ValidationError::MissingField(format!(
                "risk_weights.{}",
                metric
            )));
        }
    }
    for (metric, weight) in &config.risk_weights {
        if !config.tracked_metrics.contains(metric) {
            return Err(ValidationError::SemanticError(format!(
                "risk_weights.{} is set but {} is not a tracked metric",
                metric, metric
            )));
        }
        if !weight.is_finite() || *weight < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: format!("risk_weights.{}", metric),
                message: format!("Must be finite and >= 0, got {}", weight),
            });
        }
    }
    Ok(())
}

fn math_to_invalid(prefix: &str, err: MathError) -> ValidationError {
    match err {
        MathError::InvalidParameter {
            name,
            value,
            expected,
        } => ValidationError::InvalidValue {
            field: format!("{}.{}", prefix, name),
            message: format!("Expected {}, got {}", expected, value),
        },
        other => ValidationError::SemanticError(format!("{}: {}", prefix, other)),
    }
}
