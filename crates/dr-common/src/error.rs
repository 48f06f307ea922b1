//! Error types for the Device Risk engine.
//!
//! Every error carries:
//! - a stable numeric code for machine parsing
//! - a category for grouping
//! - a recoverability hint for automation
//! - a remediation hint for humans
//!
//! Errors render to a structured JSON report:
//! ```json
//! {
//!   "code": 22,
//!   "category": "store",
//!   "message": "non-finite value for cpu_usage: NaN",
//!   "recoverable": false,
//!   "context": { "metric": "cpu_usage" }
//! }
//! ```

use std::collections::HashMap;

use dr_math::MathError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Engine configuration errors.
    Config,
    /// Telemetry store and input data errors.
    Store,
    /// Numerical precondition violations.
    Analytics,
    /// Risk state and admin action errors.
    State,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Store => write!(f, "store"),
            ErrorCategory::Analytics => write!(f, "analytics"),
            ErrorCategory::State => write!(f, "state"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the Device Risk engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    // Store errors (20-29)
    #[error("statistics store failure: {0}")]
    Store(String),

    #[error("device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("non-finite value for {metric}: {value}")]
    InvalidTelemetry { metric: String, value: f64 },

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    // Analytics errors (30-39)
    #[error("analytics precondition violated: {0}")]
    Analytics(#[from] MathError),

    // State errors (40-49)
    #[error("unknown risk state: {0}")]
    UnknownRiskState(String),

    #[error("unknown admin action: {0}")]
    UnknownAdminAction(String),

    #[error("invalid state thresholds: warning={warning}, critical={critical}")]
    InvalidThresholds { warning: f64, critical: f64 },

    #[error("stale transition for {device_id}: computed from {expected}, device is {actual}")]
    StaleTransition {
        device_id: String,
        expected: String,
        actual: String,
    },

    #[error("risk factor name is reserved: {0}")]
    ReservedFactor(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Store errors
    /// - 30-39: Analytics errors
    /// - 40-49: State errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig(_) => 11,
            Error::Store(_) => 20,
            Error::DeviceNotFound { .. } => 21,
            Error::InvalidTelemetry { .. } => 22,
            Error::UnknownMetric(_) => 23,
            Error::Analytics(_) => 30,
            Error::UnknownRiskState(_) => 40,
            Error::UnknownAdminAction(_) => 41,
            Error::InvalidThresholds { .. } => 42,
            Error::StaleTransition { .. } => 43,
            Error::ReservedFactor(_) => 44,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the category for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => ErrorCategory::Config,
            Error::Store(_)
            | Error::DeviceNotFound { .. }
            | Error::InvalidTelemetry { .. }
            | Error::UnknownMetric(_) => ErrorCategory::Store,
            Error::Analytics(_) => ErrorCategory::Analytics,
            Error::UnknownRiskState(_)
            | Error::UnknownAdminAction(_)
            | Error::InvalidThresholds { .. }
            | Error::StaleTransition { .. }
            | Error::ReservedFactor(_) => ErrorCategory::State,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether retrying the same call might succeed.
    ///
    /// Engine computations are deterministic, so only store and I/O
    /// failures are worth retrying.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Io(_))
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) | Error::InvalidConfig(_) => {
                "Run 'dr-core check' to validate the configuration, or remove it to use defaults"
            }
            Error::Store(_) => "Check that the telemetry source is reachable and retry",
            Error::DeviceNotFound { .. } => "List devices in the fleet snapshot and check the id",
            Error::InvalidTelemetry { .. } => {
                "Drop the metric from the record instead of sending a non-finite value"
            }
            Error::UnknownMetric(_) => {
                "Use one of: cpu_usage, memory_usage, disk_usage, vulnerability_score, network_usage, temperature"
            }
            Error::Analytics(_) => "Check the input lengths, keys, and parameter ranges",
            Error::UnknownRiskState(_) => "Use one of: normal, warning, critical",
            Error::UnknownAdminAction(_) => "Use one of: none, mitigated",
            Error::InvalidThresholds { .. } => {
                "Set both thresholds to finite values with warning <= critical"
            }
            Error::StaleTransition { .. } => "Re-run the assessment against the current device state",
            Error::ReservedFactor(_) => "Rename the external factor; anomaly_risk is set by the engine",
            Error::Io(_) => "Check the file path and permissions",
            Error::Json(_) => "Check that the input is well-formed JSON",
        }
    }

    /// Short headline for human-facing output.
    pub fn headline(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Config => "Configuration Error",
            ErrorCategory::Store => "Telemetry Error",
            ErrorCategory::Analytics => "Analytics Error",
            ErrorCategory::State => "Risk State Error",
            ErrorCategory::Io => "I/O Error",
        }
    }
}

/// Machine-readable error report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (device id, metric, thresholds).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::DeviceNotFound { device_id } => {
                context.insert("device_id".to_string(), serde_json::json!(device_id));
            }
            Error::InvalidTelemetry { metric, .. } => {
                context.insert("metric".to_string(), serde_json::json!(metric));
            }
            Error::StaleTransition { device_id, .. } => {
                context.insert("device_id".to_string(), serde_json::json!(device_id));
            }
            Error::InvalidThresholds { warning, critical } => {
                context.insert("warning".to_string(), serde_json::json!(warning));
                context.insert("critical".to_string(), serde_json::json!(critical));
            }
            _ => {}
        }

        ErrorReport {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl ErrorReport {
    /// Add additional context to the report.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error) -> String {
    format!(
        "✗ {}\n  Reason: {}\n  Fix: {}",
        err.headline(),
        err,
        err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(
            Error::DeviceNotFound {
                device_id: "d1".into()
            }
            .code(),
            21
        );
        assert_eq!(Error::UnknownAdminAction("pause".into()).code(), 41);
        assert_eq!(Error::Analytics(MathError::ZeroWeightSum).code(), 30);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::InvalidConfig("x".into()).category(), ErrorCategory::Config);
        assert_eq!(Error::UnknownMetric("x".into()).category(), ErrorCategory::Store);
        assert_eq!(
            Error::InvalidThresholds {
                warning: 2.0,
                critical: 1.0
            }
            .category(),
            ErrorCategory::State
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::Store("timeout".into()).is_recoverable());
        assert!(!Error::Analytics(MathError::ZeroWeightSum).is_recoverable());
        assert!(!Error::UnknownRiskState("x".into()).is_recoverable());
    }

    #[test]
    fn math_errors_convert_with_question_mark() {
        fn inner() -> Result<f64> {
            Ok(dr_math::wma(&[1.0], &[0.0])?)
        }
        let err = inner().unwrap_err();
        assert!(matches!(err, Error::Analytics(MathError::ZeroWeightSum)));
    }

    #[test]
    fn test_error_report_from_error() {
        let err = Error::InvalidTelemetry {
            metric: "cpu_usage".into(),
            value: f64::NAN,
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, 22);
        assert_eq!(report.category, ErrorCategory::Store);
        assert!(!report.recoverable);
        assert_eq!(report.context["metric"], "cpu_usage");
    }

    #[test]
    fn test_error_report_json() {
        let report = ErrorReport::from(&Error::UnknownAdminAction("pause".into()))
            .with_context("input", "pause");
        let json = report.to_json();
        assert!(json.contains("\"code\":41"));
        assert!(json.contains("\"category\":\"state\""));
        assert!(json.contains("\"input\":\"pause\""));
    }

    #[test]
    fn test_format_error_human() {
        let text = format_error_human(&Error::UnknownRiskState("high".into()));
        assert!(text.contains("Risk State Error"));
        assert!(text.contains("unknown risk state: high"));
        assert!(text.contains("Fix: Use one of: normal, warning, critical"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Analytics.to_string(), "analytics");
        assert_eq!(ErrorCategory::Io.to_string(), "io");
    }
}
