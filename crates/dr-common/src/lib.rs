//! Device Risk common types, identifiers, and errors.
//!
//! This crate provides the foundational types shared across the engine crates:
//! - Device identity
//! - Metric identifiers and validated metric mappings
//! - Risk states and administrative actions
//! - The unified error type with stable codes
//! - Output format selection for the CLI harness

pub mod error;
pub mod id;
pub mod metric;
pub mod output;
pub mod risk;

pub use error::{Error, ErrorCategory, ErrorReport, Result};
pub use id::DeviceId;
pub use metric::{Metric, MetricSnapshot, MetricValues};
pub use output::OutputFormat;
pub use risk::{AdminAction, RiskState};

/// Schema version stamped on every machine-readable output envelope.
pub const SCHEMA_VERSION: &str = "1.0.0";
