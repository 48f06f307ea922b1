//! Precondition errors for numerical kernels.

use thiserror::Error;

/// Errors raised when a kernel's inputs violate its contract.
///
/// Every variant is a caller error: the kernels are deterministic, so
/// retrying with the same inputs yields the same error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// A scalar parameter is outside its documented domain.
    #[error("invalid {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// Two paired sequences have different lengths.
    #[error("length mismatch: {left} has {left_len} items, {right} has {right_len}")]
    LengthMismatch {
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },

    /// Two keyed inputs do not cover the same keys.
    #[error(
        "key mismatch between {left} and {right}: only in {left}: [{}], only in {right}: [{}]",
        .only_left.join(", "),
        .only_right.join(", ")
    )]
    KeyMismatch {
        left: &'static str,
        right: &'static str,
        only_left: Vec<String>,
        only_right: Vec<String>,
    },

    /// Weighted average with weights summing to zero.
    #[error("weights sum to zero")]
    ZeroWeightSum,

    /// Series too short for the requested model.
    #[error("insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A keyed input value is outside its documented range.
    #[error("value for '{key}' out of range: {value} (expected {expected})")]
    OutOfRange {
        key: String,
        value: f64,
        expected: &'static str,
    },
}

/// Result type alias for math kernels.
pub type Result<T> = std::result::Result<T, MathError>;
