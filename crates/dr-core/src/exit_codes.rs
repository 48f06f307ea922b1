//! Exit codes for the dr-core CLI.
//!
//! Ranges:
//! - 0-9: operational outcomes (parse the outcome from the code, not output)
//! - 10-19: user or input errors (fixable by the caller)
//! - 20-29: internal errors

use dr_common::{Error, ErrorCategory};

/// Process exit codes. Stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded and nothing needs attention.
    Clean = 0,

    /// Command succeeded and at least one device is anomalous or escalated.
    AnomaliesFound = 1,

    /// Invalid arguments.
    ArgsError = 10,

    /// Engine configuration missing, unreadable or invalid.
    ConfigError = 11,

    /// Fleet snapshot unreadable, or its data fails analytics preconditions.
    InputError = 12,

    /// Internal error (bug).
    InternalError = 20,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Stable name for JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::AnomaliesFound => "OK_ANOMALIES",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::InternalError => "ERR_INTERNAL",
        }
    }

    /// Exit code for an engine error.
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::StaleTransition { .. } => ExitCode::InternalError,
            _ => match error.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Store | ErrorCategory::Analytics | ErrorCategory::Io => {
                    ExitCode::InputError
                }
                ErrorCategory::State => ExitCode::ArgsError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
