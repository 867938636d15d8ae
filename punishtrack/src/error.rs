//! Error types for `punishtrack`
//!
//! Configuration problems are surfaced when a pipeline is built, input
//! problems at the frame boundary. Nothing inside the per-tick fold returns
//! an error.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `punishtrack` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure, unresolved variable)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Frame input error (malformed line, out-of-order frame)
    pub const INPUT_ERROR: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `punishtrack` operations.
#[derive(Debug, Error)]
pub enum PunishTrackError {
    /// Subscription configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Frame input error
    #[error(transparent)]
    Input(#[from] InputError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PunishTrackError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Input(_) | Self::Json(_) => ExitCode::INPUT_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Subscription configuration errors.
///
/// Raised synchronously while a composer is being built, never while
/// events are flowing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML/JSON parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path (or label) of the configuration
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// A `$`-prefixed reference has no entry in the variable table
    #[error("variable '{name}' is not defined (referenced at {location})")]
    UnresolvedVariable {
        /// Variable key, including the marker
        name: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "events[2].filter.criteria")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the configuration from being used
    Error,
    /// Informational; the configuration still loads
    Warning,
}

// ============================================================================
// Input Errors
// ============================================================================

/// Errors raised at the frame-input boundary, before any state machine runs.
#[derive(Debug, Error)]
pub enum InputError {
    /// A line could not be decoded into a contest or frame record
    #[error("malformed input at line {line}: {message}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// Decoder message
        message: String,
    },

    /// A frame arrived whose index does not advance past the previous one
    #[error("frame {frame} does not follow frame {previous} (line {line})")]
    OutOfOrder {
        /// 1-based line number
        line: usize,
        /// Index of the previously accepted frame
        previous: i32,
        /// Index of the offending frame
        frame: i32,
    },

    /// Reading the input failed
    #[error("input I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `punishtrack` operations.
pub type Result<T> = std::result::Result<T, PunishTrackError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::INPUT_ERROR, 4);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: PunishTrackError = ConfigError::MissingFile {
            path: PathBuf::from("/subs.yaml"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_input_error_exit_code() {
        let err: PunishTrackError = InputError::OutOfOrder {
            line: 3,
            previous: 10,
            frame: 10,
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::INPUT_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: PunishTrackError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "events[0].id".to_string(),
            message: "id must not be empty".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(issue.to_string(), "error: id must not be empty at events[0].id");
    }

    #[test]
    fn test_unresolved_variable_display() {
        let err = ConfigError::UnresolvedVariable {
            name: "$strong".to_string(),
            location: "events[1].filter.criteria".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("$strong"));
        assert!(msg.contains("events[1].filter.criteria"));
    }

    #[test]
    fn test_malformed_input_display() {
        let err = InputError::Malformed {
            line: 7,
            message: "missing field `frame`".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed input at line 7: missing field `frame`"
        );
    }
}
