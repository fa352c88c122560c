//! The unified error type and exit-code mapping for the CLI.
//!
//! Subsystem errors (configuration, template extraction, parsing, file
//! I/O) are bridged into [`RemoldError`] before they reach the binary,
//! which maps each to a stable process exit code:
//!
//! - `2`: configuration errors (malformed config, bad template ranges,
//!   template extraction failures)
//! - `3`: missing input files
//! - `4`: failures writing transformed output
//! - `10`: internal errors (broken invariants)
//!
//! A clean run exits `0` even when nothing matched. Per-file parse
//! failures are not fatal; they skip the unit and are logged by the
//! coordinator.

use std::fmt;

use thiserror::Error;

/// Exit codes reported by the `remold` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Clean run, with or without matches.
    Success = 0,
    /// Configuration could not be loaded or validated.
    ConfigError = 2,
    /// An input path could not be resolved.
    MissingInput = 3,
    /// Transformed output could not be written.
    WriteError = 4,
    /// A broken internal invariant.
    InternalError = 10,
}

impl ExitStatus {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Unified error type surfaced by the CLI.
#[derive(Debug, Error)]
pub enum RemoldError {
    /// The configuration file could not be read, parsed, or validated.
    /// Template extraction failures also land here: an unextractable
    /// template means the configured ranges do not describe the template
    /// source.
    #[error("configuration error: {message}")]
    MalformedConfig { message: String },

    /// An input file does not exist or could not be read.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Writing a transformed file failed.
    #[error("failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    /// A broken invariant inside the matcher or coordinator.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RemoldError {
    pub fn config(message: impl Into<String>) -> Self {
        RemoldError::MalformedConfig {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        RemoldError::FileNotFound { path: path.into() }
    }

    pub fn write_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        RemoldError::WriteFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RemoldError::Internal {
            message: message.into(),
        }
    }

    /// The exit code this error maps to.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            RemoldError::MalformedConfig { .. } => ExitStatus::ConfigError,
            RemoldError::FileNotFound { .. } => ExitStatus::MissingInput,
            RemoldError::WriteFailed { .. } => ExitStatus::WriteError,
            RemoldError::Internal { .. } => ExitStatus::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::ConfigError.code(), 2);
        assert_eq!(ExitStatus::MissingInput.code(), 3);
        assert_eq!(ExitStatus::WriteError.code(), 4);
        assert_eq!(ExitStatus::InternalError.code(), 10);
    }

    #[test]
    fn config_errors_map_to_config_exit() {
        let err = RemoldError::config("template range is not valid");
        assert_eq!(err.exit_status(), ExitStatus::ConfigError);
        assert_eq!(
            err.to_string(),
            "configuration error: template range is not valid"
        );
    }

    #[test]
    fn missing_file_maps_to_missing_input() {
        let err = RemoldError::file_not_found("demo/input.cc");
        assert_eq!(err.exit_status(), ExitStatus::MissingInput);
    }

    #[test]
    fn write_failure_maps_to_write_error() {
        let err = RemoldError::write_failed("out.cc", "permission denied");
        assert_eq!(err.exit_status(), ExitStatus::WriteError);
        assert_eq!(err.to_string(), "failed to write out.cc: permission denied");
    }
}
