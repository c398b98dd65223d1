// Error types for the analysis library
//
// This module defines the error type for configuration loading, providing
// structured error handling with error codes suitable for host-facing
// reporting. The numeric pipeline itself never fails; setters clip or
// ignore invalid values instead of returning errors.

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// host boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log a configuration error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_config_error(err: &ConfigError) {
    error!(
        "Config error: code={}, component=Config, message={}",
        err.code(),
        err.message()
    );
}

/// Configuration loading errors
///
/// These errors cover reading and parsing the JSON configuration file.
///
/// Error code ranges: 1001-1002
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file could not be read
    ReadFailed { path: String, details: String },

    /// Configuration contents could not be parsed
    ParseFailed { details: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::ReadFailed { .. } => 1001,
            ConfigError::ParseFailed { .. } => 1002,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::ReadFailed { path, details } => {
                format!("Failed to read config file {}: {}", path, details)
            }
            ConfigError::ParseFailed { details } => {
                format!("Failed to parse config: {}", details)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}

/// Convert from std::io::Error to ConfigError
impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::ReadFailed {
            path: "unknown".to_string(),
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes() {
        assert_eq!(
            ConfigError::ReadFailed {
                path: "test.json".to_string(),
                details: "test".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            ConfigError::ParseFailed {
                details: "test".to_string()
            }
            .code(),
            1002
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ReadFailed {
            path: "analysis.json".to_string(),
            details: "No such file".to_string(),
        };
        assert!(err.message().contains("analysis.json"));
        assert!(err.message().contains("No such file"));
        assert!(err.to_string().contains("code 1001"));

        let err = ConfigError::ParseFailed {
            details: "expected value at line 1".to_string(),
        };
        assert!(err.message().contains("expected value"));
    }

    #[test]
    fn test_error_code_trait() {
        let err: &dyn ErrorCode = &ConfigError::ParseFailed {
            details: "test".to_string(),
        };
        assert_eq!(err.code(), 1002);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test error");
        let config_err: ConfigError = io_err.into();

        match config_err {
            ConfigError::ReadFailed { details, .. } => {
                assert!(details.contains("test error"));
            }
            _ => panic!("Expected ReadFailed variant"),
        }
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), ConfigError> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into())
        }

        fn caller() -> Result<(), ConfigError> {
            may_fail()?;
            Ok(())
        }

        assert!(caller().is_err());
    }
}
