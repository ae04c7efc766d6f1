//! Error types and handling infrastructure for pumlpad.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! the library error type. The binary adds `anyhow` context on top of it.
//!
//! ## Design Principles
//!
//! - **Structured at the edge**: The bridge converts every variant into a result value
//! - **Context preservation**: Include relevant information for debugging
//! - **Consistency**: Standardized Result type across all modules

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// The main error type for pumlpad operations.
#[derive(Error, Debug)]
pub enum PumlpadError {
    /// No complete document arrived from the engine before the deadline
    #[error("Render timed out after {} ms", .timeout.as_millis())]
    RenderTimeout { timeout: Duration },

    /// The batch engine run failed or produced no output file
    #[error("Export failed: {message}")]
    ExportFailed { message: String },

    /// The user dismissed a file dialog
    #[error("Dialog canceled")]
    DialogCanceled,

    /// File system related errors (read, write, copy, temp files)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine executable could not be started
    #[error("Failed to start engine {}: {source}", .program.display())]
    EngineSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine exited while a request was still waiting for its document
    #[error("Engine exited{}", format_status(.status))]
    EngineExited { status: Option<ExitStatus> },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

fn format_status(status: &Option<ExitStatus>) -> String {
    match status {
        Some(status) => format!(" ({status})"),
        None => String::new(),
    }
}

/// Standard Result type for pumlpad operations.
pub type Result<T> = std::result::Result<T, PumlpadError>;

impl PumlpadError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create an ExportFailed error with a descriptive message
    pub fn export_failed(message: impl Into<String>) -> Self {
        Self::ExportFailed {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether this error is the render deadline expiring
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RenderTimeout { .. })
    }
}

// Automatic conversion from io::Error to PumlpadError
impl From<std::io::Error> for PumlpadError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let timeout = PumlpadError::RenderTimeout {
            timeout: Duration::from_millis(5000),
        };
        assert_eq!(timeout.to_string(), "Render timed out after 5000 ms");

        let export = PumlpadError::export_failed("Syntax Error?");
        assert_eq!(export.to_string(), "Export failed: Syntax Error?");

        let exited = PumlpadError::EngineExited { status: None };
        assert_eq!(exited.to_string(), "Engine exited");

        let spawn = PumlpadError::EngineSpawn {
            program: PathBuf::from("/opt/jre/bin/java"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(
            spawn.to_string(),
            "Failed to start engine /opt/jre/bin/java: no such file"
        );
    }

    #[test]
    fn test_timeout_predicate() {
        assert!(PumlpadError::RenderTimeout {
            timeout: Duration::from_secs(1)
        }
        .is_timeout());
        assert!(!PumlpadError::DialogCanceled.is_timeout());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PumlpadError = io_err.into();

        match err {
            PumlpadError::FileError { message, .. } => {
                assert_eq!(message, "Permission denied");
            }
            _ => panic!("Expected FileError variant"),
        }
    }
}
