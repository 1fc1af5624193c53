//! Error types and result aliases for the calltrace library.
//!
//! This module defines the core error type [`TracerError`] and the [`Result`] type alias
//! used when building tracers. Failures of the wrapped callables never pass through
//! this type: they are handed back to the caller exactly as the callable produced them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TracerError {
    #[error("Cannot open log sink {}: {source}", .path.display())]
    SinkOpenError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid line format: {0}")]
    FormatError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TracerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_sink_open_error_display() {
        let err = TracerError::SinkOpenError {
            path: PathBuf::from("/nope/error.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        };
        assert_eq!(err.to_string(), "Cannot open log sink /nope/error.log: no such directory");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_format_error_display() {
        let err = TracerError::FormatError("unknown placeholder {host}".to_string());
        assert_eq!(err.to_string(), "Invalid line format: unknown placeholder {host}");
    }

    #[test]
    fn test_config_error_display() {
        let err = TracerError::ConfigError("channel name must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: channel name must not be empty");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: TracerError = json_err.into();

        match err {
            TracerError::SerializationError(_) => {}
            _ => panic!("Expected SerializationError"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TracerError = io_err.into();

        match err {
            TracerError::IoError(_) => {}
            _ => panic!("Expected IoError"),
        }
    }
}
