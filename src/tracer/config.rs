//! Construction settings for a [`CallTracer`](super::CallTracer)
//!
//! A `TracerConfig` is built once, either with the builder methods or from JSON,
//! and handed to the tracer, which keeps its own copy for its whole lifetime.

use crate::error::{Result, TracerError};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::line_format::LineFormat;

pub const DEFAULT_LOG_PATH: &str = "error.log";
pub const DEFAULT_CHANNEL_NAME: &str = "ErrorHandler";
pub const DEFAULT_LINE_FORMAT: &str = "{timestamp}\t{channel}\t{level}\t{message}";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// How the log file is opened when a sink is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Keep prior content and add records at the end
    #[default]
    Append,
    /// Clear the file on open
    Truncate,
}

impl FromStr for OpenMode {
    type Err = TracerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "append" | "a" => Ok(OpenMode::Append),
            "truncate" | "w" => Ok(OpenMode::Truncate),
            other => Err(TracerError::ConfigError(format!("unknown open mode '{}'", other))),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Append => write!(f, "append"),
            OpenMode::Truncate => write!(f, "truncate"),
        }
    }
}

/// What happens when a sink is attached to a channel that may already carry one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkPolicy {
    /// Every construction attaches another sink, so records for the channel
    /// are written once per attachment.
    #[default]
    Accumulate,
    /// At most one sink per (channel, log path); an existing one is reused
    /// without reopening the file. The reused sink keeps the open mode, line format
    /// and timestamp format it was opened with; a tracer asking for different ones
    /// logs a warning and writes in the existing sink's format.
    Idempotent,
}

/// Configuration for a call tracer
///
/// All fields are optional when loading from JSON; missing ones take the defaults
/// (`error.log`, `ErrorHandler`, append mode, tab-separated line format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Destination file for trace and error records
    pub log_path: PathBuf,
    /// Logical channel the tracer writes to
    pub channel_name: String,
    /// Whether the log file is appended to or cleared on open
    pub open_mode: OpenMode,
    /// Line template with `{timestamp}`, `{channel}`, `{level}` and `{message}`
    pub line_format: String,
    /// chrono strftime pattern used for `{timestamp}`
    pub timestamp_format: String,
    /// Mirror trace and error lines to standard output
    pub console: bool,
    /// Attachment behavior when a channel is reused
    pub sink_policy: SinkPolicy,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            open_mode: OpenMode::default(),
            line_format: DEFAULT_LINE_FORMAT.to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            console: true,
            sink_policy: SinkPolicy::default(),
        }
    }
}

impl TracerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = log_path.into();
        self
    }

    pub fn with_channel_name(mut self, channel_name: impl Into<String>) -> Self {
        self.channel_name = channel_name.into();
        self
    }

    pub fn with_open_mode(mut self, open_mode: OpenMode) -> Self {
        self.open_mode = open_mode;
        self
    }

    pub fn with_line_format(mut self, line_format: impl Into<String>) -> Self {
        self.line_format = line_format.into();
        self
    }

    pub fn with_timestamp_format(mut self, timestamp_format: impl Into<String>) -> Self {
        self.timestamp_format = timestamp_format.into();
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_sink_policy(mut self, sink_policy: SinkPolicy) -> Self {
        self.sink_policy = sink_policy;
        self
    }

    /// Parse a configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check the settings that would otherwise only fail once records are written
    pub fn validate(&self) -> Result<()> {
        if self.channel_name.trim().is_empty() {
            return Err(TracerError::ConfigError("channel name must not be empty".to_string()));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(TracerError::ConfigError("log path must not be empty".to_string()));
        }
        check_timestamp_format(&self.timestamp_format)?;
        LineFormat::parse(&self.line_format)?;
        Ok(())
    }
}

/// Reject chrono strftime patterns containing unknown specifiers
pub(crate) fn check_timestamp_format(timestamp_format: &str) -> Result<()> {
    if StrftimeItems::new(timestamp_format).any(|item| matches!(item, Item::Error)) {
        return Err(TracerError::ConfigError(format!(
            "invalid timestamp format '{}'",
            timestamp_format
        )));
    }
    Ok(())
}
