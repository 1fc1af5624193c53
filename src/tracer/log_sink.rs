//! File-backed destination for trace and error records

use super::config::{check_timestamp_format, OpenMode};
use super::line_format::{LineFormat, RecordFields};
use crate::error::{Result, TracerError};
use chrono::Local;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::Level;

/// An open log file plus the format its records are written in
///
/// Each record is rendered completely and written while holding the file lock,
/// so records from concurrent callers never interleave.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: Mutex<File>,
    mode: OpenMode,
    format: LineFormat,
    timestamp_format: String,
}

impl LogSink {
    /// Open (creating if needed) the file at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Destination file
    /// * `mode` - Append to prior content or clear it
    /// * `format` - Parsed line template
    /// * `timestamp_format` - chrono strftime pattern for the `{timestamp}` field
    pub fn open(
        path: impl AsRef<Path>,
        mode: OpenMode,
        format: LineFormat,
        timestamp_format: impl Into<String>,
    ) -> Result<Self> {
        let timestamp_format = timestamp_format.into();
        check_timestamp_format(&timestamp_format)?;

        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Append => options.append(true),
            OpenMode::Truncate => options.write(true).truncate(true),
        };

        let file = options.open(&path).map_err(|source| TracerError::SinkOpenError {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
            mode,
            format,
            timestamp_format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open_mode(&self) -> OpenMode {
        self.mode
    }

    pub fn format(&self) -> &LineFormat {
        &self.format
    }

    pub fn timestamp_format(&self) -> &str {
        &self.timestamp_format
    }

    /// Whether this sink writes records the way the given settings would
    pub fn has_settings(&self, mode: OpenMode, format: &LineFormat, timestamp_format: &str) -> bool {
        self.mode == mode && &self.format == format && self.timestamp_format == timestamp_format
    }

    /// Render and write one record, flushing afterwards
    pub fn write_record(&self, channel: &str, level: Level, message: &str) -> std::io::Result<()> {
        let mut timestamp = String::new();
        let _ = write!(timestamp, "{}", Local::now().format(&self.timestamp_format));

        let mut line = self.format.render(&RecordFields {
            timestamp: &timestamp,
            channel,
            level: level.as_str(),
            message,
        });
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open(path: &Path, mode: OpenMode) -> LogSink {
        LogSink::open(path, mode, LineFormat::default(), "%Y-%m-%d %H:%M:%S,%3f").unwrap()
    }

    #[test]
    fn test_write_record_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.log");
        let sink = open(&path, OpenMode::Append);

        sink.write_record("ErrorHandler", Level::INFO, "TRACE: calling f() with (), {}")
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let re = Regex::new(
            r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}\tErrorHandler\tINFO\tTRACE: calling f\(\) with \(\), \{\}\n$",
        )
        .unwrap();
        assert!(re.is_match(&content), "unexpected line: {:?}", content);
    }

    #[test]
    fn test_append_keeps_prior_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let sink = open(&path, OpenMode::Append);
        sink.write_record("c", Level::ERROR, "boom").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("earlier\n"));
        assert!(content.ends_with("\tc\tERROR\tboom\n"));
    }

    #[test]
    fn test_truncate_clears_prior_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.log");
        std::fs::write(&path, "earlier\n").unwrap();

        let sink = open(&path, OpenMode::Truncate);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        sink.write_record("c", Level::INFO, "fresh").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("earlier"));
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_open_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("error.log");

        let err = LogSink::open(&path, OpenMode::Append, LineFormat::default(), "%H").unwrap_err();
        match err {
            TracerError::SinkOpenError { path: p, .. } => assert_eq!(p, path),
            other => panic!("Expected SinkOpenError, got {:?}", other),
        }
    }

    #[test]
    fn test_open_rejects_bad_timestamp_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.log");

        let err = LogSink::open(&path, OpenMode::Append, LineFormat::default(), "%Y-%Q").unwrap_err();
        assert!(matches!(err, TracerError::ConfigError(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_has_settings() {
        let dir = TempDir::new().unwrap();
        let sink = open(&dir.path().join("error.log"), OpenMode::Append);
        let custom = LineFormat::parse("[{level}] {message}").unwrap();

        assert_eq!(sink.open_mode(), OpenMode::Append);
        assert_eq!(sink.timestamp_format(), "%Y-%m-%d %H:%M:%S,%3f");
        assert!(sink.has_settings(OpenMode::Append, &LineFormat::default(), "%Y-%m-%d %H:%M:%S,%3f"));
        assert!(!sink.has_settings(OpenMode::Truncate, &LineFormat::default(), "%Y-%m-%d %H:%M:%S,%3f"));
        assert!(!sink.has_settings(OpenMode::Append, &custom, "%Y-%m-%d %H:%M:%S,%3f"));
        assert!(!sink.has_settings(OpenMode::Append, &LineFormat::default(), "%H:%M"));
    }

    #[test]
    fn test_concurrent_writes_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.log");
        let sink = Arc::new(open(&path, OpenMode::Append));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let message = format!("thread-{}-record-{}-{}", t, i, "x".repeat(200));
                        sink.write_record("c", Level::INFO, &message).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let re = Regex::new(r"^\S+ \S+\tc\tINFO\tthread-\d+-record-\d+-x{200}$").unwrap();
        assert_eq!(content.lines().count(), 400);
        for line in content.lines() {
            assert!(re.is_match(line), "interleaved line: {:?}", line);
        }
    }
}
