//! Named channels and the registry that hands them out
//!
//! A channel is the logical log identity a tracer writes to. Tracers built with the
//! same channel name share one [`Channel`], so every record any of them emits goes to
//! every sink attached to it. The registry is an ordinary value; [`ChannelRegistry::global`]
//! is only the default instance used by [`CallTracer::new`](super::CallTracer::new).

use super::config::SinkPolicy;
use super::log_sink::LogSink;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{debug, warn, Level};

/// A named set of sinks with a minimum severity
#[derive(Debug)]
pub struct Channel {
    name: String,
    sinks: RwLock<Vec<Arc<LogSink>>>,
    min_level: RwLock<Level>,
}

impl Channel {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sinks: RwLock::new(Vec::new()),
            min_level: RwLock::new(Level::INFO),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of sink attachments, counting repeats
    pub fn sink_count(&self) -> usize {
        self.sinks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Set the least severe level that is still written
    pub fn set_min_level(&self, level: Level) {
        *self.min_level.write().unwrap_or_else(PoisonError::into_inner) = level;
    }

    pub fn min_level(&self) -> Level {
        *self.min_level.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a record at `level` passes the channel's threshold
    pub fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: ERROR < WARN < INFO < DEBUG < TRACE
        level <= self.min_level()
    }

    /// Attach a sink, or return the existing one for the same path under
    /// [`SinkPolicy::Idempotent`]
    ///
    /// `open` is only called when a new sink is needed.
    pub fn attach<F>(&self, path: &Path, policy: SinkPolicy, open: F) -> crate::Result<Arc<LogSink>>
    where
        F: FnOnce() -> crate::Result<LogSink>,
    {
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        let existing = sinks.iter().find(|s| s.path() == path).cloned();

        if let (SinkPolicy::Idempotent, Some(sink)) = (policy, &existing) {
            debug!(channel = %self.name, path = %path.display(), "reusing attached log sink");
            return Ok(Arc::clone(sink));
        }

        let sink = Arc::new(open()?);
        if existing.is_some() {
            warn!(
                channel = %self.name,
                path = %path.display(),
                attachments = sinks.len() + 1,
                "log sink attached again; records on this channel will be duplicated"
            );
        } else {
            debug!(channel = %self.name, path = %path.display(), "attached log sink");
        }
        sinks.push(Arc::clone(&sink));
        Ok(sink)
    }

    /// Write a record to every attached sink
    ///
    /// A failing sink is reported and skipped; the remaining sinks still receive the record.
    pub fn emit(&self, level: Level, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter() {
            if let Err(e) = sink.write_record(&self.name, level, message) {
                warn!(
                    channel = %self.name,
                    path = %sink.path().display(),
                    error = %e,
                    "failed to write log record"
                );
            }
        }
    }
}

/// Name-keyed set of channels
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<Channel>>>,
}

static GLOBAL_REGISTRY: OnceLock<ChannelRegistry> = OnceLock::new();

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static ChannelRegistry {
        GLOBAL_REGISTRY.get_or_init(ChannelRegistry::new)
    }

    /// Get the channel called `name`, creating it on first use
    pub fn channel(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.get(name) {
            return channel;
        }
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            channels
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Channel::new(name))),
        )
    }

    /// Look up an existing channel
    pub fn get(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
