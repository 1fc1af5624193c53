//! The call tracer and the wrapped callables it produces
//!
//! A [`CallTracer`] owns one attachment to a channel. [`CallTracer::wrap`] turns any
//! callable into a [`Traced`] callable that announces each call before running it and
//! records any failure before handing it back untouched.

use super::channel::{Channel, ChannelRegistry};
use super::config::TracerConfig;
use super::invocation::{InvocationRecord, Invoke, TraceArgs};
use super::line_format::LineFormat;
use super::log_sink::LogSink;
use crate::error::Result;
use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn, Level};

type ConsoleWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes trace and error records for wrapped callables
///
/// Cloning is cheap and clones share the same channel, sink and console.
#[derive(Clone)]
pub struct CallTracer {
    config: Arc<TracerConfig>,
    channel: Arc<Channel>,
    sink: Arc<LogSink>,
    console: Option<ConsoleWriter>,
}

impl CallTracer {
    /// Create a tracer attached to the process-wide channel registry
    ///
    /// Fails when the configuration is invalid or the log file cannot be opened.
    pub fn new(config: TracerConfig) -> Result<Self> {
        Self::with_registry(config, ChannelRegistry::global())
    }

    /// Create a tracer whose channel comes from `registry`
    pub fn with_registry(config: TracerConfig, registry: &ChannelRegistry) -> Result<Self> {
        config.validate()?;
        let format = LineFormat::parse(&config.line_format)?;

        let channel = registry.channel(&config.channel_name);
        let sink = channel.attach(&config.log_path, config.sink_policy, || {
            LogSink::open(
                &config.log_path,
                config.open_mode,
                format.clone(),
                config.timestamp_format.clone(),
            )
        })?;
        if !sink.has_settings(config.open_mode, &format, &config.timestamp_format) {
            warn!(
                channel = %config.channel_name,
                path = %config.log_path.display(),
                "reusing log sink opened with different settings; open mode, line format and timestamp format of this tracer are ignored"
            );
        }
        channel.set_min_level(Level::INFO);

        debug!(
            channel = %config.channel_name,
            path = %config.log_path.display(),
            mode = %config.open_mode,
            "call tracer ready"
        );

        let console = if config.console {
            let stdout: Box<dyn Write + Send> = Box::new(std::io::stdout());
            Some(Arc::new(Mutex::new(stdout)))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            channel,
            sink,
            console,
        })
    }

    /// Send console lines to `writer` instead of standard output
    pub fn with_console(mut self, writer: impl Write + Send + 'static) -> Self {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        self.console = Some(Arc::new(Mutex::new(writer)));
        self
    }

    /// Stop mirroring records to the console
    pub fn without_console(mut self) -> Self {
        self.console = None;
        self
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    /// The sink this tracer attached (or reused) at construction
    pub fn sink(&self) -> &Arc<LogSink> {
        &self.sink
    }

    pub fn log_path(&self) -> &Path {
        &self.config.log_path
    }

    /// Wrap `func` so every call through the result is traced under `name`
    pub fn wrap<F>(&self, name: impl Into<String>, func: F) -> Traced<F> {
        Traced {
            name: name.into(),
            func,
            tracer: self.clone(),
        }
    }

    fn trace_call(&self, name: &str, args: &InvocationRecord) {
        let message = format!("TRACE: calling {}() with {}", name, args);
        self.console_line(&message);
        self.channel.emit(Level::INFO, &message);
    }

    /// Print the short `message` and write `description` with a backtrace to the channel
    fn record_failure(&self, message: &str, description: &str) {
        self.console_line(&format!(
            "ERROR: {}. See {} for more details",
            message,
            self.config.log_path.display()
        ));
        let backtrace = Backtrace::force_capture();
        self.channel
            .emit(Level::ERROR, &format!("{}\nBacktrace:\n{}", description, backtrace));
    }

    fn console_line(&self, line: &str) {
        let Some(console) = &self.console else {
            return;
        };
        let mut out = console.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!(error = %e, "failed to write trace line to console");
        }
    }
}

impl fmt::Debug for CallTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTracer")
            .field("config", &self.config)
            .field("channel", &self.channel.name())
            .field("console", &self.console.is_some())
            .finish()
    }
}

/// A callable wrapped by a [`CallTracer`]
#[derive(Clone)]
pub struct Traced<F> {
    name: String,
    func: F,
    tracer: CallTracer,
}

impl<F> Traced<F> {
    /// Name used in trace records
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracer(&self) -> &CallTracer {
        &self.tracer
    }

    /// Call a fallible callable
    ///
    /// Returns exactly what the callable returns. An `Err` is recorded, with its
    /// `Debug` rendering and source chain, before it is returned; a panic is recorded and then resumed with its original payload.
    pub fn call<Args, R, E>(&self, args: Args) -> std::result::Result<R, E>
    where
        F: Invoke<Args, Output = std::result::Result<R, E>>,
        Args: TraceArgs,
        E: fmt::Display + fmt::Debug,
    {
        self.tracer.trace_call(&self.name, &args.record());

        match panic::catch_unwind(AssertUnwindSafe(|| self.func.invoke(args))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                // alternate Display and Debug carry the source chain (anyhow, thiserror)
                self.tracer
                    .record_failure(&e.to_string(), &format!("{:#}\nError: {:?}", e, e));
                Err(e)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                self.tracer.record_failure(message, message);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Call a callable that signals failure by panicking
    ///
    /// The return value passes through unchanged. A panic is recorded and then
    /// resumed with its original payload.
    pub fn invoke<Args>(&self, args: Args) -> F::Output
    where
        F: Invoke<Args>,
        Args: TraceArgs,
    {
        self.tracer.trace_call(&self.name, &args.record());

        match panic::catch_unwind(AssertUnwindSafe(|| self.func.invoke(args))) {
            Ok(value) => value,
            Err(payload) => {
                let message = panic_message(&*payload);
                self.tracer.record_failure(message, message);
                panic::resume_unwind(payload)
            }
        }
    }
}

impl<F> fmt::Debug for Traced<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traced")
            .field("name", &self.name)
            .field("tracer", &self.tracer)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

/// Last segment of a path as produced by `stringify!`, e.g. `math :: divide` -> `divide`
#[doc(hidden)]
pub fn callable_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// Wrap a function, using its own name in trace records
///
/// ```rust,ignore
/// let divide = trace_fn!(tracer, math::divide);
/// divide.call((6, 3))?;  // TRACE: calling divide() with (6, 3), {}
/// ```
#[macro_export]
macro_rules! trace_fn {
    ($tracer:expr, $($segment:ident)::+) => {
        $tracer.wrap(
            $crate::tracer::call_tracer::callable_name(stringify!($($segment)::+)),
            $($segment)::+,
        )
    };
}
