//! Call tracing for arbitrary callables
//!
//! The tracer wraps a callable so that every call through the wrapper is announced
//! with its arguments, and every failure is recorded with a backtrace before it is
//! handed back to the caller unchanged.
//!
//! # Architecture
//!
//! - **TracerConfig**: Immutable construction settings (log path, channel, open mode, line format)
//! - **LogSink**: File-backed destination that writes one whole record per lock
//! - **Channel / ChannelRegistry**: Name-keyed sets of sinks shared by tracers with the same channel
//! - **CallTracer**: Owns an attachment to a channel and produces wrapped callables
//! - **Traced**: A wrapped callable with the same arguments and results as the original
//!
//! # Records
//!
//! Each call writes a trace record before the target runs:
//!
//! ```text
//! TRACE: calling divide() with (6, 0), {}
//! ```
//!
//! A failure adds an error record holding the error text and a backtrace, and prints
//! `ERROR: <message>. See <log path> for more details` to the console.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use calltrace::tracer::{CallTracer, TracerConfig};
//!
//! fn divide(a: i64, b: i64) -> Result<i64, String> {
//!     if b == 0 { Err("division by zero".into()) } else { Ok(a / b) }
//! }
//!
//! let tracer = CallTracer::new(TracerConfig::default())?;
//! let divide = calltrace::trace_fn!(tracer, divide);
//!
//! assert_eq!(divide.call((6, 3)), Ok(2));
//! assert!(divide.call((6, 0)).is_err());
//! ```
//!
//! # Channels
//!
//! Tracers created with the same channel name share that channel's sinks. With the
//! default [`SinkPolicy::Accumulate`], creating a second tracer for the same channel
//! attaches a second sink and every later record on the channel is written twice.
//! [`SinkPolicy::Idempotent`] keeps one sink per (channel, log path).

pub mod call_tracer;
pub mod channel;
pub mod config;
pub mod invocation;
pub mod line_format;
pub mod log_sink;

// Re-export main types
pub use call_tracer::{CallTracer, Traced};
pub use channel::{Channel, ChannelRegistry};
pub use config::{OpenMode, SinkPolicy, TracerConfig};
pub use invocation::{Arguments, InvocationRecord, Invoke, Kwargs, TraceArgs};
pub use line_format::LineFormat;
pub use log_sink::LogSink;
