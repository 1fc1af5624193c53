pub mod error;
pub mod tracer;

pub use error::{Result, TracerError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Result, TracerError};
    pub use crate::trace_fn;
    pub use crate::tracer::{
        Arguments, CallTracer, Kwargs, OpenMode, SinkPolicy, Traced, TracerConfig,
    };
}
