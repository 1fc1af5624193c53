//! Tracing a division function
//!
//! Wraps `divide_numbers`, calls it once with named arguments and once with a zero
//! divisor. The second call fails: the failure is printed, written to `error.log`
//! with a backtrace, and returned from `main` unchanged.
//!
//! # Running the example
//!
//! ```bash
//! cargo run --example divide
//! RUST_LOG=calltrace=debug cargo run --example divide
//! ```

use calltrace::trace_fn;
use calltrace::tracer::{Arguments, CallTracer, TracerConfig};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
enum DivideError {
    #[error("division by zero")]
    ZeroDivision,

    #[error("missing argument '{0}'")]
    MissingArgument(&'static str),
}

fn number(args: &Arguments, name: &'static str, index: usize) -> Result<f64, DivideError> {
    args.lookup(name, index)
        .and_then(Value::as_f64)
        .ok_or(DivideError::MissingArgument(name))
}

fn divide_numbers(args: Arguments) -> Result<f64, DivideError> {
    let a = number(&args, "a", 0)?;
    let b = number(&args, "b", 1)?;
    if b == 0.0 {
        return Err(DivideError::ZeroDivision);
    }
    Ok(a / b)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let tracer = CallTracer::new(TracerConfig::default())?;
    let divide_numbers = trace_fn!(tracer, divide_numbers);

    let quotient = divide_numbers.call(Arguments::new().kwarg("a", 6).kwarg("b", 3))?;
    println!("6 / 3 = {}", quotient);

    divide_numbers.call(Arguments::new().arg(6).arg(0))?;

    Ok(())
}
