//! Prometheus metrics and structured logging for the surge bot.
//!
//! - Counters for signals, gate rejections, and exits
//! - Gauges for open position count and tracked symbols
//! - Structured JSON logging with tracing

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
