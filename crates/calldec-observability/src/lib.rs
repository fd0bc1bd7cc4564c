//! # calldec-observability
//!
//! OpenTelemetry-based observability for calldec.
//!
//! ## Built-in metrics
//! - `calldec.calls_decoded`     (counter, tagged with function)
//! - `calldec.unknown_selectors` (counter)
//! - `calldec.decode_errors`     (counter, tagged with error_type)
//! - `calldec.decode_latency_ms` (histogram)
//! - `calldec.batch_size`        (histogram)
//!
//! ## Structured logging
//! Text or JSON logs through `tracing-subscriber`, with log levels
//! configurable per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::CallDecoderMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
