//! HTTP middleware: request metrics, simulated latency and tracing.

pub mod latency;
pub mod metrics;
pub mod tracing_layer;
