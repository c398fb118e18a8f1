//! Observability setup for Artspace: structured logging via `tracing`
//! with optional OpenTelemetry span export.

pub mod tracing_setup;
