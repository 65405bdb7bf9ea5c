//! Event Sink Implementations
//!
//! Provides concrete implementations of ProvisionEventSink:
//! - JsonEventSink: NDJSON output for CI/automation
//! - TracingEventSink: structured log lines for humans

mod json;
mod tracing_sink;

pub use self::json::JsonEventSink;
pub use self::tracing_sink::TracingEventSink;
