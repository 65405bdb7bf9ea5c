//! Provision Event Port
//!
//! Provides an observable interface for convergence runs.
//! Enables progress reporting, JSON event streams, and debugging.
//!
//! Events carry keys, actions and error messages only. Property values are
//! never part of an event, so secrets cannot leak through a sink.

/// Event emitted during a convergence run
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionEvent {
    /// Run started
    Started {
        scope: String,
        declaration_count: usize,
    },

    /// Build order computed
    OrderResolved { order: Vec<String> },

    /// Resources found in the scope that no declaration manages
    UnmanagedDetected { ids: Vec<String> },

    /// A step started
    StepStarted { index: usize, key: String },

    /// A transient backend error is being retried
    StepRetrying {
        index: usize,
        key: String,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },

    /// A step converged (`created`, `updated` or `unchanged`)
    StepConverged {
        index: usize,
        key: String,
        action: &'static str,
    },

    /// A step failed
    StepFailed {
        index: usize,
        key: String,
        error: String,
    },

    /// A step was not attempted because a dependency did not converge
    StepBlocked {
        index: usize,
        key: String,
        waiting_on: Vec<String>,
    },

    /// Cancellation was honoured before these steps ran
    Cancelled { remaining: usize },

    /// Run completed
    Completed {
        created: usize,
        updated: usize,
        unchanged: usize,
        failed: usize,
        blocked: usize,
    },
}

/// Trait for receiving provision events
///
/// Implementations can be:
/// - TracingEventSink: structured log lines
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait ProvisionEventSink: Send + Sync {
    /// Handle a provision event
    fn on_event(&self, event: ProvisionEvent);

    /// Check if this sink wants per-step events
    ///
    /// Some sinks (like CI summaries) may only want start/complete.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl ProvisionEventSink for NoopEventSink {
    fn on_event(&self, _event: ProvisionEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
