//! JSON Event Sink
//!
//! Outputs provision events as NDJSON for CI/automation consumption.

use crate::domain::ports::{ProvisionEvent, ProvisionEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
    command: &'static str,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout(command: &'static str) -> Self {
        Self::with_writer(command, io::stdout())
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(command: &'static str, writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            command,
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl ProvisionEventSink for JsonEventSink {
    fn on_event(&self, event: ProvisionEvent) {
        let command = self.command;
        let json = match event {
            ProvisionEvent::Started {
                scope,
                declaration_count,
            } => serde_json::json!({
                "event": "start",
                "command": command,
                "scope": scope,
                "declaration_count": declaration_count,
            }),

            ProvisionEvent::OrderResolved { order } => serde_json::json!({
                "event": "order",
                "command": command,
                "order": order,
            }),

            ProvisionEvent::UnmanagedDetected { ids } => serde_json::json!({
                "event": "unmanaged",
                "command": command,
                "ids": ids,
            }),

            ProvisionEvent::StepStarted { index, key } => serde_json::json!({
                "event": "step_start",
                "command": command,
                "index": index,
                "key": key,
            }),

            ProvisionEvent::StepRetrying {
                index,
                key,
                attempt,
                delay_ms,
                reason,
            } => serde_json::json!({
                "event": "step_retry",
                "command": command,
                "index": index,
                "key": key,
                "attempt": attempt,
                "delay_ms": delay_ms,
                "reason": reason,
            }),

            ProvisionEvent::StepConverged { index, key, action } => serde_json::json!({
                "event": "step_converged",
                "command": command,
                "index": index,
                "key": key,
                "action": action,
            }),

            ProvisionEvent::StepFailed { index, key, error } => serde_json::json!({
                "event": "step_failed",
                "command": command,
                "index": index,
                "key": key,
                "error": error,
            }),

            ProvisionEvent::StepBlocked {
                index,
                key,
                waiting_on,
            } => serde_json::json!({
                "event": "step_blocked",
                "command": command,
                "index": index,
                "key": key,
                "waiting_on": waiting_on,
            }),

            ProvisionEvent::Cancelled { remaining } => serde_json::json!({
                "event": "cancelled",
                "command": command,
                "remaining": remaining,
            }),

            ProvisionEvent::Completed {
                created,
                updated,
                unchanged,
                failed,
                blocked,
            } => serde_json::json!({
                "event": "complete",
                "command": command,
                "created": created,
                "updated": updated,
                "unchanged": unchanged,
                "failed": failed,
                "blocked": blocked,
            }),
        };

        self.write_event(json);
    }
}
