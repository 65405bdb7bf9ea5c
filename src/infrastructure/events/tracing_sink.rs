//! Tracing Event Sink
//!
//! Turns provision events into structured log lines. Used by the CLI when
//! output is meant for humans, so `-v` shows step progress.

use crate::domain::ports::{ProvisionEvent, ProvisionEventSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl ProvisionEventSink for TracingEventSink {
    fn on_event(&self, event: ProvisionEvent) {
        match event {
            ProvisionEvent::Started {
                scope,
                declaration_count,
            } => tracing::info!(%scope, declaration_count, "deployment started"),
            ProvisionEvent::OrderResolved { order } => {
                tracing::debug!(order = %order.join(", "), "build order resolved")
            }
            ProvisionEvent::UnmanagedDetected { ids } => {
                for id in ids {
                    tracing::warn!(%id, "unmanaged resource in scope");
                }
            }
            ProvisionEvent::StepStarted { index, key } => {
                tracing::info!(step = index, %key, "step started")
            }
            ProvisionEvent::StepRetrying {
                index,
                key,
                attempt,
                delay_ms,
                reason,
            } => tracing::info!(step = index, %key, attempt, delay_ms, %reason, "step retrying"),
            ProvisionEvent::StepConverged { index, key, action } => {
                tracing::info!(step = index, %key, action, "step converged")
            }
            ProvisionEvent::StepFailed { index, key, error } => {
                tracing::error!(step = index, %key, %error, "step failed")
            }
            ProvisionEvent::StepBlocked {
                index,
                key,
                waiting_on,
            } => tracing::warn!(step = index, %key, waiting_on = %waiting_on.join(", "), "step blocked"),
            ProvisionEvent::Cancelled { remaining } => {
                tracing::warn!(remaining, "deployment cancelled")
            }
            ProvisionEvent::Completed {
                created,
                updated,
                unchanged,
                failed,
                blocked,
            } => tracing::info!(created, updated, unchanged, failed, blocked, "deployment finished"),
        }
    }
}
