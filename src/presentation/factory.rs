//! Use Case Factory
//!
//! Creates use cases with infrastructure dependencies wired up.
//! This is the dependency injection point for the CLI.

use std::sync::Arc;

use crate::application::{CancellationToken, ConvergeUseCase};
use crate::config::Config;
use crate::domain::ports::ProvisionEventSink;
use crate::infrastructure::{JsonEventSink, LocalBackend, TomlStateRepository, TracingEventSink};

/// The converge use case as the CLI runs it
pub type ConcreteConvergeUseCase = ConvergeUseCase<LocalBackend, TomlStateRepository>;

/// Event sink for a command: NDJSON on stdout with `--json`, log lines otherwise
pub fn create_event_sink(command: &'static str, json: bool) -> Arc<dyn ProvisionEventSink> {
    if json {
        Arc::new(JsonEventSink::stdout(command))
    } else {
        Arc::new(TracingEventSink)
    }
}

/// Create a converge use case against the local emulator configured in `config`
pub fn create_converge_use_case(
    config: &Config,
    events: Arc<dyn ProvisionEventSink>,
    cancel: CancellationToken,
) -> ConcreteConvergeUseCase {
    let backend = LocalBackend::new(&config.backend.path);
    ConvergeUseCase::new(backend, TomlStateRepository::new())
        .with_events(events)
        .with_cancellation(cancel)
}
