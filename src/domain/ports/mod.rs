//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod cloud_backend;
pub mod provision_events;
pub mod state_repository;

pub use cloud_backend::{BackendError, BackendErrorClass, BackendResult, CloudBackend};
pub use provision_events::{NoopEventSink, ProvisionEvent, ProvisionEventSink};
pub use state_repository::{lock_path_for, StateError, StateGuard, StateRepository, StateResult};
