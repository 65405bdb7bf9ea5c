//! Cloud Backend Implementations
//!
//! - InMemoryBackend: emulated cloud with fault injection, for tests
//! - LocalBackend: emulated cloud persisted to a JSON file, for the CLI

mod local;
mod memory;
mod model;

pub use local::LocalBackend;
pub use memory::{BackendCall, InMemoryBackend};
pub use model::CloudModel;
