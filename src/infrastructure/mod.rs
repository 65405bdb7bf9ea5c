//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `backend/` - Cloud backend emulators (InMemory, Local)
//! - `repositories/` - Repository implementations (State)
//! - `events/` - Event sinks (Json, Tracing)
//! - `fs` - Atomic file writes

pub mod backend;
pub mod events;
pub mod fs;
pub mod repositories;

// Re-export for convenience
pub use backend::{InMemoryBackend, LocalBackend};
pub use events::{JsonEventSink, TracingEventSink};
pub use repositories::TomlStateRepository;
