//! Repository Implementations
//!
//! Concrete implementations of domain repository ports.

mod state;

pub use state::{parse_state, render_state, TomlStateRepository};
