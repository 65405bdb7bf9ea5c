//! Common test utilities for drawstack scenario tests.
//!
//! This module provides:
//! - `TestEnv`: Isolated project directory plus helpers to run the CLI
//! - Fixtures: Parameter and config files used across scenarios

pub mod env;
pub mod fixtures;

pub use env::*;
pub use fixtures::*;
