//! Presentation Layer
//!
//! This layer handles:
//! - CLI argument parsing (via clap)
//! - Creating use cases with infrastructure dependencies
//! - Output formatting (text/JSON)
//!
//! ## Structure
//!
//! - `cli` - Command line definition
//! - `factory` - Creates use cases with proper dependencies (dependency injection)
//! - `output` - Human-readable rendering
//! - `json` - NDJSON rendering for `--json`

pub mod cli;
pub mod factory;
pub mod json;
pub mod output;

pub use cli::{Cli, Commands, DEFAULT_PARAMS_FILE};
pub use factory::{create_converge_use_case, create_event_sink, ConcreteConvergeUseCase};
pub use output::TextRenderer;
