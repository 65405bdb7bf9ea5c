//! Converge Module
//!
//! Orchestrates convergence of a declaration set against a cloud backend.
//!
//! ## Structure
//!
//! - `options` - Configuration types (`ConvergeOptions`, `CancellationToken`)
//! - `result` - Result types (`ConvergeReport`, `ConvergePlan`)
//! - `retry` - Bounded exponential backoff (`RetryPolicy`)
//! - `use_case` - Core use case logic (`ConvergeUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use drawstack::application::converge::{ConvergeOptions, ConvergeUseCase};
//!
//! let use_case = ConvergeUseCase::new(backend, state_repo);
//! let report = use_case.execute(&declarations, &ConvergeOptions::new(scope, state_path))?;
//! ```

mod options;
mod result;
mod retry;
mod runner;
mod use_case;

pub use options::{CancellationToken, ConvergeOptions};
pub use result::{ConvergePlan, ConvergeReport, PlannedStep, StepOutcome, StepReport};
pub use retry::{RetryFailure, RetryPolicy};
pub use use_case::ConvergeUseCase;
