//! Application Layer
//!
//! Use cases that orchestrate the provisioning flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Does NOT contain business rules (those are in Domain)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `ConvergeUseCase` - Validate, order, plan and apply a declaration set
//!
//! ## Factories
//!
//! - `Blueprint` - Build the draw backend declaration set from `Parameters`

pub mod blueprint;
pub mod converge;

pub use blueprint::{Blueprint, DeclarationSet, Parameters};
pub use converge::{
    CancellationToken, ConvergeOptions, ConvergePlan, ConvergeReport, ConvergeUseCase,
    PlannedStep, RetryPolicy, StepOutcome, StepReport,
};
