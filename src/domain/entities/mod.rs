//! Domain Entities
//!
//! Core domain entities that have identity and lifecycle.
//! - `ResourceDeclaration` - One declared cloud object
//! - `IdentityBinding` - A role assignment on a single resource
//! - `DesiredResource` / `LiveResource` - Resolved and observed resource state
//! - `DeploymentState` - Declaration to live-identity map, persisted between runs
//! - `OutputDeclaration` / `DeploymentOutput` - Named deployment outputs

mod binding;
mod declaration;
mod output;
mod resource;
mod state;

pub use binding::IdentityBinding;
pub use declaration::{DeclaredDependency, ResourceDeclaration};
pub use output::{DeploymentOutput, OutputDeclaration};
pub use resource::{DesiredResource, LiveResource};
pub use state::{DeploymentState, StateEntry, StepStatus};
