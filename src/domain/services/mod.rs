//! Domain Services
//!
//! Pure business logic services that operate on domain entities.
//! These services have no I/O dependencies and are easily testable.

mod binder;
mod graph;
mod outputs;
mod planner;
mod resolver;

pub use binder::{BindingAction, BindingRequest, IdentityBinder};
pub use graph::{BuildOrder, DependencyEdge, DependencyGraph};
pub use outputs::OutputResolver;
pub use planner::{Planner, PropertyChange, ResourceAction};
pub use resolver::{PropertyResolver, SecretFetcher};
