//! drawstack - Declarative provisioning engine for the diagram rendering backend
//!
//! drawstack takes a set of typed resource declarations (storage accounts, a
//! serverless compute host and a role assignment), orders them by the
//! references between them and converges a cloud backend to match. Re-running
//! with the same input is idempotent; a failed run resumes from the first
//! step that did not converge.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{
    Blueprint, CancellationToken, ConvergeOptions, ConvergeReport, ConvergeUseCase,
    DeclarationSet, Parameters,
};
pub use config::Config;
pub use domain::entities::{OutputDeclaration, ResourceDeclaration};
pub use domain::ports::CloudBackend;
pub use domain::value_objects::{DeploymentScope, PropertyValue, ResourceKey, ResourceKind};
pub use error::{ProvisionError, ProvisionResult};
pub use infrastructure::{InMemoryBackend, LocalBackend, TomlStateRepository};
