//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod hash;
mod key;
mod kind;
mod property;
mod role;
mod scope;
mod secret;
mod sku;

pub use hash::{deterministic_guid, Fingerprint};
pub use key::ResourceKey;
pub use kind::{AttributeTiming, KindSchema, ResourceKind};
pub use property::{
    ContextField, PropertyValue, RefSite, Reference, ResolvedValue, SecretKind, SecretRef,
};
pub use role::RoleDefinition;
pub use scope::{DeploymentScope, ResourceId};
pub use secret::SecretString;
pub use sku::{Sku, PLAN_SKUS, STORAGE_SKUS};
