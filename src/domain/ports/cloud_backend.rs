//! Cloud Backend Port
//!
//! The resource-management API the engine converges against. Everything is
//! keyed by (scope, kind, name). Implementations classify their failures into
//! a [`BackendErrorClass`]; the engine decides at the call site which classes
//! are worth retrying.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::entities::{DesiredResource, IdentityBinding, LiveResource};
use crate::domain::value_objects::{DeploymentScope, ResourceId, ResourceKey, SecretKind, SecretString};

/// Result type for backend calls
pub type BackendResult<T> = Result<T, BackendError>;

/// Failure classes a backend can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorClass {
    /// Rate limited (HTTP 429)
    Throttled,
    /// Service temporarily unavailable (HTTP 503)
    Unavailable,
    /// Another operation on the resource is in progress (HTTP 409, retryable)
    TransientConflict,
    /// Name already used by a resource of another kind or owner
    NameConflict,
    /// The request itself is invalid (HTTP 400)
    Invalid,
    /// Anything else the backend cannot recover from
    Fatal,
}

impl BackendErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorClass::Throttled => "throttled",
            BackendErrorClass::Unavailable => "temporarily-unavailable",
            BackendErrorClass::TransientConflict => "transient-conflict",
            BackendErrorClass::NameConflict => "name-conflict",
            BackendErrorClass::Invalid => "invalid-request",
            BackendErrorClass::Fatal => "fatal",
        }
    }
}

impl fmt::Display for BackendErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by a backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{class}: {message}")]
pub struct BackendError {
    pub class: BackendErrorClass,
    pub message: String,
}

impl BackendError {
    pub fn new(class: BackendErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(BackendErrorClass::Throttled, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorClass::Unavailable, message)
    }

    pub fn name_conflict(message: impl Into<String>) -> Self {
        Self::new(BackendErrorClass::NameConflict, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(BackendErrorClass::Invalid, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(BackendErrorClass::Fatal, message)
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self.class,
            BackendErrorClass::Throttled
                | BackendErrorClass::Unavailable
                | BackendErrorClass::TransientConflict
        )
    }
}

/// Abstract cloud resource-management API
///
/// Per-call timeouts are the implementation's concern.
pub trait CloudBackend: Send + Sync {
    /// Fetch the live state of a resource, `None` if it does not exist
    fn get(&self, scope: &DeploymentScope, key: &ResourceKey) -> BackendResult<Option<LiveResource>>;

    /// Create the resource or update it in place to match `desired`
    fn create_or_update(
        &self,
        scope: &DeploymentScope,
        desired: &DesiredResource,
    ) -> BackendResult<LiveResource>;

    /// List every resource in the scope (drift detection)
    fn list(&self, scope: &DeploymentScope) -> BackendResult<Vec<LiveResource>>;

    /// Derive a secret from a resource's live state
    fn list_keys(
        &self,
        scope: &DeploymentScope,
        key: &ResourceKey,
        secret: SecretKind,
    ) -> BackendResult<SecretString>;

    /// Fetch a role assignment by its id
    fn get_role_assignment(&self, assignment_id: &ResourceId) -> BackendResult<Option<IdentityBinding>>;

    /// Create a role assignment at `binding.assignment_id()`
    fn create_role_assignment(&self, binding: &IdentityBinding) -> BackendResult<IdentityBinding>;
}

impl<B: CloudBackend + ?Sized> CloudBackend for Arc<B> {
    fn get(&self, scope: &DeploymentScope, key: &ResourceKey) -> BackendResult<Option<LiveResource>> {
        (**self).get(scope, key)
    }

    fn create_or_update(
        &self,
        scope: &DeploymentScope,
        desired: &DesiredResource,
    ) -> BackendResult<LiveResource> {
        (**self).create_or_update(scope, desired)
    }

    fn list(&self, scope: &DeploymentScope) -> BackendResult<Vec<LiveResource>> {
        (**self).list(scope)
    }

    fn list_keys(
        &self,
        scope: &DeploymentScope,
        key: &ResourceKey,
        secret: SecretKind,
    ) -> BackendResult<SecretString> {
        (**self).list_keys(scope, key, secret)
    }

    fn get_role_assignment(&self, assignment_id: &ResourceId) -> BackendResult<Option<IdentityBinding>> {
        (**self).get_role_assignment(assignment_id)
    }

    fn create_role_assignment(&self, binding: &IdentityBinding) -> BackendResult<IdentityBinding> {
        (**self).create_role_assignment(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_throttling_unavailability_and_busy_are_transient() {
        assert!(BackendError::throttled("429").is_transient());
        assert!(BackendError::unavailable("503").is_transient());
        assert!(BackendError::new(BackendErrorClass::TransientConflict, "busy").is_transient());
        assert!(!BackendError::name_conflict("taken").is_transient());
        assert!(!BackendError::invalid("bad sku").is_transient());
        assert!(!BackendError::fatal("boom").is_transient());
    }

    #[test]
    fn display_includes_class() {
        assert_eq!(
            BackendError::throttled("slow down").to_string(),
            "throttled: slow down"
        );
    }
}
