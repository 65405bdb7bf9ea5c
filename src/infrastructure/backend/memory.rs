//! In-memory backend
//!
//! An emulated cloud held in memory, used by tests. Besides the emulator
//! semantics it records every call in a journal and can inject failures
//! into chosen operations.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::entities::{DesiredResource, IdentityBinding, LiveResource};
use crate::domain::ports::{BackendError, BackendResult, CloudBackend};
use crate::domain::value_objects::{
    DeploymentScope, ResourceId, ResourceKey, SecretKind, SecretString,
};
use crate::error::Operation;

use super::model::{CloudModel, StoredValue};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: Operation,
    /// Resource key, assignment id or scope the call was about
    pub target: String,
}

impl BackendCall {
    pub fn is_write(&self) -> bool {
        matches!(self.operation, Operation::CreateOrUpdate | Operation::AssignRole)
    }
}

#[derive(Debug, Clone)]
struct Fault {
    operation: Operation,
    /// Only calls about this key fail; `None` matches every call
    target: Option<ResourceKey>,
    error: BackendError,
    remaining: usize,
}

#[derive(Debug, Default)]
struct Inner {
    cloud: CloudModel,
    faults: Vec<Fault>,
    journal: Vec<BackendCall>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    inner: Mutex<Inner>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next `times` matching calls with `error`
    pub fn fail_next(
        &self,
        operation: Operation,
        target: Option<ResourceKey>,
        error: BackendError,
        times: usize,
    ) {
        self.inner().faults.push(Fault {
            operation,
            target,
            error,
            remaining: times,
        });
    }

    /// Fail every matching call with `error`
    pub fn fail_always(&self, operation: Operation, target: Option<ResourceKey>, error: BackendError) {
        self.fail_next(operation, target, error, usize::MAX);
    }

    pub fn clear_faults(&self) {
        self.inner().faults.clear();
    }

    /// Mark a globally unique name as owned by someone else
    pub fn reserve_foreign_name(&self, key: &ResourceKey) {
        self.inner().cloud.foreign_names.insert(key.to_string());
    }

    /// Create compute hosts without an identity until released
    pub fn withhold_principal(&self, key: &ResourceKey) {
        self.inner().cloud.pending_principals.insert(key.to_string());
    }

    /// Put a resource in place without going through the API or the journal
    pub fn seed(&self, scope: &DeploymentScope, desired: &DesiredResource) -> BackendResult<LiveResource> {
        self.inner().cloud.create_or_update(scope, desired)
    }

    /// Change a live property behind the engine's back
    pub fn drift(&self, scope: &DeploymentScope, key: &ResourceKey, property: &str, value: &str) {
        let id = scope.resource_id(key);
        if let Some(resource) = self.inner().cloud.resources.get_mut(id.as_str()) {
            resource.properties.insert(
                property.to_string(),
                StoredValue::String(value.to_string()),
            );
        }
    }

    /// Move a live resource to another location behind the engine's back
    pub fn relocate(&self, scope: &DeploymentScope, key: &ResourceKey, location: &str) {
        let id = scope.resource_id(key);
        if let Some(resource) = self.inner().cloud.resources.get_mut(id.as_str()) {
            resource.location = Some(location.to_string());
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner().journal.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner().journal.iter().filter(|c| c.is_write()).count()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.inner()
            .journal
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.inner().journal.clear();
    }

    pub fn resource_count(&self) -> usize {
        self.inner().cloud.resources.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.inner().cloud.assignments.len()
    }

    /// Snapshot of the emulated cloud
    pub fn model(&self) -> CloudModel {
        self.inner().cloud.clone()
    }

    /// Journal the call, then run it against the model unless a fault fires
    fn call<T>(
        &self,
        operation: Operation,
        key: Option<&ResourceKey>,
        target: String,
        run: impl FnOnce(&mut CloudModel) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let mut inner = self.inner();
        inner.journal.push(BackendCall { operation, target });

        let fault = inner.faults.iter_mut().find(|f| {
            f.remaining > 0
                && f.operation == operation
                && f.target.as_ref().is_none_or(|t| Some(t) == key)
        });
        if let Some(fault) = fault {
            fault.remaining = fault.remaining.saturating_sub(1);
            return Err(fault.error.clone());
        }
        run(&mut inner.cloud)
    }
}

impl CloudBackend for InMemoryBackend {
    fn get(&self, scope: &DeploymentScope, key: &ResourceKey) -> BackendResult<Option<LiveResource>> {
        self.call(Operation::Get, Some(key), key.to_string(), |cloud| {
            Ok(cloud.get(scope, key))
        })
    }

    fn create_or_update(
        &self,
        scope: &DeploymentScope,
        desired: &DesiredResource,
    ) -> BackendResult<LiveResource> {
        self.call(
            Operation::CreateOrUpdate,
            Some(&desired.key),
            desired.key.to_string(),
            |cloud| cloud.create_or_update(scope, desired),
        )
    }

    fn list(&self, scope: &DeploymentScope) -> BackendResult<Vec<LiveResource>> {
        self.call(Operation::List, None, scope.to_string(), |cloud| Ok(cloud.list(scope)))
    }

    fn list_keys(
        &self,
        scope: &DeploymentScope,
        key: &ResourceKey,
        secret: SecretKind,
    ) -> BackendResult<SecretString> {
        self.call(Operation::ListKeys, Some(key), key.to_string(), |cloud| {
            cloud.list_keys(scope, key, secret)
        })
    }

    fn get_role_assignment(&self, assignment_id: &ResourceId) -> BackendResult<Option<IdentityBinding>> {
        self.call(Operation::Get, None, assignment_id.to_string(), |cloud| {
            Ok(cloud.get_role_assignment(assignment_id))
        })
    }

    fn create_role_assignment(&self, binding: &IdentityBinding) -> BackendResult<IdentityBinding> {
        self.call(
            Operation::AssignRole,
            None,
            binding.assignment_id().to_string(),
            |cloud| cloud.create_role_assignment(binding),
        )
    }
}
