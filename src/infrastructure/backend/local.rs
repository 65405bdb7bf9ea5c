//! File-backed backend
//!
//! Keeps the emulated cloud in a JSON file so consecutive CLI runs see the
//! resources earlier runs created. Writes are atomic.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::domain::entities::{DesiredResource, IdentityBinding, LiveResource};
use crate::domain::ports::{BackendError, BackendResult, CloudBackend};
use crate::domain::value_objects::{DeploymentScope, ResourceId, ResourceKey, SecretKind, SecretString};
use crate::infrastructure::fs::atomic_write;

use super::model::CloudModel;

pub struct LocalBackend {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl LocalBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BackendResult<CloudModel> {
        if !self.path.exists() {
            return Ok(CloudModel::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| BackendError::unavailable(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| BackendError::fatal(format!("{} is corrupted: {}", self.path.display(), e)))
    }

    fn save(&self, model: &CloudModel) -> BackendResult<()> {
        let content = serde_json::to_string_pretty(model)
            .map_err(|e| BackendError::fatal(e.to_string()))?;
        atomic_write(&self.path, content.as_bytes())
            .map_err(|e| BackendError::unavailable(format!("{}: {}", self.path.display(), e)))
    }

    fn read<T>(&self, run: impl FnOnce(&CloudModel) -> BackendResult<T>) -> BackendResult<T> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        run(&self.load()?)
    }

    fn write<T>(&self, run: impl FnOnce(&mut CloudModel) -> BackendResult<T>) -> BackendResult<T> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut model = self.load()?;
        let result = run(&mut model)?;
        self.save(&model)?;
        Ok(result)
    }
}

impl CloudBackend for LocalBackend {
    fn get(&self, scope: &DeploymentScope, key: &ResourceKey) -> BackendResult<Option<LiveResource>> {
        self.read(|cloud| Ok(cloud.get(scope, key)))
    }

    fn create_or_update(
        &self,
        scope: &DeploymentScope,
        desired: &DesiredResource,
    ) -> BackendResult<LiveResource> {
        tracing::debug!(key = %desired.key, file = %self.path.display(), "writing resource");
        self.write(|cloud| cloud.create_or_update(scope, desired))
    }

    fn list(&self, scope: &DeploymentScope) -> BackendResult<Vec<LiveResource>> {
        self.read(|cloud| Ok(cloud.list(scope)))
    }

    fn list_keys(
        &self,
        scope: &DeploymentScope,
        key: &ResourceKey,
        secret: SecretKind,
    ) -> BackendResult<SecretString> {
        self.read(|cloud| cloud.list_keys(scope, key, secret))
    }

    fn get_role_assignment(&self, assignment_id: &ResourceId) -> BackendResult<Option<IdentityBinding>> {
        self.read(|cloud| Ok(cloud.get_role_assignment(assignment_id)))
    }

    fn create_role_assignment(&self, binding: &IdentityBinding) -> BackendResult<IdentityBinding> {
        self.write(|cloud| cloud.create_role_assignment(binding))
    }
}
