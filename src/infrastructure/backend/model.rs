//! Emulated cloud model
//!
//! The resource-management semantics shared by the in-memory and the
//! file-backed backends: deterministic ids, creation-time attributes derived
//! from the resource id, derived keys, and role assignments. The model is
//! plain serde data so it can live in memory or in a JSON file.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::entities::{DesiredResource, IdentityBinding, LiveResource};
use crate::domain::ports::{BackendError, BackendResult};
use crate::domain::value_objects::{
    deterministic_guid, DeploymentScope, ResolvedValue, ResourceId, ResourceKey, ResourceKind,
    SecretKind, SecretString, Sku,
};

/// A property value as the emulator stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    /// Tried first, so a secret never reads back as a plain map
    Secret {
        #[serde(rename = "$secret")]
        secret: String,
    },
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<StoredValue>),
    Map(BTreeMap<String, StoredValue>),
}

impl StoredValue {
    fn from_resolved(value: &ResolvedValue) -> Option<Self> {
        Some(match value {
            ResolvedValue::String(s) => StoredValue::String(s.clone()),
            ResolvedValue::Int(n) => StoredValue::Int(*n),
            ResolvedValue::Bool(b) => StoredValue::Bool(*b),
            ResolvedValue::List(items) => {
                StoredValue::List(items.iter().map(Self::from_resolved).collect::<Option<_>>()?)
            }
            ResolvedValue::Map(map) => StoredValue::Map(
                map.iter()
                    .map(|(k, v)| Self::from_resolved(v).map(|v| (k.clone(), v)))
                    .collect::<Option<_>>()?,
            ),
            ResolvedValue::Secret(s) => StoredValue::Secret {
                secret: s.expose().to_string(),
            },
            ResolvedValue::Unknown => return None,
        })
    }

    fn to_resolved(&self) -> ResolvedValue {
        match self {
            StoredValue::String(s) => ResolvedValue::String(s.clone()),
            StoredValue::Int(n) => ResolvedValue::Int(*n),
            StoredValue::Bool(b) => ResolvedValue::Bool(*b),
            StoredValue::List(items) => ResolvedValue::List(items.iter().map(Self::to_resolved).collect()),
            StoredValue::Map(map) => ResolvedValue::Map(
                map.iter().map(|(k, v)| (k.clone(), v.to_resolved())).collect(),
            ),
            StoredValue::Secret { secret } => ResolvedValue::Secret(SecretString::new(secret.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    pub key: ResourceKey,
    pub scope: DeploymentScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default)]
    pub properties: BTreeMap<String, StoredValue>,
    /// Set once the platform has provisioned the host's identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAssignment {
    pub principal_id: String,
    pub role_definition_id: String,
    pub scope: String,
}

/// Everything an emulated cloud holds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudModel {
    /// Keyed by resource id
    #[serde(default)]
    pub resources: BTreeMap<String, StoredResource>,
    /// Keyed by assignment id
    #[serde(default)]
    pub assignments: BTreeMap<String, StoredAssignment>,
    /// Globally unique names (`storage/name`) owned by someone else
    #[serde(default)]
    pub foreign_names: BTreeSet<String>,
    /// Hosts whose identity has not been provisioned yet (`compute/name`)
    #[serde(default)]
    pub pending_principals: BTreeSet<String>,
}

impl CloudModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: &DeploymentScope, key: &ResourceKey) -> Option<LiveResource> {
        let id = scope.resource_id(key);
        self.resources.get(id.as_str()).map(|r| live_view(&id, r))
    }

    pub fn create_or_update(
        &mut self,
        scope: &DeploymentScope,
        desired: &DesiredResource,
    ) -> BackendResult<LiveResource> {
        let key = &desired.key;
        if key.kind == ResourceKind::RoleAssignment {
            return Err(BackendError::invalid(
                "role assignments are created through create_role_assignment",
            ));
        }
        if self.foreign_names.contains(&key.to_string()) {
            return Err(BackendError::name_conflict(format!(
                "the name '{}' is already taken by another owner",
                key.name
            )));
        }
        if key.kind == ResourceKind::Storage && self.storage_name_taken_elsewhere(scope, &key.name) {
            return Err(BackendError::name_conflict(format!(
                "storage account name '{}' is already in use",
                key.name
            )));
        }

        let mut properties = BTreeMap::new();
        for (name, value) in &desired.properties {
            let stored = StoredValue::from_resolved(value).ok_or_else(|| {
                BackendError::invalid(format!("property '{}' has no value", name))
            })?;
            properties.insert(name.clone(), stored);
        }

        let id = scope.resource_id(key);
        let pending = self.pending_principals.contains(&key.to_string());
        let principal_id = match self.resources.get(id.as_str()) {
            Some(existing) => {
                if existing.location.is_some()
                    && desired.location.is_some()
                    && existing.location != desired.location
                {
                    return Err(BackendError::invalid(format!(
                        "location of {} cannot be changed",
                        key
                    )));
                }
                existing.principal_id.clone()
            }
            None => None,
        };
        let principal_id = match (key.kind, principal_id, pending) {
            (ResourceKind::Compute, None, false) => Some(deterministic_guid(&["principal", id.as_str()])),
            (_, existing, _) => existing,
        };

        let resource = StoredResource {
            key: key.clone(),
            scope: scope.clone(),
            location: desired.location.clone(),
            sku: desired.sku.clone(),
            properties,
            principal_id,
        };
        let live = live_view(&id, &resource);
        self.resources.insert(id.to_string(), resource);
        Ok(live)
    }

    pub fn list(&self, scope: &DeploymentScope) -> Vec<LiveResource> {
        self.resources
            .iter()
            .filter(|(_, r)| &r.scope == scope)
            .map(|(id, r)| live_view(&ResourceId::new(id.clone()), r))
            .collect()
    }

    pub fn list_keys(
        &self,
        scope: &DeploymentScope,
        key: &ResourceKey,
        secret: SecretKind,
    ) -> BackendResult<SecretString> {
        if !key.kind.schema().exposes_secret(secret) {
            return Err(BackendError::invalid(format!("{} does not expose {}", key.kind, secret)));
        }
        let id = scope.resource_id(key);
        if !self.resources.contains_key(id.as_str()) {
            return Err(BackendError::invalid(format!("{} does not exist", key)));
        }

        let access_key = format!("{:x}", Sha256::digest(format!("key1|{}", id).as_bytes()));
        Ok(SecretString::new(match secret {
            SecretKind::AccessKey => access_key,
            SecretKind::ConnectionString => format!(
                "DefaultEndpointsProtocol=https;AccountName={};AccountKey={};EndpointSuffix=core.windows.net",
                key.name, access_key
            ),
        }))
    }

    pub fn get_role_assignment(&self, assignment_id: &ResourceId) -> Option<IdentityBinding> {
        self.assignments.get(assignment_id.as_str()).map(|a| {
            IdentityBinding::new(
                a.principal_id.clone(),
                a.role_definition_id.clone(),
                ResourceId::new(a.scope.clone()),
            )
        })
    }

    pub fn create_role_assignment(&mut self, binding: &IdentityBinding) -> BackendResult<IdentityBinding> {
        if !binding.scope.is_single_resource() {
            return Err(BackendError::invalid(format!(
                "scope {} is not a single resource",
                binding.scope
            )));
        }
        if !self.resources.contains_key(binding.scope.as_str()) {
            return Err(BackendError::invalid(format!("scope {} does not exist", binding.scope)));
        }
        let known_principal = self
            .resources
            .values()
            .any(|r| r.principal_id.as_deref() == Some(binding.principal_id.as_str()));
        if !known_principal {
            return Err(BackendError::invalid(format!(
                "principal {} does not exist",
                binding.principal_id
            )));
        }

        self.assignments.insert(
            binding.assignment_id().to_string(),
            StoredAssignment {
                principal_id: binding.principal_id.clone(),
                role_definition_id: binding.role_definition_id.clone(),
                scope: binding.scope.to_string(),
            },
        );
        Ok(binding.clone())
    }

    /// Storage account names are global: the same name in another scope
    /// conflicts
    fn storage_name_taken_elsewhere(&self, scope: &DeploymentScope, name: &str) -> bool {
        self.resources
            .values()
            .any(|r| r.key.kind == ResourceKind::Storage && r.key.name == name && &r.scope != scope)
    }
}

/// What the backend reports for a stored resource
fn live_view(id: &ResourceId, resource: &StoredResource) -> LiveResource {
    let key = &resource.key;
    let mut attributes = BTreeMap::from([
        ("id".to_string(), id.to_string()),
        ("name".to_string(), key.name.clone()),
    ]);
    if let Some(location) = &resource.location {
        attributes.insert("location".to_string(), location.clone());
    }
    match key.kind {
        ResourceKind::Storage => {
            attributes.insert(
                "blob_endpoint".to_string(),
                format!("https://{}.blob.core.windows.net/", key.name),
            );
        }
        ResourceKind::Compute => {
            attributes.insert(
                "default_hostname".to_string(),
                format!("{}.azurewebsites.net", key.name),
            );
            if let Some(principal) = &resource.principal_id {
                attributes.insert("principal_id".to_string(), principal.clone());
            }
        }
        ResourceKind::RoleAssignment => {}
    }

    LiveResource {
        key: key.clone(),
        id: id.clone(),
        location: resource.location.clone(),
        sku: resource.sku.clone(),
        properties: resource
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.to_resolved()))
            .collect(),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> DeploymentScope {
        DeploymentScope::new("sub-1", "rg-draw")
    }

    fn desired(key: ResourceKey) -> DesiredResource {
        DesiredResource {
            id: scope().resource_id(&key),
            key,
            location: Some("westeurope".to_string()),
            sku: Some(Sku::storage("Standard_LRS")),
            properties: BTreeMap::from([
                ("https_only".to_string(), ResolvedValue::Bool(true)),
                (
                    "conn".to_string(),
                    ResolvedValue::Secret(SecretString::new("s3cret")),
                ),
            ]),
        }
    }

    #[test]
    fn created_resources_report_creation_time_attributes() {
        let mut cloud = CloudModel::new();
        let storage = cloud
            .create_or_update(&scope(), &desired(ResourceKey::storage("drawstate01")))
            .unwrap();
        assert_eq!(
            storage.attribute("blob_endpoint"),
            Some("https://drawstate01.blob.core.windows.net/")
        );

        let host = cloud
            .create_or_update(&scope(), &desired(ResourceKey::compute("draw-host")))
            .unwrap();
        assert_eq!(host.attribute("default_hostname"), Some("draw-host.azurewebsites.net"));
        assert!(host.principal_id().is_some());
    }

    #[test]
    fn stored_values_survive_json() {
        let mut cloud = CloudModel::new();
        cloud
            .create_or_update(&scope(), &desired(ResourceKey::storage("drawstate01")))
            .unwrap();
        let json = serde_json::to_string(&cloud).unwrap();
        let restored: CloudModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cloud);
        let live = restored.get(&scope(), &ResourceKey::storage("drawstate01")).unwrap();
        assert!(live.properties["conn"].is_secret());
    }

    #[test]
    fn lookups_never_cross_kinds() {
        let mut cloud = CloudModel::new();
        cloud
            .create_or_update(&scope(), &desired(ResourceKey::storage("draw")))
            .unwrap();

        assert!(cloud.get(&scope(), &ResourceKey::storage("draw")).is_some());
        assert!(cloud.get(&scope(), &ResourceKey::compute("draw")).is_none());
    }

    #[test]
    fn storage_names_are_global() {
        let mut cloud = CloudModel::new();
        cloud
            .create_or_update(&scope(), &desired(ResourceKey::storage("drawstate01")))
            .unwrap();
        let other = DeploymentScope::new("sub-2", "rg-other");
        let err = cloud
            .create_or_update(&other, &desired(ResourceKey::storage("drawstate01")))
            .unwrap_err();
        assert_eq!(err.class, crate::domain::ports::BackendErrorClass::NameConflict);
    }

    #[test]
    fn keys_are_derived_from_the_resource() {
        let mut cloud = CloudModel::new();
        let key = ResourceKey::storage("drawstate01");
        cloud.create_or_update(&scope(), &desired(key.clone())).unwrap();

        let first = cloud.list_keys(&scope(), &key, SecretKind::ConnectionString).unwrap();
        let second = cloud.list_keys(&scope(), &key, SecretKind::ConnectionString).unwrap();
        assert_eq!(first, second);
        assert!(first.expose().contains("AccountName=drawstate01"));
        assert!(cloud
            .list_keys(&scope(), &ResourceKey::compute("draw-host"), SecretKind::AccessKey)
            .is_err());
    }

    #[test]
    fn assignments_require_a_known_principal() {
        let mut cloud = CloudModel::new();
        let storage = cloud
            .create_or_update(&scope(), &desired(ResourceKey::storage("drawstate01")))
            .unwrap();
        let binding = IdentityBinding::new("nobody", "role", storage.id.clone());
        assert!(cloud.create_role_assignment(&binding).is_err());
    }
}
