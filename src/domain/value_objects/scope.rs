//! Deployment scope and resource ids
//!
//! The scope is the explicit context every deployment runs in: which
//! subscription and resource group resources land in. It is threaded through
//! the engine instead of being ambient.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::ResourceKey;
use super::kind::ResourceKind;

/// Subscription + resource group a deployment targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentScope {
    pub subscription_id: String,
    pub resource_group: String,
}

impl DeploymentScope {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
        }
    }

    /// Id of the subscription itself
    pub fn subscription_id_path(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }

    /// Id of the resource group
    pub fn resource_group_id(&self) -> ResourceId {
        ResourceId(format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        ))
    }

    /// Deterministic id for a declared resource.
    ///
    /// Role assignments are not placed under the resource group; their ids
    /// hang off the scope they grant access to and are built by the binder.
    pub fn resource_id(&self, key: &ResourceKey) -> ResourceId {
        ResourceId(format!(
            "{}/providers/{}/{}",
            self.resource_group_id(),
            key.kind.provider_type(),
            key.name
        ))
    }
}

impl fmt::Display for DeploymentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subscription_id, self.resource_group)
    }
}

/// Full backend identifier of a resource
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id names exactly one resource.
    ///
    /// Subscription and resource-group ids carry no `/providers/` segment and
    /// are rejected, as are ids ending in a provider namespace with no name.
    pub fn is_single_resource(&self) -> bool {
        let Some((prefix, rest)) = self.0.split_once("/providers/") else {
            return false;
        };
        if !prefix.starts_with("/subscriptions/") || !prefix.contains("/resourceGroups/") {
            return false;
        }
        // namespace/type/name at minimum
        let segments: Vec<&str> = rest.split('/').collect();
        segments.len() >= 3 && segments.len() % 2 == 1 && segments.iter().all(|s| !s.is_empty())
    }

    /// Resource name: the last path segment
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Kind inferred from the provider type, if this id names a known kind
    pub fn kind(&self) -> Option<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| self.0.contains(&format!("/providers/{}/", k.provider_type())))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
