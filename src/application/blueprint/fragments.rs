//! Blueprint fragments
//!
//! Each fragment produces one declaration of the draw backend. Fragments
//! refer to each other only through typed references, so the graph builder
//! sees every dependency.

use std::collections::BTreeMap;

use crate::domain::entities::ResourceDeclaration;
use crate::domain::value_objects::{
    ContextField, PropertyValue, ResourceKey, RoleDefinition, SecretKind, Sku,
};

/// A piece of a blueprint that yields a single declaration
pub trait Fragment {
    fn key(&self) -> ResourceKey;
    fn declaration(&self) -> ResourceDeclaration;
}

/// Storage account holding the host's runtime state
#[derive(Debug, Clone)]
pub struct StateStorage {
    pub name: String,
    pub location: String,
    pub sku: String,
    /// Containers to create when this account also holds artifacts
    pub containers: Vec<String>,
}

impl Fragment for StateStorage {
    fn key(&self) -> ResourceKey {
        ResourceKey::storage(&self.name)
    }

    fn declaration(&self) -> ResourceDeclaration {
        let decl = ResourceDeclaration::storage(&self.name)
            .with_location(&self.location)
            .with_sku(Sku::storage(&self.sku))
            .with_property("https_only", true);
        if self.containers.is_empty() {
            decl
        } else {
            decl.with_containers(self.containers.iter().cloned())
        }
    }
}

/// Storage account the deployed program writes diagrams to
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    pub name: String,
    pub location: String,
    pub sku: String,
    pub container: String,
}

impl Fragment for ArtifactStorage {
    fn key(&self) -> ResourceKey {
        ResourceKey::storage(&self.name)
    }

    fn declaration(&self) -> ResourceDeclaration {
        ResourceDeclaration::storage(&self.name)
            .with_location(&self.location)
            .with_sku(Sku::storage(&self.sku))
            .with_property("https_only", true)
            .with_containers([self.container.as_str()])
    }
}

/// Serverless compute host with a system-assigned identity
#[derive(Debug, Clone)]
pub struct ComputeHost {
    pub name: String,
    pub location: String,
    pub plan_sku: String,
    pub runtime: String,
    /// Account whose connection string backs the host runtime
    pub state_storage: ResourceKey,
    /// Account and container the program uploads to
    pub artifact_storage: ResourceKey,
    pub artifact_container: String,
    pub identity_name: Option<String>,
    pub plan_id: Option<String>,
}

impl ComputeHost {
    /// Settings the deployed program reads from its environment
    pub fn app_settings(&self) -> BTreeMap<String, PropertyValue> {
        let mut settings = BTreeMap::new();
        settings.insert(
            "AzureWebJobsStorage".to_string(),
            PropertyValue::secret(self.state_storage.clone(), SecretKind::ConnectionString),
        );
        settings.insert(
            "FUNCTIONS_WORKER_RUNTIME".to_string(),
            PropertyValue::string(&self.runtime),
        );
        settings.insert(
            "FUNCTIONS_EXTENSION_VERSION".to_string(),
            PropertyValue::string("~4"),
        );
        settings.insert(
            "DRAWING_STORAGE_URL".to_string(),
            PropertyValue::reference(self.artifact_storage.clone(), "blob_endpoint"),
        );
        settings.insert(
            "DRAWING_CONTAINER_NAME".to_string(),
            PropertyValue::string(&self.artifact_container),
        );
        settings.insert(
            "SUBSCRIPTION_ID".to_string(),
            PropertyValue::Context(ContextField::SubscriptionId),
        );
        settings.insert(
            "RESOURCE_GROUP_NAME".to_string(),
            PropertyValue::Context(ContextField::ResourceGroup),
        );
        if let Some(plan_id) = &self.plan_id {
            settings.insert("PLAN_ID".to_string(), PropertyValue::string(plan_id));
        }
        if let Some(identity) = &self.identity_name {
            settings.insert("IDENTITY_NAME".to_string(), PropertyValue::string(identity));
        }
        settings
    }
}

impl Fragment for ComputeHost {
    fn key(&self) -> ResourceKey {
        ResourceKey::compute(&self.name)
    }

    fn declaration(&self) -> ResourceDeclaration {
        ResourceDeclaration::compute(&self.name)
            .with_location(&self.location)
            .with_sku(Sku::plan(&self.plan_sku))
            .with_property("runtime", self.runtime.as_str())
            .with_property("identity", "system-assigned")
            .with_property("https_only", true)
            .with_property("app_settings", PropertyValue::Map(self.app_settings()))
    }
}

/// Grants the host's identity a data role on one storage account
#[derive(Debug, Clone)]
pub struct BlobRoleBinding {
    pub host: ResourceKey,
    pub storage: ResourceKey,
    pub role: RoleDefinition,
}

impl Fragment for BlobRoleBinding {
    fn key(&self) -> ResourceKey {
        ResourceKey::role_assignment(format!("{}-{}", self.host.name, self.role))
    }

    fn declaration(&self) -> ResourceDeclaration {
        ResourceDeclaration::role_assignment(self.key().name)
            .with_property(
                "principal",
                PropertyValue::reference(self.host.clone(), "principal_id"),
            )
            .with_property("role", self.role.as_str())
            .with_property("scope", PropertyValue::reference(self.storage.clone(), "id"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> ComputeHost {
        ComputeHost {
            name: "draw-host".to_string(),
            location: "westeurope".to_string(),
            plan_sku: "Y1".to_string(),
            runtime: "python".to_string(),
            state_storage: ResourceKey::storage("drawstate01"),
            artifact_storage: ResourceKey::storage("drawartifacts"),
            artifact_container: "drawfunc".to_string(),
            identity_name: None,
            plan_id: None,
        }
    }

    #[test]
    fn host_settings_reference_storage() {
        let settings = host().app_settings();
        assert!(settings["AzureWebJobsStorage"].contains_secret());
        assert_eq!(
            settings["DRAWING_STORAGE_URL"],
            PropertyValue::reference(ResourceKey::storage("drawartifacts"), "blob_endpoint")
        );
        assert!(!settings.contains_key("PLAN_ID"));
        assert!(!settings.contains_key("IDENTITY_NAME"));
    }

    #[test]
    fn optional_settings_appear_when_set() {
        let host = ComputeHost {
            plan_id: Some("plan-1".to_string()),
            identity_name: Some("draw-identity".to_string()),
            ..host()
        };
        let settings = host.app_settings();
        assert_eq!(settings["PLAN_ID"].as_str(), Some("plan-1"));
        assert_eq!(settings["IDENTITY_NAME"].as_str(), Some("draw-identity"));
    }

    #[test]
    fn fragments_produce_valid_declarations() {
        let binding = BlobRoleBinding {
            host: ResourceKey::compute("draw-host"),
            storage: ResourceKey::storage("drawartifacts"),
            role: RoleDefinition::BlobContributor,
        };
        assert_eq!(binding.key().to_string(), "role-assignment/draw-host-blob-contributor");
        assert!(binding.declaration().validate().is_empty());
        assert!(host().declaration().validate().is_empty());
    }
}
