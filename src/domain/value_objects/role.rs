//! Built-in role definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scope::DeploymentScope;

/// A role that an identity binding can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RoleDefinition {
    /// Storage Blob Data Contributor
    #[default]
    BlobContributor,
    /// Storage Blob Data Reader
    BlobReader,
    /// Reader
    Reader,
}

impl RoleDefinition {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleDefinition::BlobContributor => "blob-contributor",
            RoleDefinition::BlobReader => "blob-reader",
            RoleDefinition::Reader => "reader",
        }
    }

    /// Well-known role definition GUID
    pub fn guid(&self) -> &'static str {
        match self {
            RoleDefinition::BlobContributor => "ba92f5b4-2d11-453d-a403-e96b0029c9fe",
            RoleDefinition::BlobReader => "2a2b9908-6ea1-4ae2-8e65-a410df84e7d1",
            RoleDefinition::Reader => "acdd72a7-3385-48ef-bd42-f606fba81ae7",
        }
    }

    /// Fully qualified role definition id within a subscription
    pub fn definition_id(&self, scope: &DeploymentScope) -> String {
        format!(
            "{}/providers/Microsoft.Authorization/roleDefinitions/{}",
            scope.subscription_id_path(),
            self.guid()
        )
    }
}

impl fmt::Display for RoleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleDefinition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blob-contributor" | "storage-blob-data-contributor" => {
                Ok(RoleDefinition::BlobContributor)
            }
            "blob-reader" | "storage-blob-data-reader" => Ok(RoleDefinition::BlobReader),
            "reader" => Ok(RoleDefinition::Reader),
            other => Err(format!(
                "unknown role '{}' (expected blob-contributor, blob-reader or reader)",
                other
            )),
        }
    }
}
