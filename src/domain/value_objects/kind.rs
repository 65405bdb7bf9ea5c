//! Resource kinds and their schemas
//!
//! A kind's schema says which properties a declaration must carry and which
//! attributes other declarations may reference, split by when the attribute
//! becomes known.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::property::SecretKind;

/// The kind of a cloud resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Storage account (optionally carrying blob containers)
    Storage,
    /// Serverless compute host with a system-assigned identity
    Compute,
    /// Role assignment binding a principal to a resource
    RoleAssignment,
}

/// When an attribute's value becomes known
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeTiming {
    /// Derivable from the declaration and deployment scope alone
    InputTime,
    /// Only known once the backend has created the resource
    CreationTime,
}

/// Static description of what a kind requires and exposes
#[derive(Debug, Clone, Copy)]
pub struct KindSchema {
    pub kind: ResourceKind,
    /// Required fields; `location` and `sku` name declaration fields, the
    /// rest name properties
    pub required: &'static [&'static str],
    pub input_attributes: &'static [&'static str],
    pub creation_attributes: &'static [&'static str],
    pub secrets: &'static [SecretKind],
}

const STORAGE_SCHEMA: KindSchema = KindSchema {
    kind: ResourceKind::Storage,
    required: &["location", "sku"],
    input_attributes: &["id", "name", "location"],
    creation_attributes: &["blob_endpoint"],
    secrets: &[SecretKind::AccessKey, SecretKind::ConnectionString],
};

const COMPUTE_SCHEMA: KindSchema = KindSchema {
    kind: ResourceKind::Compute,
    required: &["location", "sku", "runtime"],
    input_attributes: &["id", "name", "location"],
    creation_attributes: &["default_hostname", "principal_id"],
    secrets: &[],
};

const ROLE_ASSIGNMENT_SCHEMA: KindSchema = KindSchema {
    kind: ResourceKind::RoleAssignment,
    required: &["principal", "role", "scope"],
    input_attributes: &["id", "name"],
    creation_attributes: &[],
    secrets: &[],
};

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Storage,
        ResourceKind::Compute,
        ResourceKind::RoleAssignment,
    ];

    /// Kebab-case name used in keys, state files and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Storage => "storage",
            ResourceKind::Compute => "compute",
            ResourceKind::RoleAssignment => "role-assignment",
        }
    }

    /// Backend provider type used in resource ids
    pub fn provider_type(&self) -> &'static str {
        match self {
            ResourceKind::Storage => "Microsoft.Storage/storageAccounts",
            ResourceKind::Compute => "Microsoft.Web/sites",
            ResourceKind::RoleAssignment => "Microsoft.Authorization/roleAssignments",
        }
    }

    pub fn schema(&self) -> &'static KindSchema {
        match self {
            ResourceKind::Storage => &STORAGE_SCHEMA,
            ResourceKind::Compute => &COMPUTE_SCHEMA,
            ResourceKind::RoleAssignment => &ROLE_ASSIGNMENT_SCHEMA,
        }
    }
}

impl KindSchema {
    /// Timing of a referenceable attribute, `None` if the kind has no such attribute
    pub fn attribute_timing(&self, attribute: &str) -> Option<AttributeTiming> {
        if self.input_attributes.contains(&attribute) {
            Some(AttributeTiming::InputTime)
        } else if self.creation_attributes.contains(&attribute) {
            Some(AttributeTiming::CreationTime)
        } else {
            None
        }
    }

    pub fn exposes_secret(&self, secret: SecretKind) -> bool {
        self.secrets.contains(&secret)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "storage" => Ok(ResourceKind::Storage),
            "compute" => Ok(ResourceKind::Compute),
            "role-assignment" | "roleassignment" | "binding" => Ok(ResourceKind::RoleAssignment),
            other => Err(format!("unknown resource kind '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("queue".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn compute_principal_is_creation_time() {
        let schema = ResourceKind::Compute.schema();
        assert_eq!(
            schema.attribute_timing("principal_id"),
            Some(AttributeTiming::CreationTime)
        );
        assert_eq!(schema.attribute_timing("id"), Some(AttributeTiming::InputTime));
        assert_eq!(schema.attribute_timing("access_key"), None);
    }

    #[test]
    fn only_storage_exposes_secrets() {
        assert!(ResourceKind::Storage
            .schema()
            .exposes_secret(SecretKind::ConnectionString));
        assert!(!ResourceKind::Compute
            .schema()
            .exposes_secret(SecretKind::AccessKey));
    }
}
