//! SKU / tier selector

use std::fmt;

use serde::{Deserialize, Serialize};

/// SKU of a resource (`Standard_LRS`, `Y1`, ...) with an optional tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
}

/// Storage SKUs the backend accepts
pub const STORAGE_SKUS: &[&str] = &[
    "Standard_LRS",
    "Standard_GRS",
    "Standard_RAGRS",
    "Standard_ZRS",
    "Premium_LRS",
];

/// Hosting plan SKUs for the compute host
pub const PLAN_SKUS: &[&str] = &["Y1", "EP1", "EP2", "EP3"];

impl Sku {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tier: None,
        }
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = Some(tier.into());
        self
    }

    /// Tier implied by a storage SKU name (`Standard_LRS` -> `Standard`)
    pub fn storage(name: impl Into<String>) -> Self {
        let name = name.into();
        let tier = name.split('_').next().unwrap_or_default().to_string();
        Self::new(name).with_tier(tier)
    }

    /// Tier implied by a hosting plan SKU (`Y1` -> `Dynamic`)
    pub fn plan(name: impl Into<String>) -> Self {
        let name = name.into();
        let tier = if name == "Y1" {
            "Dynamic"
        } else {
            "ElasticPremium"
        };
        Self::new(name).with_tier(tier)
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tier {
            Some(tier) => write!(f, "{} ({})", self.name, tier),
            None => f.write_str(&self.name),
        }
    }
}
