//! Resource key value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::kind::ResourceKind;

/// Identity of a declaration within a deployment: kind plus name.
///
/// Keys order by name first so that tie-breaking in the build order follows
/// declaration names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn storage(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Storage, name)
    }

    pub fn compute(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Compute, name)
    }

    pub fn role_assignment(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::RoleAssignment, name)
    }

    /// Key used in the state file (`storage/statedata`)
    pub fn state_key(&self) -> String {
        self.to_string()
    }
}

impl Ord for ResourceKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl PartialOrd for ResourceKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

impl FromStr for ResourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid resource key '{}': expected kind/name", s))?;
        if name.is_empty() {
            return Err(format!("invalid resource key '{}': empty name", s));
        }
        Ok(Self::new(kind.parse()?, name))
    }
}
