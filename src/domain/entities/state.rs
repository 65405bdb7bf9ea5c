//! Deployment state entity - the declaration to live-identity map
//!
//! Records, for every declaration the engine has touched, which live resource
//! it maps to, the fingerprint of the configuration that was applied and
//! whether that step converged. It is a pure data structure; persistence is
//! handled by a `StateRepository`.
//!
//! Only ids, fingerprints and non-secret outputs are stored. Resolved property
//! values never enter the state, so derived secrets cannot be persisted here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{DeploymentScope, Fingerprint, ResourceId, ResourceKey};

/// Outcome of the last apply of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Converged,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Converged => "converged",
            StepStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "converged" => Some(StepStatus::Converged),
            "failed" => Some(StepStatus::Failed),
            _ => None,
        }
    }
}

/// State entry for a single declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    resource_id: ResourceId,
    fingerprint: Fingerprint,
    status: StepStatus,
    applied_at: DateTime<Utc>,
}

impl StateEntry {
    pub fn new(
        resource_id: ResourceId,
        fingerprint: Fingerprint,
        status: StepStatus,
        applied_at: DateTime<Utc>,
    ) -> Self {
        Self {
            resource_id,
            fingerprint,
            status,
            applied_at,
        }
    }

    pub fn converged(resource_id: ResourceId, fingerprint: Fingerprint) -> Self {
        Self::new(resource_id, fingerprint, StepStatus::Converged, Utc::now())
    }

    pub fn failed(resource_id: ResourceId, fingerprint: Fingerprint) -> Self {
        Self::new(resource_id, fingerprint, StepStatus::Failed, Utc::now())
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    pub fn is_converged(&self) -> bool {
        self.status == StepStatus::Converged
    }
}

/// The persisted deployment state
///
/// Keys are formatted as `{kind}/{name}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentState {
    /// Format version
    version: u32,
    scope: Option<DeploymentScope>,
    entries: BTreeMap<String, StateEntry>,
    outputs: BTreeMap<String, String>,
}

impl DeploymentState {
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            scope: None,
            entries: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn scope(&self) -> Option<&DeploymentScope> {
        self.scope.as_ref()
    }

    pub fn set_scope(&mut self, scope: DeploymentScope) {
        self.scope = Some(scope);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&StateEntry> {
        self.entries.get(&key.state_key())
    }

    pub fn record(&mut self, key: &ResourceKey, entry: StateEntry) {
        self.entries.insert(key.state_key(), entry);
    }

    pub fn set_entry(&mut self, key: impl Into<String>, entry: StateEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Drop entries whose key fails `keep`, returning the dropped keys
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let dropped: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !keep(k))
            .cloned()
            .collect();
        for key in &dropped {
            self.entries.remove(key);
        }
        dropped
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &StateEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    pub fn set_outputs(&mut self, outputs: BTreeMap<String, String>) {
        self.outputs = outputs;
    }

    pub fn clear_outputs(&mut self) {
        self.outputs.clear();
    }
}
