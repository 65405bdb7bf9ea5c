//! TOML State Repository
//!
//! Implements the StateRepository port. The state file is versioned TOML,
//! written atomically, and guarded by an exclusive lock on `<state>.lock`
//! for the whole deployment.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{DeploymentState, StateEntry, StepStatus};
use crate::domain::ports::{lock_path_for, StateError, StateGuard, StateRepository, StateResult};
use crate::domain::value_objects::{DeploymentScope, Fingerprint, ResourceId};
use crate::infrastructure::fs::atomic_write;

/// TOML representation of one declaration's entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TomlStateEntry {
    id: String,
    fingerprint: String,
    status: String,
    applied_at: DateTime<Utc>,
}

/// TOML representation of the state file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TomlState {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<DeploymentScope>,
    #[serde(default)]
    resources: BTreeMap<String, TomlStateEntry>,
    #[serde(default)]
    outputs: BTreeMap<String, String>,
}

/// File-backed deployment state
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlStateRepository;

impl TomlStateRepository {
    pub fn new() -> Self {
        Self
    }
}

/// Exclusive lock on a state file, released on drop
struct FileLockGuard {
    file: fs::File,
}

impl StateGuard for FileLockGuard {}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Parse state file content
pub fn parse_state(content: &str) -> StateResult<DeploymentState> {
    let toml_state: TomlState =
        toml::from_str(content).map_err(|e| StateError::Parse(e.to_string()))?;

    if toml_state.version != DeploymentState::VERSION {
        return Err(StateError::VersionMismatch {
            found: toml_state.version,
            expected: DeploymentState::VERSION,
        });
    }

    let mut state = DeploymentState::new();
    if let Some(scope) = toml_state.scope {
        state.set_scope(scope);
    }
    for (key, entry) in toml_state.resources {
        let status = StepStatus::parse(&entry.status).ok_or_else(|| {
            StateError::Parse(format!("unknown status '{}' for {}", entry.status, key))
        })?;
        state.set_entry(
            key,
            StateEntry::new(
                ResourceId::new(entry.id),
                Fingerprint::new(&entry.fingerprint),
                status,
                entry.applied_at,
            ),
        );
    }
    state.set_outputs(toml_state.outputs);
    Ok(state)
}

/// Render state as TOML
pub fn render_state(state: &DeploymentState) -> StateResult<String> {
    let resources = state
        .entries()
        .map(|(key, entry)| {
            (
                key.to_string(),
                TomlStateEntry {
                    id: entry.resource_id().to_string(),
                    fingerprint: entry.fingerprint().to_string(),
                    status: entry.status().as_str().to_string(),
                    applied_at: entry.applied_at(),
                },
            )
        })
        .collect();

    let toml_state = TomlState {
        version: state.version(),
        scope: state.scope().cloned(),
        resources,
        outputs: state.outputs().clone(),
    };
    toml::to_string_pretty(&toml_state).map_err(|e| StateError::Parse(e.to_string()))
}

impl StateRepository for TomlStateRepository {
    type State = DeploymentState;

    fn load(&self, path: &Path) -> StateResult<DeploymentState> {
        if !path.exists() {
            return Ok(DeploymentState::new());
        }
        let content = fs::read_to_string(path).map_err(|e| StateError::Io(e.to_string()))?;
        parse_state(&content)
    }

    fn save(&self, state: &DeploymentState, path: &Path) -> StateResult<()> {
        let content = render_state(state)?;
        atomic_write(path, content.as_bytes()).map_err(|e| StateError::Io(e.to_string()))?;
        tracing::trace!(path = %path.display(), entries = state.len(), "state saved");
        Ok(())
    }

    fn lock(&self, path: &Path) -> StateResult<Box<dyn StateGuard>> {
        let lock_path = lock_path_for(path);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::Io(e.to_string()))?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StateError::Io(e.to_string()))?;
        file.try_lock_exclusive()
            .map_err(|_| StateError::Locked(lock_path.display().to_string()))?;
        tracing::debug!(lock = %lock_path.display(), "state locked");
        Ok(Box::new(FileLockGuard { file }))
    }
}
