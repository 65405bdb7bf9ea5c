//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::converge::{ConvergeOptions, RetryPolicy};
use crate::domain::value_objects::DeploymentScope;
use crate::error::{ProvisionError, ProvisionResult, ValidationIssue};

use super::loader::{self, ConfigWarning};

/// Deployment target
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScopeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
}

/// Retry budget for backend calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_base_delay_ms() -> u64 {
    RetryPolicy::DEFAULT_BASE_DELAY_MS
}

fn default_max_delay_ms() -> u64 {
    RetryPolicy::DEFAULT_MAX_DELAY_MS
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// List the scope before applying and report unmanaged resources
    #[serde(default = "default_true")]
    pub detect_unmanaged: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            detect_unmanaged: true,
        }
    }
}

fn default_parallelism() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Deployment state file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".drawstack/state.toml")
}

/// Emulated backend file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    #[serde(default = "default_backend_path")]
    pub path: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            path: default_backend_path(),
        }
    }
}

fn default_backend_path() -> PathBuf {
    PathBuf::from(".drawstack/cloud.json")
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> ProvisionResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> ProvisionResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load from an explicit file, `./drawstack.toml`, the user config, or
    /// defaults, in that order
    pub fn load_or_default(explicit: Option<&Path>) -> ProvisionResult<(Self, Vec<ConfigWarning>)> {
        loader::load_or_default(explicit)
    }

    /// Apply environment variable overrides (DRAWSTACK_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// The scope to deploy into; both parts are required
    pub fn deployment_scope(&self) -> ProvisionResult<DeploymentScope> {
        let subscription = self.scope.subscription_id.as_deref().filter(|s| !s.trim().is_empty());
        let group = self.scope.resource_group.as_deref().filter(|s| !s.trim().is_empty());
        match (subscription, group) {
            (Some(subscription), Some(group)) => Ok(DeploymentScope::new(subscription, group)),
            _ => {
                let mut issues = Vec::new();
                if subscription.is_none() {
                    issues.push(ValidationIssue::new(
                        "scope.subscription_id",
                        "is required (config file or DRAWSTACK_SUBSCRIPTION_ID)",
                    ));
                }
                if group.is_none() {
                    issues.push(ValidationIssue::new(
                        "scope.resource_group",
                        "is required (config file or DRAWSTACK_RESOURCE_GROUP)",
                    ));
                }
                Err(ProvisionError::Validation { issues })
            }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            self.retry.base_delay_ms,
            self.retry.max_delay_ms,
        )
    }

    /// Engine options for a converge or plan run
    pub fn converge_options(&self) -> ProvisionResult<ConvergeOptions> {
        Ok(ConvergeOptions::new(self.deployment_scope()?, self.state.path.clone())
            .with_retry(self.retry_policy())
            .with_parallelism(self.engine.parallelism)
            .with_unmanaged_detection(self.engine.detect_unmanaged))
    }
}
