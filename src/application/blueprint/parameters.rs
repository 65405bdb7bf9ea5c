//! Blueprint parameters
//!
//! Everything a user supplies to stamp out the draw backend, loaded from a
//! TOML or YAML file. Validation checks the backend's naming rules and known
//! SKUs up front and collects every issue in one pass.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{parse_with_warnings, ConfigWarning, FileFormat};
use crate::domain::value_objects::{RoleDefinition, PLAN_SKUS, STORAGE_SKUS};
use crate::error::{ProvisionError, ProvisionResult, ValidationIssue};

/// Worker runtimes the compute host can run
pub const RUNTIMES: &[&str] = &["python", "node", "dotnet-isolated", "java", "powershell"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub location: String,

    /// Storage account backing the host's runtime state
    #[serde(default)]
    pub state_storage_name: String,

    #[serde(default)]
    pub compute_name: String,

    /// Separate account for generated diagrams; the state account is used
    /// when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_storage_name: Option<String>,

    #[serde(default = "default_artifact_container")]
    pub artifact_container: String,

    #[serde(default = "default_storage_sku")]
    pub storage_sku: String,

    #[serde(default = "default_plan_sku")]
    pub plan_sku: String,

    #[serde(default = "default_runtime")]
    pub runtime: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    #[serde(default = "default_role")]
    pub role: String,
}

fn default_artifact_container() -> String {
    "drawfunc".to_string()
}

fn default_storage_sku() -> String {
    "Standard_LRS".to_string()
}

fn default_plan_sku() -> String {
    "Y1".to_string()
}

fn default_runtime() -> String {
    "python".to_string()
}

fn default_role() -> String {
    RoleDefinition::default().as_str().to_string()
}

impl Parameters {
    /// Parameters with the required names set and everything else defaulted
    pub fn new(
        location: impl Into<String>,
        state_storage_name: impl Into<String>,
        compute_name: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            state_storage_name: state_storage_name.into(),
            compute_name: compute_name.into(),
            artifact_storage_name: None,
            artifact_container: default_artifact_container(),
            storage_sku: default_storage_sku(),
            plan_sku: default_plan_sku(),
            runtime: default_runtime(),
            identity_name: None,
            plan_id: None,
            role: default_role(),
        }
    }

    pub fn with_artifact_storage(mut self, name: impl Into<String>) -> Self {
        self.artifact_storage_name = Some(name.into());
        self
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file, collecting unknown keys
    /// as warnings
    pub fn load(path: &Path) -> ProvisionResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path).map_err(|e| ProvisionError::Config {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        parse_with_warnings(&content, FileFormat::from_path(path), path)
    }

    /// Name of the account that holds the artifact container
    pub fn artifact_account(&self) -> &str {
        self.artifact_storage_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(self.state_storage_name.as_str())
    }

    /// Whether artifacts live in their own storage account
    pub fn has_separate_artifact_storage(&self) -> bool {
        self.artifact_account() != self.state_storage_name
    }

    pub fn role_definition(&self) -> ProvisionResult<RoleDefinition> {
        self.role
            .parse()
            .map_err(|e: String| ProvisionError::invalid("parameters.role", e))
    }

    /// Every problem with these parameters, in field order
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.location.trim().is_empty() {
            issues.push(issue("location", "is required"));
        }
        check_name(&mut issues, "state_storage_name", &self.state_storage_name, storage_name_rule);
        check_name(&mut issues, "compute_name", &self.compute_name, compute_name_rule);
        if let Some(name) = self.artifact_storage_name.as_deref() {
            check_name(&mut issues, "artifact_storage_name", name, storage_name_rule);
        }
        check_name(&mut issues, "artifact_container", &self.artifact_container, container_name_rule);

        if !STORAGE_SKUS.contains(&self.storage_sku.as_str()) {
            issues.push(issue(
                "storage_sku",
                format!("unknown SKU '{}' (expected one of {})", self.storage_sku, STORAGE_SKUS.join(", ")),
            ));
        }
        if !PLAN_SKUS.contains(&self.plan_sku.as_str()) {
            issues.push(issue(
                "plan_sku",
                format!("unknown SKU '{}' (expected one of {})", self.plan_sku, PLAN_SKUS.join(", ")),
            ));
        }
        if !RUNTIMES.contains(&self.runtime.as_str()) {
            issues.push(issue(
                "runtime",
                format!("unknown runtime '{}' (expected one of {})", self.runtime, RUNTIMES.join(", ")),
            ));
        }
        if let Some(name) = self.identity_name.as_deref() {
            if name.trim().is_empty() {
                issues.push(issue("identity_name", "must not be empty when set"));
            }
        }
        if let Err(e) = self.role.parse::<RoleDefinition>() {
            issues.push(issue("role", e));
        }

        issues
    }

    pub fn validated(self) -> ProvisionResult<Self> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(self)
        } else {
            Err(ProvisionError::Validation { issues })
        }
    }
}

fn issue(field: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(format!("parameters.{}", field), message)
}

fn check_name(
    issues: &mut Vec<ValidationIssue>,
    field: &str,
    value: &str,
    rule: fn(&str) -> Result<(), String>,
) {
    if value.is_empty() {
        issues.push(issue(field, "is required"));
    } else if let Err(message) = rule(value) {
        issues.push(issue(field, format!("'{}' {}", value, message)));
    }
}

/// Storage accounts: 3-24 lowercase letters and digits
fn storage_name_rule(name: &str) -> Result<(), String> {
    if !(3..=24).contains(&name.len()) {
        return Err("must be 3-24 characters long".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err("may only contain lowercase letters and digits".to_string());
    }
    Ok(())
}

/// Compute hosts: 2-60 letters, digits and hyphens, no hyphen at either end
fn compute_name_rule(name: &str) -> Result<(), String> {
    if !(2..=60).contains(&name.len()) {
        return Err("must be 2-60 characters long".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("may only contain letters, digits and hyphens".to_string());
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err("must not start or end with a hyphen".to_string());
    }
    Ok(())
}

/// Blob containers: 3-63 lowercase letters, digits and single hyphens
fn container_name_rule(name: &str) -> Result<(), String> {
    if !(3..=63).contains(&name.len()) {
        return Err("must be 3-63 characters long".to_string());
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("may only contain lowercase letters, digits and hyphens".to_string());
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err("must start and end with a letter or digit".to_string());
    }
    if name.contains("--") {
        return Err("must not contain consecutive hyphens".to_string());
    }
    Ok(())
}
