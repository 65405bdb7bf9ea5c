//! Deployment outputs
//!
//! Outputs are declared with the same typed values as properties and are
//! resolved only once the whole graph has converged.

use crate::domain::value_objects::PropertyValue;
use crate::error::ValidationIssue;

/// A named output to compute after convergence
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDeclaration {
    pub name: String,
    pub value: PropertyValue,
}

impl OutputDeclaration {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Outputs are exposed to users, so they may never carry secrets
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::new("outputs", "output name must not be empty"));
        }
        if self.value.contains_secret() {
            issues.push(ValidationIssue::new(
                format!("outputs.{}", self.name),
                "outputs must not reference secrets",
            ));
        }
        issues
    }
}

/// A resolved output value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentOutput {
    pub name: String,
    pub value: String,
}
