//! Error types for drawstack
//!
//! Uses `thiserror` for library errors. The CLI wraps these in `anyhow` at the
//! top level and maps them to exit codes through [`ProvisionError::exit_code`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::value_objects::ResourceKey;

/// Result type alias for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// A single problem found while validating input.
///
/// Validation collects every issue it can find instead of stopping at the
/// first one, so users can fix a parameters file in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// What the issue is about (`storage/statedata`, `parameters.location`, ...)
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// The operation that was being attempted against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    CreateOrUpdate,
    List,
    ListKeys,
    AssignRole,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Get => "get",
            Operation::CreateOrUpdate => "create-or-update",
            Operation::List => "list",
            Operation::ListKeys => "list-keys",
            Operation::AssignRole => "assign-role",
        };
        f.write_str(s)
    }
}

/// Main error type for provisioning
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Bad input caught before any backend call
    #[error("validation failed: {}", join_issues(.issues))]
    Validation { issues: Vec<ValidationIssue> },

    /// The declaration graph cannot be ordered
    #[error("cyclic dependency: {}", render_cycle(.cycle))]
    CyclicDependency { cycle: Vec<ResourceKey> },

    /// Transient backend failures that outlived the retry budget
    #[error("{operation} on {key} still failing after {attempts} attempts: {message}")]
    TransientBackend {
        key: ResourceKey,
        operation: Operation,
        attempts: u32,
        message: String,
    },

    /// Live resource exists with an incompatible kind or configuration
    #[error("conflict on {key} ({existing}): {message}")]
    Conflict {
        key: ResourceKey,
        existing: String,
        message: String,
    },

    /// Non-transient backend failure
    #[error("{operation} on {key} failed: {message}")]
    Backend {
        key: ResourceKey,
        operation: Operation,
        message: String,
    },

    /// An identity binding was attempted before its principal existed
    #[error("principal of {resource} is not ready: the resource has not reported a principal id")]
    PrincipalNotReady { resource: ResourceKey },

    /// An output was requested before its resource converged
    #[error("output '{output}' is unresolved: {reason}")]
    UnresolvedOutput { output: String, reason: String },

    /// A property reference could not be resolved at apply time
    #[error("{from} references {reference}, which has not converged")]
    UnresolvedReference { from: ResourceKey, reference: String },

    /// Deployment state file problems
    #[error("state file {path}: {message}")]
    State { path: PathBuf, message: String },

    /// Configuration file problems
    #[error("invalid configuration in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// The deployment was cancelled between steps
    #[error("deployment cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvisionError {
    /// Build a validation error from a single issue
    pub fn invalid(subject: impl Into<String>, message: impl Into<String>) -> Self {
        ProvisionError::Validation {
            issues: vec![ValidationIssue::new(subject, message)],
        }
    }

    /// Whether this error was raised before anything reached the backend
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            ProvisionError::Validation { .. }
                | ProvisionError::CyclicDependency { .. }
                | ProvisionError::Config { .. }
        )
    }

    /// Process exit code for the CLI front-end
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::Validation { .. } | ProvisionError::Config { .. } => {
                exit_code::VALIDATION
            }
            ProvisionError::CyclicDependency { .. } => exit_code::CYCLE,
            ProvisionError::TransientBackend { .. }
            | ProvisionError::Conflict { .. }
            | ProvisionError::Backend { .. }
            | ProvisionError::PrincipalNotReady { .. }
            | ProvisionError::UnresolvedReference { .. }
            | ProvisionError::UnresolvedOutput { .. } => exit_code::PARTIAL_APPLY,
            ProvisionError::Cancelled => exit_code::CANCELLED,
            ProvisionError::State { .. } | ProvisionError::Io(_) => exit_code::FAILURE,
        }
    }
}

/// Exit codes used by the CLI
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const VALIDATION: i32 = 2;
    pub const CYCLE: i32 = 3;
    pub const PARTIAL_APPLY: i32 = 4;
    pub const CANCELLED: i32 = 5;
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn render_cycle(cycle: &[ResourceKey]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ResourceKind;

    #[test]
    fn test_error_display_validation_joins_issues() {
        let err = ProvisionError::Validation {
            issues: vec![
                ValidationIssue::new("parameters.location", "must not be empty"),
                ValidationIssue::new("storage/x", "name too short"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "validation failed: parameters.location: must not be empty; storage/x: name too short"
        );
    }

    #[test]
    fn test_error_display_cycle() {
        let a = ResourceKey::new(ResourceKind::Storage, "a");
        let b = ResourceKey::new(ResourceKind::Compute, "b");
        let err = ProvisionError::CyclicDependency {
            cycle: vec![a.clone(), b, a],
        };
        assert_eq!(
            err.to_string(),
            "cyclic dependency: storage/a -> compute/b -> storage/a"
        );
    }

    #[test]
    fn test_exit_codes_distinguish_failure_classes() {
        assert_eq!(ProvisionError::invalid("x", "y").exit_code(), 2);
        assert_eq!(
            ProvisionError::CyclicDependency { cycle: vec![] }.exit_code(),
            3
        );
        assert_eq!(
            ProvisionError::PrincipalNotReady {
                resource: ResourceKey::new(ResourceKind::Compute, "host"),
            }
            .exit_code(),
            4
        );
        assert_eq!(ProvisionError::Cancelled.exit_code(), 5);
    }

    #[test]
    fn test_preflight_errors() {
        assert!(ProvisionError::invalid("x", "y").is_preflight());
        assert!(!ProvisionError::Cancelled.is_preflight());
    }
}
