//! Converge Result
//!
//! Result types for converge and plan operations.

use crate::domain::entities::DeploymentOutput;
use crate::domain::services::{PropertyChange, ResourceAction};
use crate::domain::value_objects::{ResourceId, ResourceKey};
use crate::error::exit_code;

/// How a single step ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Created,
    Updated,
    Unchanged,
    /// Applying failed; the message names the operation that failed
    Failed { error: String },
    /// Not attempted because these dependencies did not converge
    Blocked { waiting_on: Vec<ResourceKey> },
    /// Not attempted because the run was cancelled first
    Cancelled,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepOutcome::Created => "created",
            StepOutcome::Updated => "updated",
            StepOutcome::Unchanged => "unchanged",
            StepOutcome::Failed { .. } => "failed",
            StepOutcome::Blocked { .. } => "blocked",
            StepOutcome::Cancelled => "cancelled",
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            StepOutcome::Created | StepOutcome::Updated | StepOutcome::Unchanged
        )
    }

    /// Whether the step wrote to the backend
    pub fn is_write(&self) -> bool {
        matches!(self, StepOutcome::Created | StepOutcome::Updated)
    }
}

/// Report for a single step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Position in the build order
    pub index: usize,
    pub key: ResourceKey,
    pub outcome: StepOutcome,
}

/// Result of a converge run
#[derive(Debug, Clone, Default)]
pub struct ConvergeReport {
    /// One report per declaration, in build order
    pub steps: Vec<StepReport>,
    /// Resolved outputs; empty unless every step converged
    pub outputs: Vec<DeploymentOutput>,
    /// Resources found in the scope that no declaration manages
    pub unmanaged: Vec<ResourceId>,
    pub cancelled: bool,
}

impl ConvergeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.steps.iter().all(|s| s.outcome.is_converged())
    }

    /// Number of backend writes (creates plus updates)
    pub fn write_count(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_write()).count()
    }

    pub fn count(&self, outcome: &str) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome.as_str() == outcome)
            .count()
    }

    pub fn converged(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| s.outcome.is_converged())
    }

    /// Steps that did not converge
    pub fn unconverged(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.outcome.is_converged())
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }

    /// Exit code for the CLI front-end
    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            exit_code::CANCELLED
        } else if self.is_success() {
            exit_code::SUCCESS
        } else {
            exit_code::PARTIAL_APPLY
        }
    }
}

/// A step as a dry run sees it
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub index: usize,
    pub key: ResourceKey,
    pub action: ResourceAction,
    /// Resolved payload, secrets redacted, unknowns rendered as such
    pub properties: Vec<(String, String)>,
}

impl PlannedStep {
    pub fn changes(&self) -> &[PropertyChange] {
        match &self.action {
            ResourceAction::Update { changes } => changes,
            _ => &[],
        }
    }
}

/// Result of a dry run
#[derive(Debug, Clone, Default)]
pub struct ConvergePlan {
    pub steps: Vec<PlannedStep>,
    pub unmanaged: Vec<ResourceId>,
}

impl ConvergePlan {
    pub fn has_changes(&self) -> bool {
        self.steps.iter().any(|s| s.action.is_write())
    }

    pub fn has_conflicts(&self) -> bool {
        self.steps.iter().any(|s| s.action.is_conflict())
    }

    pub fn count(&self, action: &str) -> usize {
        self.steps
            .iter()
            .filter(|s| s.action.as_str() == action)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(index: usize, name: &str, outcome: StepOutcome) -> StepReport {
        StepReport {
            index,
            key: ResourceKey::storage(name),
            outcome,
        }
    }

    #[test]
    fn full_convergence_exits_zero() {
        let report = ConvergeReport {
            steps: vec![
                step(0, "a", StepOutcome::Created),
                step(1, "b", StepOutcome::Unchanged),
            ],
            ..ConvergeReport::default()
        };
        assert!(report.is_success());
        assert_eq!(report.write_count(), 1);
        assert_eq!(report.exit_code(), exit_code::SUCCESS);
    }

    #[test]
    fn failure_or_block_is_partial_apply() {
        let report = ConvergeReport {
            steps: vec![
                step(0, "a", StepOutcome::Created),
                step(
                    1,
                    "b",
                    StepOutcome::Failed {
                        error: "boom".to_string(),
                    },
                ),
                step(
                    2,
                    "c",
                    StepOutcome::Blocked {
                        waiting_on: vec![ResourceKey::storage("b")],
                    },
                ),
            ],
            ..ConvergeReport::default()
        };
        assert_eq!(report.exit_code(), exit_code::PARTIAL_APPLY);
        assert_eq!(report.unconverged().count(), 2);
        assert_eq!(report.count("blocked"), 1);
    }

    #[test]
    fn cancellation_wins() {
        let report = ConvergeReport {
            cancelled: true,
            ..ConvergeReport::default()
        };
        assert_eq!(report.exit_code(), exit_code::CANCELLED);
    }
}
