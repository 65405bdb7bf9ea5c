//! Converge Options
//!
//! Configuration types for converge and plan operations.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::value_objects::DeploymentScope;

use super::retry::RetryPolicy;

/// Options for the converge use case
#[derive(Debug, Clone)]
pub struct ConvergeOptions {
    /// Subscription and resource group to deploy into
    pub scope: DeploymentScope,
    /// Deployment state file
    pub state_path: PathBuf,
    /// Retry budget for each backend call
    pub retry: RetryPolicy,
    /// Maximum number of independent steps applied at once
    pub parallelism: usize,
    /// List the scope and report resources no declaration manages
    pub detect_unmanaged: bool,
}

impl ConvergeOptions {
    pub fn new(scope: DeploymentScope, state_path: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            state_path: state_path.into(),
            retry: RetryPolicy::default(),
            parallelism: 1,
            detect_unmanaged: true,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_unmanaged_detection(mut self, enabled: bool) -> Self {
        self.detect_unmanaged = enabled;
        self
    }
}

/// Cooperative cancellation, checked between steps.
///
/// A step already submitted to the backend always runs to completion and is
/// recorded before cancellation is honoured.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
