//! Converge Use Case
//!
//! Orchestrates a deployment:
//! 1. Validate declarations and build the dependency graph (no backend calls)
//! 2. Lock and load the deployment state
//! 3. List the scope and report unmanaged resources
//! 4. Apply each step in build order (or wave by wave when parallel)
//! 5. Resolve outputs once every step has converged
//!
//! This use case is pure orchestration - the decisions live in domain services.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crate::application::blueprint::DeclarationSet;
use crate::domain::entities::{DeploymentState, LiveResource, ResourceDeclaration};
use crate::domain::ports::{
    CloudBackend, NoopEventSink, ProvisionEvent, ProvisionEventSink, StateRepository,
};
use crate::domain::services::{
    BindingAction, BindingRequest, BuildOrder, DependencyGraph, IdentityBinder, OutputResolver,
    Planner, PropertyResolver, ResourceAction,
};
use crate::domain::value_objects::{ResourceId, ResourceKey, ResourceKind};
use crate::error::{Operation, ProvisionError, ProvisionResult, ValidationIssue};

use super::options::{CancellationToken, ConvergeOptions};
use super::result::{ConvergePlan, ConvergeReport, PlannedStep, StepReport};
use super::runner::{BackendCaller, StepRunner};

/// Converge use case - drives live state to match a declaration set
///
/// Parameterized by its ports so tests can run it against an in-memory
/// backend and state repository.
pub struct ConvergeUseCase<B, SR>
where
    B: CloudBackend,
    SR: StateRepository<State = DeploymentState>,
{
    backend: B,
    state_repo: SR,
    events: Arc<dyn ProvisionEventSink>,
    cancel: CancellationToken,
}

impl<B, SR> ConvergeUseCase<B, SR>
where
    B: CloudBackend,
    SR: StateRepository<State = DeploymentState>,
{
    pub fn new(backend: B, state_repo: SR) -> Self {
        Self {
            backend,
            state_repo,
            events: Arc::new(NoopEventSink),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn ProvisionEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Outputs recorded by the last fully converged run
    pub fn recorded_outputs(&self, path: &Path) -> ProvisionResult<BTreeMap<String, String>> {
        let state = self.state_repo.load(path).map_err(|e| e.at(path))?;
        Ok(state.outputs().clone())
    }

    /// Check every declaration and output, then order them.
    ///
    /// Never touches the backend or the state file.
    pub fn validate(set: &DeclarationSet) -> ProvisionResult<BuildOrder> {
        let mut issues: Vec<ValidationIssue> = Vec::new();
        for decl in set.declarations() {
            issues.extend(decl.validate());
        }

        let declared: BTreeSet<&ResourceKey> = set.declarations().iter().map(|d| d.key()).collect();
        for output in set.outputs() {
            issues.extend(output.validate());
            output.value.visit_refs(&mut |site| {
                if !declared.contains(site.target()) {
                    issues.push(ValidationIssue::new(
                        format!("outputs.{}", output.name),
                        format!("references undeclared resource {}", site.target()),
                    ));
                }
            });
        }

        match DependencyGraph::build(set.declarations()) {
            Ok(order) if issues.is_empty() => Ok(order),
            Ok(_) => Err(ProvisionError::Validation { issues }),
            Err(ProvisionError::Validation { issues: graph_issues }) => {
                issues.extend(graph_issues);
                Err(ProvisionError::Validation { issues })
            }
            Err(other) if issues.is_empty() => Err(other),
            Err(_) => Err(ProvisionError::Validation { issues }),
        }
    }

    /// Converge the live backend to `set`.
    ///
    /// Steps that fail are reported, not returned as errors; converged steps
    /// stay applied and a re-run resumes from the first unconverged one.
    pub fn execute(&self, set: &DeclarationSet, options: &ConvergeOptions) -> ProvisionResult<ConvergeReport> {
        let order = Self::validate(set)?;

        let path = &options.state_path;
        let _state_lock = self.state_repo.lock(path).map_err(|e| e.at(path))?;
        let mut state = self.state_repo.load(path).map_err(|e| e.at(path))?;
        match state.scope() {
            Some(recorded) if recorded != &options.scope => {
                return Err(ProvisionError::invalid(
                    "scope",
                    format!(
                        "state file {} belongs to {}, not {}",
                        path.display(),
                        recorded,
                        options.scope
                    ),
                ));
            }
            _ => state.set_scope(options.scope.clone()),
        }

        // Entries for declarations that left the set; their live resources
        // show up as unmanaged below.
        let declared: BTreeSet<String> = set.declarations().iter().map(|d| d.key().state_key()).collect();
        let dropped = state.retain(|key| declared.contains(key));
        if !dropped.is_empty() {
            tracing::info!(entries = ?dropped, "dropping state entries for removed declarations");
        }

        tracing::info!(scope = %options.scope, steps = order.len(), "converging");
        self.events.on_event(ProvisionEvent::Started {
            scope: options.scope.to_string(),
            declaration_count: set.len(),
        });
        self.events.on_event(ProvisionEvent::OrderResolved {
            order: order.steps().iter().map(ToString::to_string).collect(),
        });

        let caller = BackendCaller {
            backend: &self.backend,
            options,
            events: self.events.as_ref(),
        };
        let mut report = ConvergeReport::new();
        report.unmanaged = self.unmanaged(&caller, set);

        let runner = StepRunner::new(caller, &self.state_repo, set, &order, state);
        let (steps, cancelled) = if options.parallelism > 1 {
            self.apply_waves(&runner, &order, options.parallelism)?
        } else {
            self.apply_sequential(&runner, &order)?
        };
        report.steps = steps;
        report.cancelled = cancelled;

        if cancelled {
            tracing::warn!("cancelled between steps");
            self.events.on_event(ProvisionEvent::Cancelled {
                remaining: report.count("cancelled"),
            });
        }

        if report.is_success() {
            let converged = runner.snapshot();
            report.outputs = OutputResolver::new(&options.scope, &converged).resolve_all(set.outputs())?;
            let outputs: BTreeMap<String, String> = report
                .outputs
                .iter()
                .map(|o| (o.name.clone(), o.value.clone()))
                .collect();
            runner.persist(|state| state.set_outputs(outputs))?;
        } else {
            runner.persist(DeploymentState::clear_outputs)?;
        }

        self.events.on_event(ProvisionEvent::Completed {
            created: report.count("created"),
            updated: report.count("updated"),
            unchanged: report.count("unchanged"),
            failed: report.count("failed"),
            blocked: report.count("blocked"),
        });
        Ok(report)
    }

    fn apply_sequential(
        &self,
        runner: &StepRunner<'_, B, SR>,
        order: &BuildOrder,
    ) -> ProvisionResult<(Vec<StepReport>, bool)> {
        let mut reports = Vec::with_capacity(order.len());
        let mut cancelled = false;
        for (index, key) in order.steps().iter().enumerate() {
            cancelled = cancelled || self.cancel.is_cancelled();
            if cancelled {
                reports.push(runner.cancelled(index, key));
            } else {
                reports.push(runner.run_step(index, key)?);
            }
        }
        Ok((reports, cancelled))
    }

    /// Steps inside a wave have no dependency on each other, so up to
    /// `parallelism` of them run at once on scoped threads
    fn apply_waves(
        &self,
        runner: &StepRunner<'_, B, SR>,
        order: &BuildOrder,
        parallelism: usize,
    ) -> ProvisionResult<(Vec<StepReport>, bool)> {
        let mut reports = Vec::with_capacity(order.len());
        let mut cancelled = false;
        for wave in order.waves() {
            for batch in wave.chunks(parallelism) {
                cancelled = cancelled || self.cancel.is_cancelled();
                let indexed: Vec<(usize, &ResourceKey)> = batch
                    .iter()
                    .map(|key| (order.position(key).unwrap_or_default(), key))
                    .collect();
                if cancelled {
                    reports.extend(indexed.iter().map(|(i, key)| runner.cancelled(*i, key)));
                    continue;
                }
                let results: Vec<ProvisionResult<StepReport>> = thread::scope(|s| {
                    let handles: Vec<_> = indexed
                        .iter()
                        .map(|(i, key)| s.spawn(move || runner.run_step(*i, key)))
                        .collect();
                    handles
                        .into_iter()
                        .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                        .collect()
                });
                for result in results {
                    reports.push(result?);
                }
            }
        }
        reports.sort_by_key(|r| r.index);
        Ok((reports, cancelled))
    }

    /// Resources in the scope no declaration manages. Drift detection is
    /// advisory: a failing list is logged and the run continues.
    fn unmanaged(&self, caller: &BackendCaller<'_, B>, set: &DeclarationSet) -> Vec<ResourceId> {
        if !caller.options.detect_unmanaged {
            return Vec::new();
        }
        let scope = &caller.options.scope;
        let listed = caller.options.retry.run(|| self.backend.list(scope), |_, _, _| {});
        let live = match listed {
            Ok(live) => live,
            Err(failure) => {
                tracing::warn!("cannot list {}: {}", scope, failure.error);
                return Vec::new();
            }
        };

        let unmanaged: Vec<ResourceId> = live
            .into_iter()
            .filter(|r| set.declaration(&r.key).is_none())
            .map(|r| r.id)
            .collect();
        if !unmanaged.is_empty() {
            tracing::warn!(count = unmanaged.len(), "unmanaged resources in scope");
            self.events.on_event(ProvisionEvent::UnmanagedDetected {
                ids: unmanaged.iter().map(ToString::to_string).collect(),
            });
        }
        unmanaged
    }

    /// Dry run: compute what `execute` would do using read operations only.
    ///
    /// Secrets are never fetched. Values that only exist after a source is
    /// created show up as unknown.
    pub fn plan(&self, set: &DeclarationSet, options: &ConvergeOptions) -> ProvisionResult<ConvergePlan> {
        let order = Self::validate(set)?;
        let caller = BackendCaller {
            backend: &self.backend,
            options,
            events: self.events.as_ref(),
        };

        let mut plan = ConvergePlan {
            steps: Vec::with_capacity(order.len()),
            unmanaged: self.unmanaged(&caller, set),
        };
        let mut live: BTreeMap<ResourceKey, LiveResource> = BTreeMap::new();

        for (index, key) in order.steps().iter().enumerate() {
            let decl = set
                .declaration(key)
                .ok_or_else(|| ProvisionError::invalid(key.to_string(), "not declared"))?;
            let step = match decl.kind() {
                ResourceKind::RoleAssignment => self.plan_binding(&caller, index, decl, &live)?,
                ResourceKind::Storage | ResourceKind::Compute => {
                    let current = caller.call(index, key, Operation::Get, "", || {
                        self.backend.get(&options.scope, key)
                    })?;
                    let desired = PropertyResolver::for_plan(&options.scope, set.declarations(), &live)
                        .resolve(decl)?;
                    let action = Planner::plan_resource(&desired, current.as_ref());
                    if let Some(current) = current {
                        live.insert(key.clone(), current);
                    }
                    PlannedStep {
                        index,
                        key: key.clone(),
                        action,
                        properties: desired
                            .properties
                            .iter()
                            .map(|(name, value)| (name.clone(), value.render()))
                            .collect(),
                    }
                }
            };
            plan.steps.push(step);
        }
        Ok(plan)
    }

    fn plan_binding(
        &self,
        caller: &BackendCaller<'_, B>,
        index: usize,
        decl: &ResourceDeclaration,
        live: &BTreeMap<ResourceKey, LiveResource>,
    ) -> ProvisionResult<PlannedStep> {
        let scope = &caller.options.scope;
        let request = BindingRequest::from_declaration(decl)?;
        let scope_id = live
            .get(&request.target)
            .map(|l| l.id.clone())
            .unwrap_or_else(|| scope.resource_id(&request.target));

        let mut properties = vec![
            ("role".to_string(), format!("{:?}", request.role.as_str())),
            ("scope".to_string(), format!("{:?}", scope_id.as_str())),
        ];

        let action = match IdentityBinder::bind(&request, live.get(&request.principal), scope_id, scope) {
            Ok(binding) => {
                properties.push(("principal_id".to_string(), format!("{:?}", binding.principal_id)));
                let assignment_id = binding.assignment_id();
                let existing = caller.call(index, decl.key(), Operation::Get, "", || {
                    self.backend.get_role_assignment(&assignment_id)
                })?;
                match IdentityBinder::plan(&binding, existing.as_ref()) {
                    BindingAction::Created => ResourceAction::Create,
                    BindingAction::Unchanged => ResourceAction::Unchanged,
                }
            }
            Err(ProvisionError::PrincipalNotReady { .. }) => {
                properties.push(("principal_id".to_string(), "(known after apply)".to_string()));
                ResourceAction::Create
            }
            Err(other) => return Err(other),
        };
        properties.sort();

        Ok(PlannedStep {
            index,
            key: decl.key().clone(),
            action,
            properties,
        })
    }
}
