//! Step execution
//!
//! `StepRunner` owns the mutable state of one converge run: the
//! declaration to live-identity map, per-step outcomes, the per-declaration
//! locks and the deployment state that is persisted after every step.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::blueprint::DeclarationSet;
use crate::domain::entities::{
    DeploymentState, IdentityBinding, LiveResource, ResourceDeclaration, StateEntry,
};
use crate::domain::ports::{BackendResult, CloudBackend, ProvisionEvent, ProvisionEventSink, StateRepository};
use crate::domain::services::{
    BindingAction, BindingRequest, BuildOrder, IdentityBinder, Planner, PropertyResolver,
    ResourceAction,
};
use crate::domain::value_objects::{ResolvedValue, ResourceKey, ResourceKind, SecretRef};
use crate::error::{Operation, ProvisionError, ProvisionResult};

use super::options::ConvergeOptions;
use super::result::{StepOutcome, StepReport};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backend access with retries and retry events
pub(super) struct BackendCaller<'a, B: CloudBackend> {
    pub backend: &'a B,
    pub options: &'a ConvergeOptions,
    pub events: &'a dyn ProvisionEventSink,
}

impl<B: CloudBackend> BackendCaller<'_, B> {
    /// Call the backend on behalf of step `index`, retrying transient errors.
    ///
    /// `existing` names the live identity reported if the call ends in a
    /// name conflict.
    pub fn call<T>(
        &self,
        index: usize,
        key: &ResourceKey,
        operation: Operation,
        existing: &str,
        call: impl FnMut() -> BackendResult<T>,
    ) -> ProvisionResult<T> {
        self.options
            .retry
            .run(call, |attempt, delay_ms, error| {
                tracing::warn!(
                    key = %key,
                    %operation,
                    attempt,
                    delay_ms,
                    "transient backend error, retrying: {}",
                    error
                );
                if self.events.wants_detailed_events() {
                    self.events.on_event(ProvisionEvent::StepRetrying {
                        index,
                        key: key.to_string(),
                        attempt,
                        delay_ms,
                        reason: error.to_string(),
                    });
                }
            })
            .map_err(|failure| failure.into_error(key, operation, existing))
    }
}

pub(super) struct StepRunner<'a, B: CloudBackend, SR> {
    pub caller: BackendCaller<'a, B>,
    pub state_repo: &'a SR,
    pub set: &'a DeclarationSet,
    pub order: &'a BuildOrder,
    state: Mutex<DeploymentState>,
    live: Mutex<BTreeMap<ResourceKey, LiveResource>>,
    outcomes: Mutex<BTreeMap<ResourceKey, StepOutcome>>,
    locks: BTreeMap<ResourceKey, Mutex<()>>,
}

impl<'a, B, SR> StepRunner<'a, B, SR>
where
    B: CloudBackend,
    SR: StateRepository<State = DeploymentState>,
{
    pub fn new(
        caller: BackendCaller<'a, B>,
        state_repo: &'a SR,
        set: &'a DeclarationSet,
        order: &'a BuildOrder,
        state: DeploymentState,
    ) -> Self {
        let locks = order
            .steps()
            .iter()
            .map(|k| (k.clone(), Mutex::new(())))
            .collect();
        Self {
            caller,
            state_repo,
            set,
            order,
            state: Mutex::new(state),
            live: Mutex::new(BTreeMap::new()),
            outcomes: Mutex::new(BTreeMap::new()),
            locks,
        }
    }

    fn options(&self) -> &ConvergeOptions {
        self.caller.options
    }

    fn emit(&self, event: ProvisionEvent) {
        if self.caller.events.wants_detailed_events() {
            self.caller.events.on_event(event);
        }
    }

    fn is_converged(&self, key: &ResourceKey) -> bool {
        lock(&self.outcomes)
            .get(key)
            .is_some_and(StepOutcome::is_converged)
    }

    /// Resources converged so far in this run
    pub fn snapshot(&self) -> BTreeMap<ResourceKey, LiveResource> {
        lock(&self.live).clone()
    }

    /// Apply `update` to the deployment state and write it out
    pub fn persist(&self, update: impl FnOnce(&mut DeploymentState)) -> ProvisionResult<()> {
        let mut state = lock(&self.state);
        update(&mut state);
        let path = &self.options().state_path;
        self.state_repo
            .save(&state, path)
            .map_err(|e| e.at(path))
    }

    /// Report a step skipped because of cancellation
    pub fn cancelled(&self, index: usize, key: &ResourceKey) -> StepReport {
        lock(&self.outcomes).insert(key.clone(), StepOutcome::Cancelled);
        StepReport {
            index,
            key: key.clone(),
            outcome: StepOutcome::Cancelled,
        }
    }

    /// Run one step.
    ///
    /// Step failures are part of the report. Only a failure to persist state
    /// is returned as an error.
    pub fn run_step(&self, index: usize, key: &ResourceKey) -> ProvisionResult<StepReport> {
        let decl = self
            .set
            .declaration(key)
            .ok_or_else(|| ProvisionError::invalid(key.to_string(), "not declared"))?;

        let waiting_on: Vec<ResourceKey> = self
            .order
            .dependencies_of(key)
            .filter(|edge| !self.is_converged(&edge.to))
            .map(|edge| edge.to.clone())
            .collect();
        if !waiting_on.is_empty() {
            tracing::warn!(key = %key, "blocked by unconverged dependencies");
            self.emit(ProvisionEvent::StepBlocked {
                index,
                key: key.to_string(),
                waiting_on: waiting_on.iter().map(ToString::to_string).collect(),
            });
            return Ok(self.finish(index, key, StepOutcome::Blocked { waiting_on }));
        }

        // at most one in-flight apply per declaration
        let _guard = self.locks.get(key).map(lock);

        self.emit(ProvisionEvent::StepStarted {
            index,
            key: key.to_string(),
        });
        tracing::debug!(step = index, key = %key, "applying");

        let result = match decl.kind() {
            ResourceKind::RoleAssignment => self.apply_binding(index, decl),
            ResourceKind::Storage | ResourceKind::Compute => self.apply_resource(index, decl),
        };

        let outcome = match result {
            Ok((outcome, live)) => {
                let entry = StateEntry::converged(live.id.clone(), decl.fingerprint());
                lock(&self.live).insert(key.clone(), live);
                self.persist(|state| state.record(key, entry))?;
                tracing::info!(step = index, key = %key, action = outcome.as_str(), "converged");
                self.emit(ProvisionEvent::StepConverged {
                    index,
                    key: key.to_string(),
                    action: outcome.as_str(),
                });
                outcome
            }
            Err(err) => {
                let error = err.to_string();
                let scope = &self.options().scope;
                self.persist(|state| {
                    let id = state
                        .get(key)
                        .map(|e| e.resource_id().clone())
                        .unwrap_or_else(|| scope.resource_id(key));
                    state.record(key, StateEntry::failed(id, decl.fingerprint()));
                })?;
                tracing::error!(step = index, key = %key, "step failed: {}", error);
                self.emit(ProvisionEvent::StepFailed {
                    index,
                    key: key.to_string(),
                    error: error.clone(),
                });
                StepOutcome::Failed { error }
            }
        };

        Ok(self.finish(index, key, outcome))
    }

    fn finish(&self, index: usize, key: &ResourceKey, outcome: StepOutcome) -> StepReport {
        lock(&self.outcomes).insert(key.clone(), outcome.clone());
        StepReport {
            index,
            key: key.clone(),
            outcome,
        }
    }

    fn apply_resource(
        &self,
        index: usize,
        decl: &ResourceDeclaration,
    ) -> ProvisionResult<(StepOutcome, LiveResource)> {
        let key = decl.key();
        let scope = &self.options().scope;
        let backend = self.caller.backend;

        let live = self
            .caller
            .call(index, key, Operation::Get, "", || backend.get(scope, key))?;

        let converged = self.snapshot();
        let fetch = |secret: &SecretRef| {
            self.caller.call(index, &secret.target, Operation::ListKeys, "", || {
                backend.list_keys(scope, &secret.target, secret.secret)
            })
        };
        // holds fetched secrets for this call only
        let desired = PropertyResolver::for_apply(scope, self.set.declarations(), &converged, &fetch)
            .resolve(decl)?;

        match Planner::plan_resource(&desired, live.as_ref()) {
            ResourceAction::Conflict { existing, reason } => {
                return Err(ProvisionError::Conflict {
                    key: key.clone(),
                    existing,
                    message: reason,
                });
            }
            ResourceAction::Unchanged => {
                if let Some(live) = live {
                    return Ok((StepOutcome::Unchanged, live));
                }
            }
            ResourceAction::Update { changes } => {
                for change in &changes {
                    tracing::debug!(key = %key, path = %change.path, "drift");
                }
            }
            ResourceAction::Create => {}
        }

        let outcome = if live.is_some() {
            StepOutcome::Updated
        } else {
            StepOutcome::Created
        };
        let applied = self.caller.call(
            index,
            key,
            Operation::CreateOrUpdate,
            desired.id.as_str(),
            || backend.create_or_update(scope, &desired),
        )?;
        Ok((outcome, applied))
    }

    fn apply_binding(
        &self,
        index: usize,
        decl: &ResourceDeclaration,
    ) -> ProvisionResult<(StepOutcome, LiveResource)> {
        let key = decl.key();
        let scope = &self.options().scope;
        let backend = self.caller.backend;

        let request = BindingRequest::from_declaration(decl)?;
        let converged = self.snapshot();
        let scope_id = converged
            .get(&request.target)
            .map(|live| live.id.clone())
            .unwrap_or_else(|| scope.resource_id(&request.target));
        let binding = IdentityBinder::bind(&request, converged.get(&request.principal), scope_id, scope)?;

        let assignment_id = binding.assignment_id();
        let existing = self.caller.call(
            index,
            key,
            Operation::Get,
            assignment_id.as_str(),
            || backend.get_role_assignment(&assignment_id),
        )?;

        let outcome = match IdentityBinder::plan(&binding, existing.as_ref()) {
            BindingAction::Unchanged => StepOutcome::Unchanged,
            BindingAction::Created => {
                self.caller.call(
                    index,
                    key,
                    Operation::AssignRole,
                    assignment_id.as_str(),
                    || backend.create_role_assignment(&binding),
                )?;
                StepOutcome::Created
            }
        };
        Ok((outcome, binding_resource(key, &binding)))
    }
}

/// Live view of a role assignment, so outputs and later steps can
/// reference it like any other resource
fn binding_resource(key: &ResourceKey, binding: &IdentityBinding) -> LiveResource {
    let id = binding.assignment_id();
    LiveResource {
        key: key.clone(),
        location: None,
        sku: None,
        properties: BTreeMap::from([
            ("principal_id".to_string(), ResolvedValue::from(binding.principal_id.as_str())),
            (
                "role_definition_id".to_string(),
                ResolvedValue::from(binding.role_definition_id.as_str()),
            ),
            ("scope".to_string(), ResolvedValue::from(binding.scope.as_str())),
        ]),
        attributes: BTreeMap::from([
            ("id".to_string(), id.to_string()),
            ("name".to_string(), binding.assignment_name()),
        ]),
        id,
    }
}
