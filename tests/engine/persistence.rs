//! Deployment state on disk

use std::sync::Arc;

use drawstack::application::{ConvergeOptions, RetryPolicy};
use drawstack::domain::ports::{BackendError, StateRepository};
use drawstack::error::{exit_code, Operation};
use drawstack::infrastructure::repositories::parse_state;
use drawstack::{
    Blueprint, ConvergeUseCase, DeploymentScope, InMemoryBackend, Parameters, ProvisionError,
    ResourceKey, TomlStateRepository,
};
use tempfile::TempDir;

fn options(dir: &TempDir) -> ConvergeOptions {
    ConvergeOptions::new(
        DeploymentScope::new("sub-1", "rg-draw"),
        dir.path().join("deploy").join("state.toml"),
    )
    .with_retry(RetryPolicy::immediate(2))
}

fn blueprint() -> drawstack::DeclarationSet {
    Blueprint::draw_backend(&Parameters::new("westeurope", "drawstate01", "draw-host")).unwrap()
}

#[test]
fn every_step_is_persisted_as_it_converges() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(InMemoryBackend::new());
    backend.fail_always(
        Operation::AssignRole,
        None,
        BackendError::fatal("authorization failed"),
    );

    let use_case = ConvergeUseCase::new(Arc::clone(&backend), TomlStateRepository::new());
    let report = use_case.execute(&blueprint(), &options(&dir)).unwrap();
    assert_eq!(report.exit_code(), exit_code::PARTIAL_APPLY);
    assert!(report.outputs.is_empty());

    let content = std::fs::read_to_string(&options(&dir).state_path).unwrap();
    let state = parse_state(&content).unwrap();
    assert!(state.get(&ResourceKey::storage("drawstate01")).unwrap().is_converged());
    assert!(state.get(&ResourceKey::compute("draw-host")).unwrap().is_converged());
    let binding = state
        .get(&ResourceKey::role_assignment("draw-host-blob-contributor"))
        .unwrap();
    assert!(!binding.is_converged());
    assert!(state.outputs().is_empty());

    backend.clear_faults();
    backend.clear_calls();
    let report = use_case.execute(&blueprint(), &options(&dir)).unwrap();
    assert!(report.is_success());
    assert_eq!(report.count("unchanged"), 2);
    assert_eq!(report.count("created"), 1);
    assert_eq!(backend.count(Operation::CreateOrUpdate), 0);
}

#[test]
fn a_held_lock_stops_a_second_deployment() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(InMemoryBackend::new());
    let repo = TomlStateRepository::new();
    let path = options(&dir).state_path;

    let _held = repo.lock(&path).unwrap();
    let err = ConvergeUseCase::new(Arc::clone(&backend), TomlStateRepository::new())
        .execute(&blueprint(), &options(&dir))
        .unwrap_err();

    assert!(matches!(err, ProvisionError::State { .. }));
    assert!(err.to_string().contains("locked"));
    assert!(backend.calls().is_empty());
}

#[test]
fn corrupted_state_is_reported_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = options(&dir).state_path;
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "version = \"nope\"").unwrap();

    let backend = Arc::new(InMemoryBackend::new());
    let err = ConvergeUseCase::new(Arc::clone(&backend), TomlStateRepository::new())
        .execute(&blueprint(), &options(&dir))
        .unwrap_err();

    assert_eq!(err.exit_code(), exit_code::FAILURE);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "version = \"nope\"");
    assert!(backend.calls().is_empty());
}
