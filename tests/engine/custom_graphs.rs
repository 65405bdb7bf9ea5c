//! Hand-written declaration sets exercising graph edge cases

use std::sync::Arc;

use drawstack::application::{ConvergeOptions, ConvergeUseCase, DeclarationSet, RetryPolicy, StepOutcome};
use drawstack::domain::ports::BackendError;
use drawstack::domain::value_objects::Sku;
use drawstack::error::{exit_code, Operation};
use drawstack::{
    DeploymentScope, InMemoryBackend, OutputDeclaration, PropertyValue, ProvisionError,
    ResourceDeclaration, ResourceKey, TomlStateRepository,
};
use tempfile::TempDir;

fn scope() -> DeploymentScope {
    DeploymentScope::new("sub-1", "rg-engine")
}

fn host(name: &str) -> ResourceDeclaration {
    ResourceDeclaration::compute(name)
        .with_location("westeurope")
        .with_sku(Sku::plan("Y1"))
        .with_property("runtime", "python")
}

fn account(name: &str) -> ResourceDeclaration {
    ResourceDeclaration::storage(name)
        .with_location("westeurope")
        .with_sku(Sku::storage("Standard_LRS"))
}

fn run(
    set: &DeclarationSet,
    backend: &Arc<InMemoryBackend>,
    dir: &TempDir,
    parallelism: usize,
) -> Result<drawstack::ConvergeReport, ProvisionError> {
    let options = ConvergeOptions::new(scope(), dir.path().join("state.toml"))
        .with_retry(RetryPolicy::immediate(3))
        .with_parallelism(parallelism);
    ConvergeUseCase::new(Arc::clone(backend), TomlStateRepository::new()).execute(set, &options)
}

#[test]
fn reference_cycle_never_reaches_the_backend() {
    let set = DeclarationSet::new()
        .with_declaration(host("alpha").with_property(
            "peer",
            PropertyValue::reference(ResourceKey::compute("beta"), "default_hostname"),
        ))
        .with_declaration(host("beta").with_property(
            "peer",
            PropertyValue::reference(ResourceKey::compute("alpha"), "default_hostname"),
        ));
    let backend = Arc::new(InMemoryBackend::new());
    let dir = TempDir::new().unwrap();

    let err = run(&set, &backend, &dir, 1).unwrap_err();

    match &err {
        ProvisionError::CyclicDependency { cycle } => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&ResourceKey::compute("alpha")));
            assert!(cycle.contains(&ResourceKey::compute("beta")));
        }
        other => panic!("expected a cycle, got {other}"),
    }
    assert_eq!(err.exit_code(), exit_code::CYCLE);
    assert!(backend.calls().is_empty());
    assert!(!dir.path().join("state.toml").exists());
}

#[test]
fn undeclared_reference_is_a_validation_error() {
    let set = DeclarationSet::new().with_declaration(host("alpha").with_property(
        "storage",
        PropertyValue::reference(ResourceKey::storage("missing"), "blob_endpoint"),
    ));
    let backend = Arc::new(InMemoryBackend::new());
    let dir = TempDir::new().unwrap();

    let err = run(&set, &backend, &dir, 1).unwrap_err();
    assert_eq!(err.exit_code(), exit_code::VALIDATION);
    assert!(err.to_string().contains("storage/missing"));
    assert!(backend.calls().is_empty());
}

#[test]
fn explicit_dependency_orders_unrelated_resources() {
    let set = DeclarationSet::new()
        .with_declaration(account("aaaa").depends_on(ResourceKey::storage("zzzz")))
        .with_declaration(account("zzzz"));
    let backend = Arc::new(InMemoryBackend::new());
    let dir = TempDir::new().unwrap();

    let report = run(&set, &backend, &dir, 1).unwrap();
    let order: Vec<String> = report.steps.iter().map(|s| s.key.to_string()).collect();
    assert_eq!(order, ["storage/zzzz", "storage/aaaa"]);
}

#[test]
fn independent_branch_survives_a_failure() {
    let set = DeclarationSet::new()
        .with_declaration(account("broken"))
        .with_declaration(host("needs-broken").with_property(
            "storage",
            PropertyValue::reference(ResourceKey::storage("broken"), "blob_endpoint"),
        ))
        .with_declaration(account("healthy"));
    let backend = Arc::new(InMemoryBackend::new());
    backend.fail_always(
        Operation::CreateOrUpdate,
        Some(ResourceKey::storage("broken")),
        BackendError::fatal("quota exceeded"),
    );
    let dir = TempDir::new().unwrap();

    let report = run(&set, &backend, &dir, 2).unwrap();

    let outcome = |name: &str| {
        report
            .steps
            .iter()
            .find(|s| s.key.name == name)
            .map(|s| s.outcome.clone())
            .unwrap()
    };
    assert!(matches!(outcome("broken"), StepOutcome::Failed { error } if error.contains("quota exceeded")));
    assert!(matches!(outcome("needs-broken"), StepOutcome::Blocked { .. }));
    assert_eq!(outcome("healthy"), StepOutcome::Created);
    assert_eq!(report.exit_code(), exit_code::PARTIAL_APPLY);
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let set = || {
        DeclarationSet::new()
            .with_declaration(account("one"))
            .with_declaration(account("two"))
            .with_declaration(account("three"))
            .with_declaration(host("web").with_property(
                "storage",
                PropertyValue::reference(ResourceKey::storage("two"), "blob_endpoint"),
            ))
            .with_output(OutputDeclaration::new(
                "web",
                PropertyValue::reference(ResourceKey::compute("web"), "default_hostname"),
            ))
    };

    let sequential_backend = Arc::new(InMemoryBackend::new());
    let sequential_dir = TempDir::new().unwrap();
    let sequential = run(&set(), &sequential_backend, &sequential_dir, 1).unwrap();

    let parallel_backend = Arc::new(InMemoryBackend::new());
    let parallel_dir = TempDir::new().unwrap();
    let parallel = run(&set(), &parallel_backend, &parallel_dir, 4).unwrap();

    assert_eq!(sequential.steps, parallel.steps);
    assert_eq!(sequential.outputs, parallel.outputs);
    assert_eq!(sequential_backend.model(), parallel_backend.model());
    assert_eq!(parallel.output("web"), Some("web.azurewebsites.net"));
}

#[test]
fn two_accounts_host_and_binding_converge_in_order() {
    let storage_a = ResourceKey::storage("storageA");
    let storage_b = ResourceKey::storage("storageB");
    let host_key = ResourceKey::compute("host");
    let set = DeclarationSet::new()
        .with_declaration(
            ResourceDeclaration::role_assignment("binding")
                .with_property("principal", PropertyValue::reference(host_key.clone(), "principal_id"))
                .with_property("role", "blob-contributor")
                .with_property("scope", PropertyValue::reference(storage_b.clone(), "id")),
        )
        .with_declaration(
            host("host")
                .with_property("a", PropertyValue::reference(storage_a.clone(), "blob_endpoint"))
                .with_property("b", PropertyValue::reference(storage_b.clone(), "blob_endpoint")),
        )
        .with_declaration(account("storageB").with_containers(["drawfunc"]))
        .with_declaration(account("storageA"))
        .with_output(OutputDeclaration::new(
            "endpoint",
            PropertyValue::Concat(vec![
                PropertyValue::string("https://"),
                PropertyValue::reference(host_key, "default_hostname"),
            ]),
        ));
    let backend = Arc::new(InMemoryBackend::new());
    let dir = TempDir::new().unwrap();

    let report = run(&set, &backend, &dir, 1).unwrap();

    let order: Vec<&str> = report.steps.iter().map(|s| s.key.name.as_str()).collect();
    assert_eq!(order, ["storageA", "storageB", "host", "binding"]);
    assert!(report.is_success());
    assert_eq!(report.output("endpoint"), Some("https://host.azurewebsites.net"));

    let assignment = backend.model().assignments.into_values().next().unwrap();
    assert!(assignment.scope.ends_with("/storageAccounts/storageB"));
}
