//! Scenario: first deployment of the draw backend into an empty scope
//!
//! 1. validate and plan see four declarations to create
//! 2. apply creates them and records outputs
//! 3. a second apply changes nothing
//! 4. outputs prints what apply recorded

use crate::common::*;

#[test]
fn scenario_first_deploy_then_reapply() {
    let env = TestEnv::new();

    let result = env.run(&["validate"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("4 declarations and 4 outputs are valid"));
    assert!(result.stdout.contains("3 waves"));

    let result = env.run(&["plan"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("+ storage/drawstate01 (create)"));
    assert!(result.stdout.contains("(known after apply)"));
    assert!(result.stdout.contains("Plan: 4 to create, 0 to update, 0 unchanged, 0 conflicts"));
    assert!(
        !env.project_path(".drawstack/state.toml").exists(),
        "plan must not write state"
    );

    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("Apply: 4 created, 0 updated, 0 unchanged, 0 failed, 0 blocked"));
    assert!(result.stdout.contains("https://draw-host.azurewebsites.net"));

    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("Apply: 0 created, 0 updated, 4 unchanged"));

    let result = env.run(&["plan"]);
    assert!(result.stdout.contains("Plan: 0 to create, 0 to update, 4 unchanged, 0 conflicts"));

    let result = env.run(&["outputs"]);
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("endpoint"));
    assert!(result.stdout.contains("https://draw-host.azurewebsites.net"));
    assert!(result.stdout.contains("drawfunc"));
}

#[test]
fn scenario_state_file_never_holds_secrets() {
    let env = TestEnv::new();
    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());

    let state = env.read_state();
    assert!(state.contains("storage/drawstate01"));
    assert!(state.contains("compute/draw-host"));
    assert!(!state.contains("AccountKey"), "state leaked a secret:\n{state}");
    assert!(!result.stdout.contains("AccountKey"));
}

#[test]
fn scenario_yaml_parameters_share_one_account() {
    let env = TestEnv::new();
    env.write_project_file("params.yaml", PARAMS_YAML);

    let result = env.run(&["apply", "--params", "params.yaml", "--parallelism", "2"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("Apply: 3 created"));

    let cloud = env.read_cloud();
    let resources = cloud["resources"].as_object().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(cloud["assignments"].as_object().unwrap().len(), 1);
}

#[test]
fn scenario_graph_lists_waves() {
    let env = TestEnv::new();
    let result = env.run(&["graph"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("wave 1:"));
    assert!(result.stdout.contains("wave 3:"));
    assert!(result.stdout.contains("-> compute/draw-host (after create)"));
}

#[test]
fn scenario_outputs_before_apply() {
    let env = TestEnv::new();
    let result = env.run(&["outputs"]);
    assert_eq!(result.exit_code, 0);
    assert!(result.stdout.contains("No outputs recorded"));
}
