//! Scenario: bad input stops before the backend is touched

use crate::common::*;

#[test]
fn scenario_invalid_parameters_exit_2_without_side_effects() {
    let env = TestEnv::new();
    env.write_project_file(
        PARAMS_FILE,
        "location = \"westeurope\"\nstate_storage_name = \"x\"\ncompute_name = \"-host\"\nplan_sku = \"Z9\"\n",
    );

    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 2, "{}", result.combined_output());
    assert!(result.stderr.contains("validation failed"));
    assert!(result.stderr.contains("parameters.state_storage_name"));
    assert!(result.stderr.contains("parameters.compute_name"));
    assert!(result.stderr.contains("parameters.plan_sku"));
    assert!(!env.project_path(".drawstack/cloud.json").exists());
    assert!(!env.project_path(".drawstack/state.toml").exists());
}

#[test]
fn scenario_missing_scope_is_a_validation_error() {
    let env = TestEnv::empty();
    env.write_project_file(PARAMS_FILE, PARAMS_TOML);

    let result = env.run(&["plan"]);
    assert_eq!(result.exit_code, 2, "{}", result.combined_output());
    assert!(result.stderr.contains("scope.subscription_id"));
    assert!(result.stderr.contains("scope.resource_group"));
}

#[test]
fn scenario_scope_from_environment() {
    let env = TestEnv::empty();
    env.write_project_file(PARAMS_FILE, PARAMS_TOML);

    let result = env.run_with_env(
        &["apply"],
        &[
            ("DRAWSTACK_SUBSCRIPTION_ID", "sub-env"),
            ("DRAWSTACK_RESOURCE_GROUP", "rg-env"),
        ],
    );
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(env.read_state().contains("rg-env"));
}

#[test]
fn scenario_unknown_config_key_warns() {
    let env = TestEnv::new();
    env.write_project_file(
        "drawstack.toml",
        &format!("{}\n[engine]\nparalelism = 2\n", CONFIG_TOML),
    );

    let result = env.run(&["validate"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stderr.contains("Unknown key 'paralelism'"));
    assert!(result.stderr.contains("Did you mean 'parallelism'?"));
}

#[test]
fn scenario_missing_params_file_fails() {
    let env = TestEnv::new();
    let result = env.run(&["validate", "--params", "nope.toml"]);
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("nope.toml"));
}
