//! Scenario: a deployment fails halfway and is resumed
//!
//! The state account name is taken by someone else, so the account and
//! everything depending on it does not converge. Once the name is released,
//! re-running apply with identical input finishes the job.

use serde_json::Value;

use crate::common::*;

fn write_cloud(env: &TestEnv, cloud: &Value) {
    env.write_project_file(".drawstack/cloud.json", &cloud.to_string());
}

#[test]
fn scenario_partial_apply_then_resume() {
    let env = TestEnv::new();
    write_cloud(&env, &serde_json::json!({ "foreign_names": ["storage/drawstate01"] }));

    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 4, "{}", result.combined_output());
    assert!(result.stdout.contains("storage/drawstate01 failed"));
    assert!(result.stdout.contains("compute/draw-host blocked by storage/drawstate01"));
    assert!(result.stdout.contains("re-run apply"));
    assert!(!result.stdout.contains("Outputs:"));

    let mut cloud = env.read_cloud();
    cloud["foreign_names"] = serde_json::json!([]);
    write_cloud(&env, &cloud);

    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("Apply: 3 created, 0 updated, 1 unchanged"));
    assert!(result.stdout.contains("Outputs:"));
}

#[test]
fn scenario_plan_reports_conflict() {
    let env = TestEnv::new();
    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());

    let mut cloud = env.read_cloud();
    let resources = cloud["resources"].as_object_mut().unwrap();
    for resource in resources.values_mut() {
        if resource["key"]["name"] == "drawstate01" {
            resource["location"] = Value::from("northeurope");
        }
    }
    write_cloud(&env, &cloud);

    let result = env.run(&["plan"]);
    assert_eq!(result.exit_code, 4, "{}", result.combined_output());
    assert!(result.stdout.contains("location is immutable"));
}

#[test]
fn scenario_other_scope_is_rejected() {
    let env = TestEnv::new();
    assert_eq!(env.run(&["apply"]).exit_code, 0);

    let result = env.run_with_env(&["apply"], &[("DRAWSTACK_RESOURCE_GROUP", "rg-other")]);
    assert_eq!(result.exit_code, 2, "{}", result.combined_output());
    assert!(result.stderr.contains("belongs to"));
}

#[test]
fn scenario_dropping_artifact_storage_forgets_it() {
    let env = TestEnv::new();
    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(env.read_state().contains("storage/drawartifacts"));

    env.write_project_file(
        PARAMS_FILE,
        "location = \"westeurope\"\nstate_storage_name = \"drawstate01\"\ncompute_name = \"draw-host\"\n",
    );
    let result = env.run(&["apply"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());
    assert!(result.stdout.contains("drawartifacts (unmanaged)"));
    assert!(!env.read_state().contains("drawartifacts"));
}
