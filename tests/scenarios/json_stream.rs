//! Scenario: CI drives drawstack with --json and reads NDJSON

use crate::common::*;

#[test]
fn scenario_apply_json_emits_event_stream() {
    let env = TestEnv::new();
    let result = env.run(&["apply", "--json"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());

    let events = result.events();
    assert_eq!(events[0]["event"], "start");
    assert_eq!(events[0]["command"], "apply");
    assert_eq!(events[0]["declaration_count"], 4);

    let converged = events
        .iter()
        .filter(|e| e["event"] == "step_converged")
        .count();
    assert_eq!(converged, 4);

    let report = result.event("report").expect("report event");
    assert_eq!(report["success"], true);
    assert_eq!(
        report["outputs"]["endpoint"],
        "https://draw-host.azurewebsites.net"
    );
    assert!(!result.stdout.contains("AccountKey"));
}

#[test]
fn scenario_plan_json_has_one_step_per_declaration() {
    let env = TestEnv::new();
    let result = env.run(&["plan", "--json"]);
    assert_eq!(result.exit_code, 0, "{}", result.combined_output());

    let plan = result.event("plan").expect("plan event");
    let steps = plan["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 4);
    assert!(steps.iter().all(|s| s["action"] == "create"));
    assert_eq!(steps[0]["key"], "storage/drawartifacts");
}

#[test]
fn scenario_validation_error_json() {
    let env = TestEnv::new();
    env.write_project_file(
        PARAMS_FILE,
        "location = \"\"\nstate_storage_name = \"Draw_State\"\ncompute_name = \"draw-host\"\n",
    );

    let result = env.run(&["validate", "--json"]);
    assert_eq!(result.exit_code, 2, "{}", result.combined_output());
    let error = result.event("error").expect("error event");
    let subjects: Vec<&str> = error["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["subject"].as_str())
        .collect();
    assert!(subjects.contains(&"parameters.location"));
    assert!(subjects.contains(&"parameters.state_storage_name"));
}
