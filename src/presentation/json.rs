//! JSON rendering for `--json` mode
//!
//! Command results are emitted as single NDJSON lines alongside the event
//! stream, each carrying an `event` and `command` field.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::{json, Value};

use crate::application::{ConvergePlan, ConvergeReport, DeclarationSet, StepOutcome};
use crate::config::ConfigWarning;
use crate::domain::services::BuildOrder;
use crate::error::ProvisionError;

/// Write one NDJSON line to stdout
pub fn emit(value: Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", value)?;
    stdout.flush()
}

pub fn validation(command: &str, set: &DeclarationSet, order: &BuildOrder) -> Value {
    json!({
        "event": "valid",
        "command": command,
        "declarations": set.len(),
        "outputs": set.outputs().len(),
        "waves": order.waves().len(),
    })
}

pub fn graph(command: &str, order: &BuildOrder) -> Value {
    let edges: Vec<Value> = order
        .edges()
        .iter()
        .map(|e| {
            json!({
                "from": e.from.to_string(),
                "to": e.to.to_string(),
                "timing": format!("{:?}", e.timing),
            })
        })
        .collect();
    let waves: Vec<Vec<String>> = order
        .waves()
        .iter()
        .map(|wave| wave.iter().map(ToString::to_string).collect())
        .collect();
    json!({
        "event": "graph",
        "command": command,
        "order": order.steps().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "waves": waves,
        "edges": edges,
    })
}

pub fn plan(command: &str, plan: &ConvergePlan) -> Value {
    let steps: Vec<Value> = plan
        .steps
        .iter()
        .map(|step| {
            let changes: Vec<Value> = step
                .changes()
                .iter()
                .map(|c| json!({ "path": c.path, "before": c.before, "after": c.after }))
                .collect();
            let properties: BTreeMap<&str, &str> = step
                .properties
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            json!({
                "index": step.index,
                "key": step.key.to_string(),
                "action": step.action.as_str(),
                "changes": changes,
                "properties": properties,
            })
        })
        .collect();
    json!({
        "event": "plan",
        "command": command,
        "steps": steps,
        "unmanaged": plan.unmanaged.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

pub fn report(command: &str, report: &ConvergeReport) -> Value {
    let steps: Vec<Value> = report
        .steps
        .iter()
        .map(|step| {
            let mut value = json!({
                "index": step.index,
                "key": step.key.to_string(),
                "outcome": step.outcome.as_str(),
            });
            match &step.outcome {
                StepOutcome::Failed { error } => value["error"] = json!(error),
                StepOutcome::Blocked { waiting_on } => {
                    value["waiting_on"] =
                        json!(waiting_on.iter().map(ToString::to_string).collect::<Vec<_>>())
                }
                _ => {}
            }
            value
        })
        .collect();
    let outputs: BTreeMap<&str, &str> = report
        .outputs
        .iter()
        .map(|o| (o.name.as_str(), o.value.as_str()))
        .collect();
    json!({
        "event": "report",
        "command": command,
        "success": report.is_success(),
        "cancelled": report.cancelled,
        "steps": steps,
        "outputs": outputs,
    })
}

pub fn outputs(command: &str, outputs: &BTreeMap<String, String>) -> Value {
    json!({
        "event": "outputs",
        "command": command,
        "outputs": outputs,
    })
}

pub fn warning(command: &str, warning: &ConfigWarning) -> Value {
    json!({
        "event": "warning",
        "command": command,
        "key": warning.key,
        "file": warning.file.display().to_string(),
        "line": warning.line,
        "suggestion": warning.suggestion,
    })
}

pub fn error(command: &str, err: &ProvisionError) -> Value {
    let mut value = json!({
        "event": "error",
        "command": command,
        "message": err.to_string(),
        "exit_code": err.exit_code(),
    });
    if let ProvisionError::Validation { issues } = err {
        value["issues"] = json!(issues
            .iter()
            .map(|i| json!({ "subject": i.subject, "message": i.message }))
            .collect::<Vec<_>>());
    }
    value
}
