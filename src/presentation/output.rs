//! Output Rendering
//!
//! Human-readable rendering of validation results, build orders, plans,
//! apply reports and outputs. Every renderer returns a `String` so the
//! command handlers decide where it goes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use similar::{ChangeTag, TextDiff};

use crate::application::{ConvergePlan, ConvergeReport, DeclarationSet, PlannedStep, StepOutcome};
use crate::config::ConfigWarning;
use crate::domain::services::{BuildOrder, PropertyChange, ResourceAction};
use crate::domain::value_objects::AttributeTiming;

/// Icons for output rendering
struct Icons {
    check: &'static str,
    cross: &'static str,
    create: &'static str,
    update: &'static str,
    skip: &'static str,
    blocked: &'static str,
}

impl Icons {
    fn unicode() -> Self {
        Self {
            check: "✓",
            cross: "✗",
            create: "+",
            update: "~",
            skip: "○",
            blocked: "⊘",
        }
    }

    fn ascii() -> Self {
        Self {
            check: "[OK]",
            cross: "[FAIL]",
            create: "+",
            update: "~",
            skip: "[ ]",
            blocked: "[BLOCKED]",
        }
    }
}

/// Text renderer for command results
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    /// Whether to use unicode icons
    pub unicode: bool,
    /// Verbosity level
    pub verbose: u8,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            unicode: true,
            verbose: 0,
        }
    }
}

impl TextRenderer {
    pub fn ascii() -> Self {
        Self {
            unicode: false,
            verbose: 0,
        }
    }

    fn icons(&self) -> Icons {
        if self.unicode {
            Icons::unicode()
        } else {
            Icons::ascii()
        }
    }

    pub fn validation(&self, set: &DeclarationSet, order: &BuildOrder) -> String {
        format!(
            "{} {} declarations and {} outputs are valid ({} steps in {} waves)\n",
            self.icons().check,
            set.len(),
            set.outputs().len(),
            order.len(),
            order.waves().len()
        )
    }

    pub fn graph(&self, order: &BuildOrder) -> String {
        let mut out = String::new();
        for (wave_index, wave) in order.waves().iter().enumerate() {
            let _ = writeln!(out, "wave {}:", wave_index + 1);
            for key in wave {
                let position = order.position(key).map(|p| p + 1).unwrap_or_default();
                let _ = writeln!(out, "  {:>2}. {}", position, key);
                for edge in order.dependencies_of(key) {
                    let timing = match edge.timing {
                        AttributeTiming::InputTime => "input",
                        AttributeTiming::CreationTime => "after create",
                    };
                    let _ = writeln!(out, "        -> {} ({})", edge.to, timing);
                }
            }
        }
        out
    }

    pub fn plan(&self, plan: &ConvergePlan) -> String {
        let icons = self.icons();
        let mut out = String::new();

        for step in &plan.steps {
            let (icon, label) = match &step.action {
                ResourceAction::Create => (icons.create, "create"),
                ResourceAction::Update { .. } => (icons.update, "update"),
                ResourceAction::Unchanged => (icons.skip, "unchanged"),
                ResourceAction::Conflict { .. } => (icons.cross, "conflict"),
            };
            let _ = writeln!(out, "{} {} ({})", icon, step.key, label);
            match &step.action {
                ResourceAction::Create => push_properties(&mut out, step),
                ResourceAction::Update { changes } => out.push_str(&render_changes(changes)),
                ResourceAction::Conflict { existing, reason } => {
                    let _ = writeln!(out, "    {}: {}", existing, reason);
                }
                ResourceAction::Unchanged => {
                    if self.verbose > 0 {
                        push_properties(&mut out, step);
                    }
                }
            }
        }

        for id in &plan.unmanaged {
            let _ = writeln!(out, "? {} (unmanaged)", id);
        }

        let _ = writeln!(
            out,
            "\nPlan: {} to create, {} to update, {} unchanged, {} conflicts",
            plan.count("create"),
            plan.count("update"),
            plan.count("unchanged"),
            plan.count("conflict"),
        );
        out
    }

    pub fn report(&self, report: &ConvergeReport) -> String {
        let icons = self.icons();
        let mut out = String::new();

        for step in &report.steps {
            match &step.outcome {
                StepOutcome::Created | StepOutcome::Updated => {
                    let _ = writeln!(out, "{} {} {}", icons.check, step.key, step.outcome.as_str());
                }
                StepOutcome::Unchanged => {
                    let _ = writeln!(out, "{} {} unchanged", icons.skip, step.key);
                }
                StepOutcome::Failed { error } => {
                    let _ = writeln!(out, "{} {} failed: {}", icons.cross, step.key, error);
                }
                StepOutcome::Blocked { waiting_on } => {
                    let waiting: Vec<String> = waiting_on.iter().map(ToString::to_string).collect();
                    let _ = writeln!(
                        out,
                        "{} {} blocked by {}",
                        icons.blocked,
                        step.key,
                        waiting.join(", ")
                    );
                }
                StepOutcome::Cancelled => {
                    let _ = writeln!(out, "{} {} cancelled", icons.skip, step.key);
                }
            }
        }

        for id in &report.unmanaged {
            let _ = writeln!(out, "? {} (unmanaged)", id);
        }

        let _ = writeln!(
            out,
            "\nApply: {} created, {} updated, {} unchanged, {} failed, {} blocked",
            report.count("created"),
            report.count("updated"),
            report.count("unchanged"),
            report.count("failed"),
            report.count("blocked"),
        );

        if report.cancelled {
            out.push_str("Deployment cancelled; re-run apply to resume.\n");
        } else if !report.is_success() {
            out.push_str("Deployment incomplete; re-run apply to resume from the first unconverged step.\n");
        }

        if !report.outputs.is_empty() {
            out.push_str("\nOutputs:\n");
            let outputs: BTreeMap<&str, &str> = report
                .outputs
                .iter()
                .map(|o| (o.name.as_str(), o.value.as_str()))
                .collect();
            out.push_str(&render_output_lines(&outputs));
        }
        out
    }

    pub fn outputs(&self, outputs: &BTreeMap<String, String>) -> String {
        if outputs.is_empty() {
            return "No outputs recorded; run apply first.\n".to_string();
        }
        let outputs: BTreeMap<&str, &str> = outputs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        render_output_lines(&outputs)
    }
}

fn push_properties(out: &mut String, step: &PlannedStep) {
    for (name, value) in &step.properties {
        let _ = writeln!(out, "    {} = {}", name, value);
    }
}

fn render_output_lines(outputs: &BTreeMap<&str, &str>) -> String {
    let width = outputs.keys().map(|k| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in outputs {
        let _ = writeln!(out, "  {:<width$} = {}", name, value, width = width);
    }
    out
}

/// Drifted fields as a line diff between live and declared values
pub fn render_changes(changes: &[PropertyChange]) -> String {
    let render = |value: &Option<String>| value.clone().unwrap_or_else(|| "(unset)".to_string());
    let before: String = changes
        .iter()
        .map(|c| format!("{} = {}\n", c.path, render(&c.before)))
        .collect();
    let after: String = changes
        .iter()
        .map(|c| format!("{} = {}\n", c.path, render(&c.after)))
        .collect();

    let mut out = String::new();
    for change in TextDiff::from_lines(&before, &after).iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        let _ = writeln!(out, "    {} {}", sign, change.value().trim_end_matches('\n'));
    }
    out
}

/// Unknown-key warnings, one block per key
pub fn render_config_warnings(warnings: &[ConfigWarning]) -> String {
    let mut out = String::new();
    for w in warnings {
        match w.line {
            Some(line) => {
                let _ = writeln!(out, "⚠ Unknown key '{}' in {}:{}", w.key, w.file.display(), line);
            }
            None => {
                let _ = writeln!(out, "⚠ Unknown key '{}' in {}", w.key, w.file.display());
            }
        }
        if let Some(suggestion) = &w.suggestion {
            let _ = writeln!(out, "   Did you mean '{}'?", suggestion);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{ResourceId, ResourceKey};
    use std::path::PathBuf;

    #[test]
    fn changes_render_as_line_diff() {
        let changes = vec![PropertyChange {
            path: "runtime".to_string(),
            before: Some("\"node\"".to_string()),
            after: Some("\"python\"".to_string()),
        }];
        let rendered = render_changes(&changes);
        assert!(rendered.contains("- runtime = \"node\""));
        assert!(rendered.contains("+ runtime = \"python\""));
    }

    #[test]
    fn added_setting_renders_unset_before() {
        let changes = vec![PropertyChange {
            path: "app_settings.PLAN_ID".to_string(),
            before: None,
            after: Some("\"plan\"".to_string()),
        }];
        let rendered = render_changes(&changes);
        assert!(rendered.contains("- app_settings.PLAN_ID = (unset)"));
    }

    #[test]
    fn report_lists_failures_and_blocks() {
        let report = ConvergeReport {
            steps: vec![
                crate::application::StepReport {
                    index: 0,
                    key: ResourceKey::storage("drawstate01"),
                    outcome: StepOutcome::Failed {
                        error: "boom".to_string(),
                    },
                },
                crate::application::StepReport {
                    index: 1,
                    key: ResourceKey::compute("draw-host"),
                    outcome: StepOutcome::Blocked {
                        waiting_on: vec![ResourceKey::storage("drawstate01")],
                    },
                },
            ],
            unmanaged: vec![ResourceId::new("/subscriptions/s/resourceGroups/g/providers/x/y/stray")],
            ..ConvergeReport::default()
        };
        let text = TextRenderer::ascii().report(&report);
        assert!(text.contains("[FAIL] storage/drawstate01 failed: boom"));
        assert!(text.contains("[BLOCKED] compute/draw-host blocked by storage/drawstate01"));
        assert!(text.contains("stray (unmanaged)"));
        assert!(text.contains("re-run apply"));
    }

    #[test]
    fn empty_outputs_hint_at_apply() {
        let text = TextRenderer::default().outputs(&BTreeMap::new());
        assert!(text.contains("run apply"));
    }

    #[test]
    fn outputs_are_aligned() {
        let outputs = BTreeMap::from([
            ("endpoint".to_string(), "https://x".to_string()),
            ("principal_id".to_string(), "p".to_string()),
        ]);
        let text = TextRenderer::default().outputs(&outputs);
        assert!(text.contains("  endpoint     = https://x"));
        assert!(text.contains("  principal_id = p"));
    }

    #[test]
    fn warnings_carry_line_and_suggestion() {
        let warnings = vec![ConfigWarning {
            key: "sku".to_string(),
            file: PathBuf::from("params.toml"),
            line: Some(4),
            suggestion: Some("storage_sku".to_string()),
        }];
        let text = render_config_warnings(&warnings);
        assert!(text.contains("Unknown key 'sku' in params.toml:4"));
        assert!(text.contains("Did you mean 'storage_sku'?"));
    }
}
