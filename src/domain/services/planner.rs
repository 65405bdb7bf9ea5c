//! Convergence planning service
//!
//! Pure domain logic deciding what a single step has to do. It compares a
//! resolved [`DesiredResource`] against what the backend reports and yields
//! create, update, no-op or conflict, without performing any I/O.

use std::collections::BTreeMap;

use crate::domain::entities::{DesiredResource, LiveResource};
use crate::domain::value_objects::ResolvedValue;

/// What applying a declaration needs to do
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceAction {
    /// Resource does not exist yet
    Create,
    /// Resource exists but has drifted
    Update { changes: Vec<PropertyChange> },
    /// Resource already matches the declaration
    Unchanged,
    /// Resource exists in a shape that cannot be converged in place
    Conflict { existing: String, reason: String },
}

impl ResourceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceAction::Create => "create",
            ResourceAction::Update { .. } => "update",
            ResourceAction::Unchanged => "unchanged",
            ResourceAction::Conflict { .. } => "conflict",
        }
    }

    /// Whether applying this action issues a write to the backend
    pub fn is_write(&self) -> bool {
        matches!(self, ResourceAction::Create | ResourceAction::Update { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ResourceAction::Conflict { .. })
    }
}

/// One drifted field; values are rendered with secrets redacted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    /// Dotted path (`sku`, `app_settings.DRAWING_CONTAINER_NAME`, ...)
    pub path: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl PropertyChange {
    fn new(path: impl Into<String>, before: Option<String>, after: Option<String>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }
}

/// Pure planning service
pub struct Planner;

impl Planner {
    /// Plan one step.
    ///
    /// Only what the declaration states is compared: properties the backend
    /// adds on its own are ignored. Values not known yet (plan mode) never
    /// count as drift. Location is immutable, so a moved resource is a
    /// conflict rather than an update.
    pub fn plan_resource(desired: &DesiredResource, live: Option<&LiveResource>) -> ResourceAction {
        let Some(live) = live else {
            return ResourceAction::Create;
        };

        if let (Some(declared), Some(actual)) = (&desired.location, &live.location) {
            if !declared.eq_ignore_ascii_case(actual) {
                return ResourceAction::Conflict {
                    existing: live.id.to_string(),
                    reason: format!(
                        "location is immutable (live: {}, declared: {})",
                        actual, declared
                    ),
                };
            }
        }

        let mut changes = Vec::new();
        if desired.sku.is_some() && desired.sku != live.sku {
            changes.push(PropertyChange::new(
                "sku",
                live.sku.as_ref().map(ToString::to_string),
                desired.sku.as_ref().map(ToString::to_string),
            ));
        }
        for (name, value) in &desired.properties {
            diff_value(name, value, live.properties.get(name), &mut changes);
        }

        if changes.is_empty() {
            ResourceAction::Unchanged
        } else {
            ResourceAction::Update { changes }
        }
    }
}

fn diff_value(
    path: &str,
    desired: &ResolvedValue,
    live: Option<&ResolvedValue>,
    changes: &mut Vec<PropertyChange>,
) {
    match (desired, live) {
        (ResolvedValue::Map(want), Some(ResolvedValue::Map(have))) => diff_map(path, want, have, changes),
        (value, _) if !value.is_known() => {}
        (value, Some(current)) if value == current => {}
        (value, current) => changes.push(PropertyChange::new(
            path,
            current.map(ResolvedValue::render),
            Some(value.render()),
        )),
    }
}

fn diff_map(
    path: &str,
    want: &BTreeMap<String, ResolvedValue>,
    have: &BTreeMap<String, ResolvedValue>,
    changes: &mut Vec<PropertyChange>,
) {
    for (key, value) in want {
        diff_value(&format!("{}.{}", path, key), value, have.get(key), changes);
    }
    // a declared map is owned as a whole: entries dropped from it are drift
    for (key, value) in have {
        if !want.contains_key(key) {
            changes.push(PropertyChange::new(
                format!("{}.{}", path, key),
                Some(value.render()),
                None,
            ));
        }
    }
}
