//! Resource declaration entity
//!
//! An immutable description of one cloud object: kind, name, location, SKU and
//! typed properties. Declarations are built with consuming `with_*` methods and
//! never change once handed to the engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::value_objects::{
    AttributeTiming, Fingerprint, PropertyValue, RefSite, ResourceKey, ResourceKind,
    RoleDefinition, Sku,
};
use crate::error::ValidationIssue;

/// A reference from one declaration to another, as found by the graph builder
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeclaredDependency {
    pub target: ResourceKey,
    pub timing: AttributeTiming,
    /// Property path the reference sits in (`app_settings`, `depends_on`, ...)
    pub via: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDeclaration {
    key: ResourceKey,
    location: Option<String>,
    sku: Option<Sku>,
    properties: BTreeMap<String, PropertyValue>,
    depends_on: BTreeSet<ResourceKey>,
}

/// Canonical form hashed into a fingerprint
#[derive(Serialize)]
struct Canonical<'a> {
    key: &'a ResourceKey,
    location: &'a Option<String>,
    sku: &'a Option<Sku>,
    properties: &'a BTreeMap<String, PropertyValue>,
    depends_on: &'a BTreeSet<ResourceKey>,
}

impl ResourceDeclaration {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            key: ResourceKey::new(kind, name),
            location: None,
            sku: None,
            properties: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn storage(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Storage, name)
    }

    pub fn compute(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Compute, name)
    }

    pub fn role_assignment(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::RoleAssignment, name)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Blob containers realized as part of a storage account
    pub fn with_containers<I, S>(self, containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = containers
            .into_iter()
            .map(|c| PropertyValue::String(c.into()))
            .collect();
        self.with_property("containers", PropertyValue::List(list))
    }

    /// Explicit ordering dependency with no property reference
    pub fn depends_on(mut self, key: ResourceKey) -> Self {
        self.depends_on.insert(key);
        self
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn kind(&self) -> ResourceKind {
        self.key.kind
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn sku(&self) -> Option<&Sku> {
        self.sku.as_ref()
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Every dependency this declaration has, with its timing.
    ///
    /// References to attributes the target kind does not define are skipped
    /// here; [`validate`](Self::validate) reports them.
    pub fn dependencies(&self) -> Vec<DeclaredDependency> {
        let mut deps = Vec::new();
        for (prop, value) in &self.properties {
            value.visit_refs(&mut |site| {
                let timing = match site {
                    RefSite::Attribute(r) => r.target.kind.schema().attribute_timing(&r.attribute),
                    RefSite::Secret(_) => Some(AttributeTiming::CreationTime),
                };
                if let Some(timing) = timing {
                    deps.push(DeclaredDependency {
                        target: site.target().clone(),
                        timing,
                        via: prop.clone(),
                    });
                }
            });
        }
        for key in &self.depends_on {
            deps.push(DeclaredDependency {
                target: key.clone(),
                timing: AttributeTiming::CreationTime,
                via: "depends_on".to_string(),
            });
        }
        deps.sort();
        deps
    }

    /// Check the declaration against its kind's schema.
    ///
    /// Only looks at this declaration; whether referenced targets exist is
    /// the graph builder's concern.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let subject = self.key.to_string();
        let schema = self.kind().schema();
        let mut issues = Vec::new();

        if self.key.name.trim().is_empty() {
            issues.push(ValidationIssue::new(&subject, "name must not be empty"));
        }

        for field in schema.required {
            let present = match *field {
                "location" => self.location.as_deref().is_some_and(|l| !l.trim().is_empty()),
                "sku" => self.sku.as_ref().is_some_and(|s| !s.name.trim().is_empty()),
                prop => self.properties.contains_key(prop),
            };
            if !present {
                issues.push(ValidationIssue::new(
                    &subject,
                    format!("missing required field '{}'", field),
                ));
            }
        }

        for (prop, value) in &self.properties {
            value.visit_refs(&mut |site| {
                if site.target() == &self.key {
                    issues.push(ValidationIssue::new(
                        &subject,
                        format!("property '{}' references its own resource", prop),
                    ));
                    return;
                }
                let target_schema = site.target().kind.schema();
                match site {
                    RefSite::Attribute(r) if target_schema.attribute_timing(&r.attribute).is_none() => {
                        issues.push(ValidationIssue::new(
                            &subject,
                            format!(
                                "property '{}' references unknown attribute '{}' of {}",
                                prop, r.attribute, r.target
                            ),
                        ));
                    }
                    RefSite::Secret(s) if !target_schema.exposes_secret(s.secret) => {
                        issues.push(ValidationIssue::new(
                            &subject,
                            format!("property '{}' references secret {} that {} does not expose", prop, s.secret, s.target.kind),
                        ));
                    }
                    _ => {}
                }
            });
        }

        if self.key.kind == ResourceKind::RoleAssignment {
            issues.extend(self.validate_binding_shape(&subject));
        }

        issues
    }

    fn validate_binding_shape(&self, subject: &str) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        match self.property("principal") {
            Some(PropertyValue::Ref(r))
                if r.target.kind == ResourceKind::Compute && r.attribute == "principal_id" => {}
            Some(_) => issues.push(ValidationIssue::new(
                subject,
                "'principal' must reference the principal_id of a compute host",
            )),
            None => {}
        }
        match self.property("role") {
            Some(PropertyValue::String(role)) => {
                if let Err(e) = role.parse::<RoleDefinition>() {
                    issues.push(ValidationIssue::new(subject, e));
                }
            }
            Some(_) => issues.push(ValidationIssue::new(subject, "'role' must be a role name")),
            None => {}
        }
        match self.property("scope") {
            Some(PropertyValue::Ref(r)) if r.attribute == "id" => {
                if r.target.kind == ResourceKind::RoleAssignment {
                    issues.push(ValidationIssue::new(
                        subject,
                        "'scope' cannot be another role assignment",
                    ));
                }
            }
            Some(_) => issues.push(ValidationIssue::new(
                subject,
                "'scope' must reference the id of a single declared resource",
            )),
            None => {}
        }
        issues
    }

    /// Fingerprint of the declared configuration.
    ///
    /// Secret references contribute their identity, never a value.
    pub fn fingerprint(&self) -> Fingerprint {
        let canonical = Canonical {
            key: &self.key,
            location: &self.location,
            sku: &self.sku,
            properties: &self.properties,
            depends_on: &self.depends_on,
        };
        let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
        Fingerprint::from_bytes(&bytes)
    }
}
