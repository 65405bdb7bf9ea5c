//! Typed property values
//!
//! Declarations never embed another resource's runtime output as a string to
//! be interpolated later. They hold a [`Reference`] (or [`SecretRef`]) that the
//! graph builder can see and the resolver substitutes at apply time.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::ResourceKey;
use super::secret::SecretString;

/// Reference to an attribute of another declaration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub target: ResourceKey,
    pub attribute: String,
}

impl Reference {
    pub fn new(target: ResourceKey, attribute: impl Into<String>) -> Self {
        Self {
            target,
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.attribute)
    }
}

/// Secret material derivable from a resource's live state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKind {
    AccessKey,
    ConnectionString,
}

impl SecretKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::AccessKey => "access_key",
            SecretKind::ConnectionString => "connection_string",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a secret of another declaration, fetched only at apply time
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    pub target: ResourceKey,
    pub secret: SecretKind,
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.secret)
    }
}

/// Values taken from the deployment context rather than from a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    SubscriptionId,
    ResourceGroup,
    Location,
}

/// A declared property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
    Ref(Reference),
    Secret(SecretRef),
    Context(ContextField),
    /// Resolved fragments joined into a single string
    Concat(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn string(s: impl Into<String>) -> Self {
        PropertyValue::String(s.into())
    }

    pub fn reference(target: ResourceKey, attribute: impl Into<String>) -> Self {
        PropertyValue::Ref(Reference::new(target, attribute))
    }

    pub fn secret(target: ResourceKey, secret: SecretKind) -> Self {
        PropertyValue::Secret(SecretRef { target, secret })
    }

    /// Visit every reference (attribute or secret) nested in this value
    pub fn visit_refs<'a>(&'a self, visit: &mut dyn FnMut(RefSite<'a>)) {
        match self {
            PropertyValue::Ref(r) => visit(RefSite::Attribute(r)),
            PropertyValue::Secret(s) => visit(RefSite::Secret(s)),
            PropertyValue::List(items) | PropertyValue::Concat(items) => {
                for item in items {
                    item.visit_refs(visit);
                }
            }
            PropertyValue::Map(map) => {
                for value in map.values() {
                    value.visit_refs(visit);
                }
            }
            PropertyValue::String(_)
            | PropertyValue::Int(_)
            | PropertyValue::Bool(_)
            | PropertyValue::Context(_) => {}
        }
    }

    pub fn contains_secret(&self) -> bool {
        let mut found = false;
        self.visit_refs(&mut |site| {
            if matches!(site, RefSite::Secret(_)) {
                found = true;
            }
        });
        found
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Int(n)
    }
}

/// A reference found inside a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSite<'a> {
    Attribute(&'a Reference),
    Secret(&'a SecretRef),
}

impl RefSite<'_> {
    pub fn target(&self) -> &ResourceKey {
        match self {
            RefSite::Attribute(r) => &r.target,
            RefSite::Secret(s) => &s.target,
        }
    }
}

/// A property value after references have been substituted
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<ResolvedValue>),
    Map(BTreeMap<String, ResolvedValue>),
    Secret(SecretString),
    /// Not yet known: the source has not been created (plan mode only)
    Unknown,
}

impl ResolvedValue {
    pub fn is_known(&self) -> bool {
        match self {
            ResolvedValue::Unknown => false,
            ResolvedValue::List(items) => items.iter().all(ResolvedValue::is_known),
            ResolvedValue::Map(map) => map.values().all(ResolvedValue::is_known),
            _ => true,
        }
    }

    pub fn is_secret(&self) -> bool {
        match self {
            ResolvedValue::Secret(_) => true,
            ResolvedValue::List(items) => items.iter().any(ResolvedValue::is_secret),
            ResolvedValue::Map(map) => map.values().any(ResolvedValue::is_secret),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable rendering with secrets redacted
    pub fn render(&self) -> String {
        match self {
            ResolvedValue::String(s) => format!("{:?}", s),
            ResolvedValue::Int(n) => n.to_string(),
            ResolvedValue::Bool(b) => b.to_string(),
            ResolvedValue::List(items) => format!(
                "[{}]",
                items
                    .iter()
                    .map(ResolvedValue::render)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ResolvedValue::Map(map) => format!(
                "{{{}}}",
                map.iter()
                    .map(|(k, v)| format!("{} = {}", k, v.render()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            ResolvedValue::Secret(s) => s.to_string(),
            ResolvedValue::Unknown => "(known after apply)".to_string(),
        }
    }
}

impl From<&str> for ResolvedValue {
    fn from(s: &str) -> Self {
        ResolvedValue::String(s.to_string())
    }
}
