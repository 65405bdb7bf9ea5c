//! Desired and live resource state
//!
//! `DesiredResource` is a declaration with every reference substituted; it
//! exists only for the duration of one apply call. `LiveResource` is what the
//! backend reports.

use std::collections::BTreeMap;

use crate::domain::value_objects::{ResolvedValue, ResourceId, ResourceKey, Sku};

/// A fully resolved declaration, ready to be submitted to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredResource {
    pub key: ResourceKey,
    pub id: ResourceId,
    pub location: Option<String>,
    pub sku: Option<Sku>,
    pub properties: BTreeMap<String, ResolvedValue>,
}

impl DesiredResource {
    pub fn has_unknowns(&self) -> bool {
        self.properties.values().any(|v| !v.is_known())
    }
}

/// A resource as observed in the backend
#[derive(Debug, Clone, PartialEq)]
pub struct LiveResource {
    pub key: ResourceKey,
    pub id: ResourceId,
    pub location: Option<String>,
    pub sku: Option<Sku>,
    pub properties: BTreeMap<String, ResolvedValue>,
    /// Referenceable attributes (`id`, `blob_endpoint`, `principal_id`, ...)
    pub attributes: BTreeMap<String, String>,
}

impl LiveResource {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn principal_id(&self) -> Option<&str> {
        self.attribute("principal_id").filter(|p| !p.is_empty())
    }
}
