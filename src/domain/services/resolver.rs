//! Property resolver
//!
//! Substitutes typed references with concrete values. Input-time attributes
//! come from the declaration and scope alone; creation-time attributes come
//! from resources that already converged in this run. Secrets are fetched
//! through a caller-supplied function, only when applying, and are wrapped in
//! [`SecretString`] so they cannot be printed by accident.

use std::collections::BTreeMap;

use crate::domain::entities::{DesiredResource, LiveResource, ResourceDeclaration};
use crate::domain::value_objects::{
    AttributeTiming, ContextField, DeploymentScope, PropertyValue, Reference, ResolvedValue,
    ResourceKey, ResourceKind, SecretRef, SecretString,
};
use crate::error::{ProvisionError, ProvisionResult};

/// Fetches a secret from a converged resource's live state
pub type SecretFetcher<'a> = dyn Fn(&SecretRef) -> ProvisionResult<SecretString> + 'a;

pub struct PropertyResolver<'a> {
    scope: &'a DeploymentScope,
    declarations: &'a [ResourceDeclaration],
    converged: &'a BTreeMap<ResourceKey, LiveResource>,
    secrets: Option<&'a SecretFetcher<'a>>,
}

impl<'a> PropertyResolver<'a> {
    /// Resolver for an apply: every reference must resolve
    pub fn for_apply(
        scope: &'a DeploymentScope,
        declarations: &'a [ResourceDeclaration],
        converged: &'a BTreeMap<ResourceKey, LiveResource>,
        secrets: &'a SecretFetcher<'a>,
    ) -> Self {
        Self {
            scope,
            declarations,
            converged,
            secrets: Some(secrets),
        }
    }

    /// Resolver for a dry run: secrets and values not known yet become
    /// [`ResolvedValue::Unknown`]
    pub fn for_plan(
        scope: &'a DeploymentScope,
        declarations: &'a [ResourceDeclaration],
        converged: &'a BTreeMap<ResourceKey, LiveResource>,
    ) -> Self {
        Self {
            scope,
            declarations,
            converged,
            secrets: None,
        }
    }

    fn is_plan(&self) -> bool {
        self.secrets.is_none()
    }

    /// Resolve a storage or compute declaration into the payload for one
    /// backend call
    pub fn resolve(&self, decl: &ResourceDeclaration) -> ProvisionResult<DesiredResource> {
        let mut properties = BTreeMap::new();
        for (name, value) in decl.properties() {
            properties.insert(name.clone(), self.resolve_value(decl, value)?);
        }
        Ok(DesiredResource {
            key: decl.key().clone(),
            id: self.scope.resource_id(decl.key()),
            location: decl.location().map(str::to_string),
            sku: decl.sku().cloned(),
            properties,
        })
    }

    pub fn resolve_value(
        &self,
        from: &ResourceDeclaration,
        value: &PropertyValue,
    ) -> ProvisionResult<ResolvedValue> {
        Ok(match value {
            PropertyValue::String(s) => ResolvedValue::String(s.clone()),
            PropertyValue::Int(n) => ResolvedValue::Int(*n),
            PropertyValue::Bool(b) => ResolvedValue::Bool(*b),
            PropertyValue::List(items) => ResolvedValue::List(
                items
                    .iter()
                    .map(|item| self.resolve_value(from, item))
                    .collect::<ProvisionResult<_>>()?,
            ),
            PropertyValue::Map(map) => {
                let mut resolved = BTreeMap::new();
                for (k, v) in map {
                    resolved.insert(k.clone(), self.resolve_value(from, v)?);
                }
                ResolvedValue::Map(resolved)
            }
            PropertyValue::Ref(r) => self.resolve_reference(from, r)?,
            PropertyValue::Secret(s) => self.resolve_secret(from, s)?,
            PropertyValue::Context(field) => self.resolve_context(from, *field)?,
            PropertyValue::Concat(parts) => self.resolve_concat(from, parts)?,
        })
    }

    fn resolve_reference(
        &self,
        from: &ResourceDeclaration,
        reference: &Reference,
    ) -> ProvisionResult<ResolvedValue> {
        if let Some(value) = self
            .converged
            .get(&reference.target)
            .and_then(|live| live.attribute(&reference.attribute))
        {
            return Ok(ResolvedValue::String(value.to_string()));
        }

        let timing = reference
            .target
            .kind
            .schema()
            .attribute_timing(&reference.attribute);
        if timing == Some(AttributeTiming::InputTime) {
            if let Some(value) = self.input_attribute(reference) {
                return Ok(value);
            }
        }

        self.unresolved(from, reference.to_string())
    }

    /// Attributes derivable without the backend
    fn input_attribute(&self, reference: &Reference) -> Option<ResolvedValue> {
        let target = &reference.target;
        match reference.attribute.as_str() {
            // role assignment ids depend on the principal id
            "id" if target.kind != ResourceKind::RoleAssignment => Some(ResolvedValue::String(
                self.scope.resource_id(target).to_string(),
            )),
            "name" if target.kind != ResourceKind::RoleAssignment => {
                Some(ResolvedValue::String(target.name.clone()))
            }
            "location" => self
                .declarations
                .iter()
                .find(|d| d.key() == target)
                .and_then(|d| d.location())
                .map(|l| ResolvedValue::String(l.to_string())),
            _ => None,
        }
    }

    fn resolve_secret(
        &self,
        from: &ResourceDeclaration,
        secret: &SecretRef,
    ) -> ProvisionResult<ResolvedValue> {
        match self.secrets {
            Some(fetch) if self.converged.contains_key(&secret.target) => {
                Ok(ResolvedValue::Secret(fetch(secret)?))
            }
            Some(_) => self.unresolved(from, secret.to_string()),
            None => Ok(ResolvedValue::Unknown),
        }
    }

    fn resolve_context(
        &self,
        from: &ResourceDeclaration,
        field: ContextField,
    ) -> ProvisionResult<ResolvedValue> {
        let value = match field {
            ContextField::SubscriptionId => self.scope.subscription_id.clone(),
            ContextField::ResourceGroup => self.scope.resource_group.clone(),
            ContextField::Location => from.location().map(str::to_string).ok_or_else(|| {
                ProvisionError::invalid(
                    from.key().to_string(),
                    "location context used by a declaration without a location",
                )
            })?,
        };
        Ok(ResolvedValue::String(value))
    }

    fn resolve_concat(
        &self,
        from: &ResourceDeclaration,
        parts: &[PropertyValue],
    ) -> ProvisionResult<ResolvedValue> {
        let mut joined = String::new();
        let mut secret = false;
        for part in parts {
            match self.resolve_value(from, part)? {
                ResolvedValue::String(s) => joined.push_str(&s),
                ResolvedValue::Int(n) => joined.push_str(&n.to_string()),
                ResolvedValue::Bool(b) => joined.push_str(&b.to_string()),
                ResolvedValue::Secret(s) => {
                    secret = true;
                    joined.push_str(s.expose());
                }
                ResolvedValue::Unknown => return Ok(ResolvedValue::Unknown),
                ResolvedValue::List(_) | ResolvedValue::Map(_) => {
                    return Err(ProvisionError::invalid(
                        from.key().to_string(),
                        "lists and maps cannot be concatenated",
                    ))
                }
            }
        }
        Ok(if secret {
            ResolvedValue::Secret(SecretString::new(joined))
        } else {
            ResolvedValue::String(joined)
        })
    }

    fn unresolved(&self, from: &ResourceDeclaration, reference: String) -> ProvisionResult<ResolvedValue> {
        if self.is_plan() {
            Ok(ResolvedValue::Unknown)
        } else {
            Err(ProvisionError::UnresolvedReference {
                from: from.key().clone(),
                reference,
            })
        }
    }
}
