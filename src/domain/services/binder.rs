//! Identity & access binder
//!
//! Turns a role-assignment declaration into an [`IdentityBinding`] once the
//! principal-bearing compute host exists, and decides whether the grant is
//! already in place. Backend calls stay with the caller.

use crate::domain::entities::{IdentityBinding, LiveResource, ResourceDeclaration};
use crate::domain::value_objects::{
    DeploymentScope, PropertyValue, ResourceId, ResourceKey, ResourceKind, RoleDefinition,
};
use crate::error::{ProvisionError, ProvisionResult};

/// The parts of a role-assignment declaration the binder needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRequest {
    /// Compute host whose system-assigned identity receives the grant
    pub principal: ResourceKey,
    pub role: RoleDefinition,
    /// Resource the grant is scoped to
    pub target: ResourceKey,
}

impl BindingRequest {
    pub fn from_declaration(decl: &ResourceDeclaration) -> ProvisionResult<Self> {
        let subject = decl.key().to_string();
        if decl.kind() != ResourceKind::RoleAssignment {
            return Err(ProvisionError::invalid(subject, "not a role assignment"));
        }

        let principal = match decl.property("principal") {
            Some(PropertyValue::Ref(r)) if r.attribute == "principal_id" => r.target.clone(),
            _ => {
                return Err(ProvisionError::invalid(
                    subject,
                    "'principal' must reference the principal_id of a compute host",
                ))
            }
        };
        let role = match decl.property("role") {
            Some(PropertyValue::String(name)) => name
                .parse::<RoleDefinition>()
                .map_err(|e| ProvisionError::invalid(&subject, e))?,
            _ => return Err(ProvisionError::invalid(subject, "'role' must be a role name")),
        };
        let target = match decl.property("scope") {
            Some(PropertyValue::Ref(r)) if r.attribute == "id" => r.target.clone(),
            _ => {
                return Err(ProvisionError::invalid(
                    subject,
                    "'scope' must reference the id of a single declared resource",
                ))
            }
        };

        Ok(Self {
            principal,
            role,
            target,
        })
    }
}

/// Whether a binding had to be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    Created,
    Unchanged,
}

pub struct IdentityBinder;

impl IdentityBinder {
    /// Build the binding for `request`.
    ///
    /// `principal` is the host's live state as converged in this run; without
    /// a principal id the grant cannot be expressed yet. The scope must name
    /// exactly one resource.
    pub fn bind(
        request: &BindingRequest,
        principal: Option<&LiveResource>,
        scope_id: ResourceId,
        deployment: &DeploymentScope,
    ) -> ProvisionResult<IdentityBinding> {
        let principal_id = principal
            .and_then(LiveResource::principal_id)
            .ok_or_else(|| ProvisionError::PrincipalNotReady {
                resource: request.principal.clone(),
            })?;

        if !scope_id.is_single_resource() {
            return Err(ProvisionError::invalid(
                request.target.to_string(),
                format!(
                    "role assignments must be scoped to a single resource, got '{}'",
                    scope_id
                ),
            ));
        }

        Ok(IdentityBinding::new(
            principal_id,
            request.role.definition_id(deployment),
            scope_id,
        ))
    }

    /// An assignment with the same deterministic id is the same grant
    pub fn plan(binding: &IdentityBinding, existing: Option<&IdentityBinding>) -> BindingAction {
        match existing {
            Some(found) if found == binding => BindingAction::Unchanged,
            _ => BindingAction::Created,
        }
    }
}
