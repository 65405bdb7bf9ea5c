//! Identity binding entity
//!
//! A role assignment granting a principal a role on exactly one resource.
//! The principal id is an output of the compute host, so a binding can only
//! be built after that host exists.

use crate::domain::value_objects::{deterministic_guid, ResourceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityBinding {
    pub principal_id: String,
    pub role_definition_id: String,
    pub scope: ResourceId,
}

impl IdentityBinding {
    pub fn new(
        principal_id: impl Into<String>,
        role_definition_id: impl Into<String>,
        scope: ResourceId,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            role_definition_id: role_definition_id.into(),
            scope,
        }
    }

    /// Deterministic assignment name.
    ///
    /// Derived from (scope, principal id, role definition id) only, so the
    /// same grant always maps to the same assignment and re-applying it is a
    /// no-op.
    pub fn assignment_name(&self) -> String {
        deterministic_guid(&[
            self.scope.as_str(),
            &self.principal_id,
            &self.role_definition_id,
        ])
    }

    /// Backend id of the assignment, nested under the scope it grants
    pub fn assignment_id(&self) -> ResourceId {
        ResourceId::new(format!(
            "{}/providers/Microsoft.Authorization/roleAssignments/{}",
            self.scope,
            self.assignment_name()
        ))
    }
}
