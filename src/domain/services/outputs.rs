//! Output resolver
//!
//! Computes named deployment outputs from the live state of converged
//! resources. Asking for an output whose resource has not converged is an
//! error rather than an empty value.

use std::collections::BTreeMap;

use crate::domain::entities::{DeploymentOutput, LiveResource, OutputDeclaration};
use crate::domain::value_objects::{ContextField, DeploymentScope, PropertyValue, ResourceKey};
use crate::error::{ProvisionError, ProvisionResult};

pub struct OutputResolver<'a> {
    scope: &'a DeploymentScope,
    converged: &'a BTreeMap<ResourceKey, LiveResource>,
}

impl<'a> OutputResolver<'a> {
    pub fn new(scope: &'a DeploymentScope, converged: &'a BTreeMap<ResourceKey, LiveResource>) -> Self {
        Self { scope, converged }
    }

    /// Resolve every output, in declaration order
    pub fn resolve_all(&self, outputs: &[OutputDeclaration]) -> ProvisionResult<Vec<DeploymentOutput>> {
        outputs.iter().map(|o| self.resolve(o)).collect()
    }

    pub fn resolve(&self, output: &OutputDeclaration) -> ProvisionResult<DeploymentOutput> {
        Ok(DeploymentOutput {
            name: output.name.clone(),
            value: self.render(&output.name, &output.value)?,
        })
    }

    fn render(&self, output: &str, value: &PropertyValue) -> ProvisionResult<String> {
        let unresolved = |reason: String| ProvisionError::UnresolvedOutput {
            output: output.to_string(),
            reason,
        };
        match value {
            PropertyValue::String(s) => Ok(s.clone()),
            PropertyValue::Int(n) => Ok(n.to_string()),
            PropertyValue::Bool(b) => Ok(b.to_string()),
            PropertyValue::Ref(r) => {
                let live = self
                    .converged
                    .get(&r.target)
                    .ok_or_else(|| unresolved(format!("{} has not converged", r.target)))?;
                live.attribute(&r.attribute)
                    .map(str::to_string)
                    .ok_or_else(|| unresolved(format!("{} has no attribute '{}'", r.target, r.attribute)))
            }
            PropertyValue::Context(ContextField::SubscriptionId) => Ok(self.scope.subscription_id.clone()),
            PropertyValue::Context(ContextField::ResourceGroup) => Ok(self.scope.resource_group.clone()),
            PropertyValue::Context(ContextField::Location) => {
                Err(unresolved("outputs have no location of their own".to_string()))
            }
            PropertyValue::Concat(parts) => parts
                .iter()
                .map(|p| self.render(output, p))
                .collect::<ProvisionResult<Vec<_>>>()
                .map(|pieces| pieces.concat()),
            PropertyValue::Secret(_) => Err(ProvisionError::invalid(
                format!("outputs.{}", output),
                "outputs must not reference secrets",
            )),
            PropertyValue::List(_) | PropertyValue::Map(_) => {
                Err(unresolved("outputs must be scalar".to_string()))
            }
        }
    }
}
