//! Blueprint Module
//!
//! Builds declaration sets from user parameters. The draw backend is a state
//! storage account, an optional artifact storage account, a compute host and
//! a role binding that lets the host's identity write diagrams.
//!
//! ## Structure
//!
//! - `set` - The declaration set handed to the engine (`DeclarationSet`)
//! - `parameters` - User parameters and naming rules (`Parameters`)
//! - `fragments` - One declaration per fragment (`StateStorage`, `ComputeHost`, ...)

mod fragments;
mod parameters;
mod set;

pub use fragments::{ArtifactStorage, BlobRoleBinding, ComputeHost, Fragment, StateStorage};
pub use parameters::{Parameters, RUNTIMES};
pub use set::DeclarationSet;

use crate::domain::entities::OutputDeclaration;
use crate::domain::value_objects::{PropertyValue, ResourceKey};
use crate::error::ProvisionResult;

/// Output carrying the public URL of the compute host
pub const ENDPOINT_OUTPUT: &str = "endpoint";

pub struct Blueprint;

impl Blueprint {
    /// Declarations and outputs for the draw backend.
    ///
    /// Parameters are validated first; every issue is reported at once.
    pub fn draw_backend(params: &Parameters) -> ProvisionResult<DeclarationSet> {
        let params = params.clone().validated()?;
        let role = params.role_definition()?;

        let state_key = ResourceKey::storage(&params.state_storage_name);
        let artifact_key = ResourceKey::storage(params.artifact_account());

        let state = StateStorage {
            name: params.state_storage_name.clone(),
            location: params.location.clone(),
            sku: params.storage_sku.clone(),
            containers: if params.has_separate_artifact_storage() {
                Vec::new()
            } else {
                vec![params.artifact_container.clone()]
            },
        };
        let host = ComputeHost {
            name: params.compute_name.clone(),
            location: params.location.clone(),
            plan_sku: params.plan_sku.clone(),
            runtime: params.runtime.clone(),
            state_storage: state_key,
            artifact_storage: artifact_key.clone(),
            artifact_container: params.artifact_container.clone(),
            identity_name: params.identity_name.clone(),
            plan_id: params.plan_id.clone(),
        };
        let binding = BlobRoleBinding {
            host: host.key(),
            storage: artifact_key.clone(),
            role,
        };

        let mut set = DeclarationSet::new().with_declaration(state.declaration());
        if params.has_separate_artifact_storage() {
            set.add(
                ArtifactStorage {
                    name: params.artifact_account().to_string(),
                    location: params.location.clone(),
                    sku: params.storage_sku.clone(),
                    container: params.artifact_container.clone(),
                }
                .declaration(),
            );
        }

        let host_key = host.key();
        let set = set
            .with_declaration(host.declaration())
            .with_declaration(binding.declaration())
            .with_output(OutputDeclaration::new(
                ENDPOINT_OUTPUT,
                PropertyValue::Concat(vec![
                    PropertyValue::string("https://"),
                    PropertyValue::reference(host_key.clone(), "default_hostname"),
                ]),
            ))
            .with_output(OutputDeclaration::new(
                "artifact_storage_url",
                PropertyValue::reference(artifact_key, "blob_endpoint"),
            ))
            .with_output(OutputDeclaration::new(
                "artifact_container",
                params.artifact_container.as_str(),
            ))
            .with_output(OutputDeclaration::new(
                "principal_id",
                PropertyValue::reference(host_key, "principal_id"),
            ));

        tracing::debug!(
            declarations = set.len(),
            outputs = set.outputs().len(),
            "draw backend blueprint built"
        );
        Ok(set)
    }
}
