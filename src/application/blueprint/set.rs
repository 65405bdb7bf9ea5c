//! Declaration set
//!
//! The unit the engine converges: resource declarations plus the outputs to
//! resolve once they have all converged.

use crate::domain::entities::{OutputDeclaration, ResourceDeclaration};
use crate::domain::value_objects::ResourceKey;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationSet {
    declarations: Vec<ResourceDeclaration>,
    outputs: Vec<OutputDeclaration>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, declaration: ResourceDeclaration) {
        self.declarations.push(declaration);
    }

    pub fn with_declaration(mut self, declaration: ResourceDeclaration) -> Self {
        self.add(declaration);
        self
    }

    pub fn with_output(mut self, output: OutputDeclaration) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    pub fn outputs(&self) -> &[OutputDeclaration] {
        &self.outputs
    }

    /// First declaration with this key.
    ///
    /// Duplicates are rejected by validation before a run starts.
    pub fn declaration(&self, key: &ResourceKey) -> Option<&ResourceDeclaration> {
        self.declarations.iter().find(|d| d.key() == key)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl FromIterator<ResourceDeclaration> for DeclarationSet {
    fn from_iter<I: IntoIterator<Item = ResourceDeclaration>>(iter: I) -> Self {
        Self {
            declarations: iter.into_iter().collect(),
            outputs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_key() {
        let set: DeclarationSet = [
            ResourceDeclaration::storage("a"),
            ResourceDeclaration::compute("a"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.declaration(&ResourceKey::compute("a")).map(|d| d.kind()),
            Some(crate::domain::value_objects::ResourceKind::Compute)
        );
        assert!(set.declaration(&ResourceKey::storage("b")).is_none());
    }
}
