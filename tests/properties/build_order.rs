//! Property tests for the dependency graph builder.

use std::collections::BTreeSet;

use proptest::prelude::*;

use drawstack::domain::services::DependencyGraph;
use drawstack::domain::value_objects::Sku;
use drawstack::{ProvisionError, ResourceDeclaration, ResourceKey};

/// Node `i` may only depend on nodes with a smaller index, so any edge set
/// generated this way is acyclic.
fn dag() -> impl Strategy<Value = Vec<ResourceDeclaration>> {
    (1usize..12)
        .prop_flat_map(|n| {
            proptest::collection::vec(proptest::collection::vec(any::<prop::sample::Index>(), 0..3), n)
        })
        .prop_map(|deps| {
            deps.iter()
                .enumerate()
                .map(|(i, picks)| {
                    let mut decl = ResourceDeclaration::storage(format!("node{:02}", i))
                        .with_location("westeurope")
                        .with_sku(Sku::storage("Standard_LRS"));
                    if i > 0 {
                        for pick in picks {
                            decl = decl.depends_on(ResourceKey::storage(format!("node{:02}", pick.index(i))));
                        }
                    }
                    decl
                })
                .collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: every dependency is applied before its dependent.
    #[test]
    fn property_order_respects_every_edge(decls in dag()) {
        let order = DependencyGraph::build(&decls).unwrap();
        prop_assert_eq!(order.len(), decls.len());
        for edge in order.edges() {
            let from = order.position(&edge.from).unwrap();
            let to = order.position(&edge.to).unwrap();
            prop_assert!(to < from, "{} must come before {}", edge.to, edge.from);
        }
    }

    /// PROPERTY: declaration order in the input never changes the build order.
    #[test]
    fn property_order_is_deterministic(
        (decls, shuffled) in dag().prop_flat_map(|d| (Just(d.clone()), Just(d).prop_shuffle()))
    ) {
        let a = DependencyGraph::build(&decls).unwrap();
        let b = DependencyGraph::build(&shuffled).unwrap();
        prop_assert_eq!(a.steps(), b.steps());
        prop_assert_eq!(a.waves(), b.waves());
    }

    /// PROPERTY: waves partition the steps and never hold dependent pairs.
    #[test]
    fn property_waves_are_independent(decls in dag()) {
        let order = DependencyGraph::build(&decls).unwrap();
        let flattened: Vec<&ResourceKey> = order.waves().iter().flatten().collect();
        prop_assert_eq!(flattened.len(), order.len());

        for wave in order.waves() {
            let members: BTreeSet<&ResourceKey> = wave.iter().collect();
            for key in wave {
                for edge in order.dependencies_of(key) {
                    prop_assert!(!members.contains(&edge.to));
                }
            }
        }
    }

    /// PROPERTY: closing any chain into a loop is reported as a cycle.
    #[test]
    fn property_back_edge_is_a_cycle(len in 2usize..8) {
        let decls: Vec<ResourceDeclaration> = (0..len)
            .map(|i| {
                let next = (i + 1) % len;
                ResourceDeclaration::storage(format!("n{}", i))
                    .with_location("westeurope")
                    .with_sku(Sku::storage("Standard_LRS"))
                    .depends_on(ResourceKey::storage(format!("n{}", next)))
            })
            .collect();
        match DependencyGraph::build(&decls) {
            Err(ProvisionError::CyclicDependency { cycle }) => {
                prop_assert_eq!(cycle.len(), len + 1);
                prop_assert_eq!(cycle.first(), cycle.last());
            }
            other => prop_assert!(false, "expected a cycle, got {:?}", other.map(|o| o.steps().to_vec())),
        }
    }
}
