//! Dependency graph builder
//!
//! Turns a set of declarations into an application order. Edges come from the
//! typed references inside each declaration's properties plus explicit
//! `depends_on` entries. The order is a topological sort with ties broken by
//! `(name, kind)`, so the same input always yields the same order.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entities::ResourceDeclaration;
use crate::domain::value_objects::{AttributeTiming, ResourceKey};
use crate::error::{ProvisionError, ProvisionResult, ValidationIssue};

/// `from` cannot be applied until `to` has resolved its outputs
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub from: ResourceKey,
    pub to: ResourceKey,
    /// Strongest timing among the references behind this edge
    pub timing: AttributeTiming,
}

/// A validated application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOrder {
    steps: Vec<ResourceKey>,
    edges: Vec<DependencyEdge>,
    waves: Vec<Vec<ResourceKey>>,
}

impl BuildOrder {
    /// Keys in application order
    pub fn steps(&self) -> &[ResourceKey] {
        &self.steps
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Steps grouped into levels; every edge points from a later wave into
    /// an earlier one, so steps inside a wave are independent
    pub fn waves(&self) -> &[Vec<ResourceKey>] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Position of `key` in the application order
    pub fn position(&self, key: &ResourceKey) -> Option<usize> {
        self.steps.iter().position(|k| k == key)
    }

    /// Outgoing edges of `key` (what it waits on)
    pub fn dependencies_of<'a>(
        &'a self,
        key: &'a ResourceKey,
    ) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.edges.iter().filter(move |e| &e.from == key)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Builds [`BuildOrder`]s
pub struct DependencyGraph;

impl DependencyGraph {
    /// Order `declarations` for application.
    ///
    /// Duplicate keys and references to undeclared resources are validation
    /// errors. A reference cycle fails with the cycle spelled out.
    pub fn build(declarations: &[ResourceDeclaration]) -> ProvisionResult<BuildOrder> {
        let mut nodes: BTreeSet<ResourceKey> = BTreeSet::new();
        let mut issues = Vec::new();
        for decl in declarations {
            if !nodes.insert(decl.key().clone()) {
                issues.push(ValidationIssue::new(
                    decl.key().to_string(),
                    "declared more than once",
                ));
            }
        }

        let mut edges: BTreeMap<(ResourceKey, ResourceKey), AttributeTiming> = BTreeMap::new();
        for decl in declarations {
            for dep in decl.dependencies() {
                if !nodes.contains(&dep.target) {
                    issues.push(ValidationIssue::new(
                        decl.key().to_string(),
                        format!("'{}' references undeclared resource {}", dep.via, dep.target),
                    ));
                    continue;
                }
                let timing = edges
                    .entry((decl.key().clone(), dep.target))
                    .or_insert(dep.timing);
                *timing = (*timing).max(dep.timing);
            }
        }

        if !issues.is_empty() {
            issues.dedup();
            return Err(ProvisionError::Validation { issues });
        }

        let mut adjacency: BTreeMap<&ResourceKey, Vec<&ResourceKey>> =
            nodes.iter().map(|k| (k, Vec::new())).collect();
        for (from, to) in edges.keys() {
            if let Some(out) = adjacency.get_mut(from) {
                out.push(to);
            }
        }

        if let Some(cycle) = find_cycle(&adjacency) {
            return Err(ProvisionError::CyclicDependency { cycle });
        }

        let steps = topological_order(&adjacency);
        let waves = group_waves(&steps, &adjacency);
        let edges = edges
            .into_iter()
            .map(|((from, to), timing)| DependencyEdge { from, to, timing })
            .collect();

        Ok(BuildOrder {
            steps,
            edges,
            waves,
        })
    }
}

/// Depth-first search with three marks. Returns the first cycle found,
/// closed on its first element (`a -> b -> a`).
fn find_cycle(adjacency: &BTreeMap<&ResourceKey, Vec<&ResourceKey>>) -> Option<Vec<ResourceKey>> {
    fn visit<'a>(
        node: &'a ResourceKey,
        adjacency: &BTreeMap<&'a ResourceKey, Vec<&'a ResourceKey>>,
        marks: &mut BTreeMap<&'a ResourceKey, Mark>,
        path: &mut Vec<&'a ResourceKey>,
    ) -> Option<Vec<ResourceKey>> {
        marks.insert(node, Mark::InProgress);
        path.push(node);
        for &next in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
            match marks.get(next).copied().unwrap_or(Mark::Unvisited) {
                Mark::InProgress => {
                    let start = path.iter().position(|k| *k == next).unwrap_or(0);
                    let mut cycle: Vec<ResourceKey> =
                        path[start..].iter().map(|k| (*k).clone()).collect();
                    cycle.push(next.clone());
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(next, adjacency, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks: BTreeMap<&ResourceKey, Mark> = BTreeMap::new();
    for &node in adjacency.keys() {
        if marks.get(node).copied().unwrap_or(Mark::Unvisited) == Mark::Unvisited {
            let mut path = Vec::new();
            if let Some(cycle) = visit(node, adjacency, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Kahn's algorithm; the ready set is ordered by `(name, kind)`
fn topological_order(adjacency: &BTreeMap<&ResourceKey, Vec<&ResourceKey>>) -> Vec<ResourceKey> {
    let mut remaining: BTreeMap<&ResourceKey, usize> =
        adjacency.iter().map(|(k, deps)| (*k, deps.len())).collect();
    let mut dependents: BTreeMap<&ResourceKey, Vec<&ResourceKey>> = BTreeMap::new();
    for (from, deps) in adjacency {
        for to in deps {
            dependents.entry(*to).or_default().push(*from);
        }
    }

    let mut ready: BTreeSet<&ResourceKey> = remaining
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(k, _)| *k)
        .collect();
    let mut order = Vec::with_capacity(adjacency.len());

    while let Some(next) = ready.pop_first() {
        order.push(next.clone());
        for dependent in dependents.get(next).map(Vec::as_slice).unwrap_or_default() {
            if let Some(n) = remaining.get_mut(dependent) {
                *n -= 1;
                if *n == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }
    order
}

fn group_waves(
    steps: &[ResourceKey],
    adjacency: &BTreeMap<&ResourceKey, Vec<&ResourceKey>>,
) -> Vec<Vec<ResourceKey>> {
    let mut level: BTreeMap<&ResourceKey, usize> = BTreeMap::new();
    let mut waves: Vec<Vec<ResourceKey>> = Vec::new();
    for key in steps {
        let depth = adjacency
            .get(key)
            .map(|deps| {
                deps.iter()
                    .filter_map(|d| level.get(d))
                    .map(|l| l + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        level.insert(key, depth);
        if waves.len() <= depth {
            waves.resize_with(depth + 1, Vec::new);
        }
        waves[depth].push(key.clone());
    }
    waves
}
