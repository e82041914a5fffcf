//! Declaration graph management using `petgraph`.
//!
//! Every declaration is a node; an edge points from a dependency to the
//! declaration that references it, so topological order yields dependencies
//! first. A declaration may only reference ids that are already declared.

use std::collections::HashMap;

use fargate_stack_common::error::{Result, StackError};
use fargate_stack_common::types::Tags;
use petgraph::Direction;
use petgraph::graph::NodeIndex;

use crate::declaration::{Declaration, ResourceId, ResourceKind, ResourceSpec};

/// A dependency graph of resource declarations.
#[derive(Debug, Default)]
pub struct DeclarationGraph {
    graph: petgraph::Graph<Declaration, ()>,
    index: HashMap<ResourceId, NodeIndex>,
}

impl DeclarationGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration and the edges to everything its spec references.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DuplicateDeclaration`] if `id` is already
    /// declared, or [`StackError::DanglingReference`] if the spec references
    /// an undeclared id. The graph is unchanged on error.
    pub fn declare(&mut self, id: ResourceId, spec: ResourceSpec) -> Result<ResourceId> {
        if self.index.contains_key(&id) {
            return Err(StackError::DuplicateDeclaration { id: id.to_string() });
        }
        let dependencies = spec
            .references()
            .into_iter()
            .map(|reference| {
                self.index
                    .get(reference)
                    .copied()
                    .ok_or_else(|| StackError::DanglingReference {
                        from: id.to_string(),
                        to: reference.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(id = %id, kind = %spec.kind(), "declared");
        let node = self.graph.add_node(Declaration {
            id: id.clone(),
            spec,
            tags: Tags::new(),
        });
        for dependency in dependencies {
            let _ = self.graph.add_edge(dependency, node, ());
        }
        let _ = self.index.insert(id.clone(), node);
        Ok(id)
    }

    /// Adds an explicit ordering constraint: `dependent` depends on `dependency`.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DanglingReference`] if either id is undeclared.
    pub fn add_dependency(&mut self, dependent: &ResourceId, dependency: &ResourceId) -> Result<()> {
        let to = self.node(dependent, dependency)?;
        let from = self.node(dependency, dependent)?;
        let _ = self.graph.update_edge(from, to, ());
        Ok(())
    }

    fn node(&self, id: &ResourceId, referrer: &ResourceId) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| StackError::DanglingReference {
                from: referrer.to_string(),
                to: id.to_string(),
            })
    }

    /// Returns the declaration with the given id.
    #[must_use]
    pub fn get(&self, id: &ResourceId) -> Option<&Declaration> {
        self.index
            .get(id)
            .and_then(|&node| self.graph.node_weight(node))
    }

    /// Returns `true` if `id` is declared.
    #[must_use]
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.index.contains_key(id)
    }

    /// Ids of the declarations `id` depends on, sorted by path.
    #[must_use]
    pub fn dependencies(&self, id: &ResourceId) -> Vec<&ResourceId> {
        let Some(&node) = self.index.get(id) else {
            return Vec::new();
        };
        let mut deps: Vec<&ResourceId> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n))
            .map(|d| &d.id)
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    /// Iterates declarations in insertion order.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.graph.node_weights()
    }

    /// Declarations of the given kind, in insertion order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Declaration> {
        self.declarations().filter(move |d| d.kind() == kind)
    }

    /// Number of declarations of the given kind.
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Number of declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Adds every tag to every taggable declaration. Existing keys are overwritten.
    pub fn apply_tags(&mut self, tags: &Tags) {
        for declaration in self.graph.node_weights_mut() {
            if declaration.kind().is_taggable() {
                declaration
                    .tags
                    .extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
    }

    /// Returns declarations in deployment order, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::CyclicDependency`] if the graph contains a cycle.
    pub fn resolve_order(&self) -> Result<Vec<&Declaration>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx))
                .collect()),
            Err(_cycle) => Err(StackError::CyclicDependency),
        }
    }
}
