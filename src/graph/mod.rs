//! The explicit resource dependency graph.
//!
//! Every declared resource is a node; every `depends_on` entry is an
//! edge. Materialization order is the graph's topological order with
//! dependencies first. Unknown references and cycles are synthesis
//! errors, caught before anything is materialized.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::core::resource::LogicalId;

/// Error while assembling or ordering the resource graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("duplicate resource id `{id}`")]
    DuplicateResource { id: LogicalId },

    #[error("resource `{from}` depends on undeclared resource `{to}`")]
    UnknownReference { from: LogicalId, to: LogicalId },

    #[error("dependency cycle detected involving `{id}`")]
    Cycle { id: LogicalId },
}

/// Directed graph of resource dependencies.
///
/// An edge `a -> b` means "a depends on b". Once populated the graph is
/// only read; deploy walks it forward, destroy walks it backward.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    /// Dependency graph
    graph: DiGraph<LogicalId, ()>,

    /// Map from logical ID to node index
    id_to_node: HashMap<LogicalId, NodeIndex>,
}

impl ResourceGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        ResourceGraph {
            graph: DiGraph::new(),
            id_to_node: HashMap::new(),
        }
    }

    /// Add a resource node.
    pub fn add_resource(&mut self, id: LogicalId) -> Result<(), SynthesisError> {
        if self.id_to_node.contains_key(&id) {
            return Err(SynthesisError::DuplicateResource { id });
        }

        let node = self.graph.add_node(id);
        self.id_to_node.insert(id, node);
        Ok(())
    }

    /// Add a dependency edge: `from` depends on `to`.
    ///
    /// Both endpoints must already be declared.
    pub fn add_dependency(&mut self, from: LogicalId, to: LogicalId) -> Result<(), SynthesisError> {
        let &from_node = self
            .id_to_node
            .get(&from)
            .ok_or(SynthesisError::UnknownReference { from, to })?;
        let &to_node = self
            .id_to_node
            .get(&to)
            .ok_or(SynthesisError::UnknownReference { from, to })?;

        if !self.graph.contains_edge(from_node, to_node) {
            self.graph.add_edge(from_node, to_node, ());
        }
        Ok(())
    }

    /// Check if a resource is declared.
    pub fn contains(&self, id: LogicalId) -> bool {
        self.id_to_node.contains_key(&id)
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.id_to_node.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.id_to_node.is_empty()
    }

    /// Direct dependencies of a resource.
    pub fn deps(&self, id: LogicalId) -> Vec<LogicalId> {
        if let Some(&node) = self.id_to_node.get(&id) {
            self.graph.neighbors(node).map(|n| self.graph[n]).collect()
        } else {
            Vec::new()
        }
    }

    /// Resources that depend on the given resource.
    pub fn dependents(&self, id: LogicalId) -> Vec<LogicalId> {
        if let Some(&node) = self.id_to_node.get(&id) {
            self.graph
                .neighbors_directed(node, petgraph::Direction::Incoming)
                .map(|n| self.graph[n])
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Resources in materialization order (dependencies before dependents).
    ///
    /// Fails with the cycle participant if the graph is not a DAG.
    pub fn materialization_order(&self) -> Result<Vec<LogicalId>, SynthesisError> {
        let mut order = toposort(&self.graph, None)
            .map_err(|cycle| SynthesisError::Cycle {
                id: self.graph[cycle.node_id()],
            })?
            .into_iter()
            .map(|n| self.graph[n])
            .collect::<Vec<_>>();

        // toposort returns nodes with a before b for edge a->b, but
        // add_dependency(a, b) means "a depends on b", so b must come
        // first. Reverse to get dependencies before dependents.
        order.reverse();
        Ok(order)
    }

    /// Resources in teardown order (dependents before dependencies).
    pub fn teardown_order(&self) -> Result<Vec<LogicalId>, SynthesisError> {
        let mut order = self.materialization_order()?;
        order.reverse();
        Ok(order)
    }
}
