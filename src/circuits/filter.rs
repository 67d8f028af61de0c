//! Resistor-only projection of a circuit graph.

use super::graph::{Branch, BranchId, CircuitGraph, CircuitTopology, NodeId};

/// Live view of a [`CircuitGraph`] exposing only resistor branches.
///
/// The view borrows the graph and filters on every call; nothing is copied
/// or cached. Nodes are shared with the underlying graph.
#[derive(Debug, Clone, Copy)]
pub struct ResistorView<'g> {
    graph: &'g CircuitGraph,
}

impl<'g> ResistorView<'g> {
    /// Wraps `graph`.
    #[must_use]
    pub const fn new(graph: &'g CircuitGraph) -> Self {
        Self { graph }
    }

    /// Underlying graph.
    #[must_use]
    pub const fn graph(&self) -> &'g CircuitGraph {
        self.graph
    }

    fn keeps(&self, id: BranchId) -> bool {
        self.graph.component(id).is_resistor()
    }
}

impl CircuitTopology for ResistorView<'_> {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn ground(&self) -> NodeId {
        self.graph.ground()
    }

    fn outgoing_branches(&self, node: NodeId) -> impl Iterator<Item = BranchId> + '_ {
        self.graph
            .outgoing_branches(node)
            .filter(move |&id| self.keeps(id))
    }

    fn branch(&self, id: BranchId) -> &Branch {
        self.graph.branch(id)
    }

    fn branch_ids(&self) -> impl Iterator<Item = BranchId> + '_ {
        self.graph.branch_ids().filter(move |&id| self.keeps(id))
    }

    fn node_name(&self, node: NodeId) -> &str {
        self.graph.node_name(node)
    }
}
