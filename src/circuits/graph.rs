//! Undirected multigraph of named nodes joined by resistor/capacitor branches.
//!
//! Every graph owns a ground node, created by [`CircuitGraph::new`] and never
//! removed. Ground is a sink: [`CircuitTopology::outgoing_branches`] on ground
//! is always empty, so traversals may arrive at ground but never pass through
//! it.

use std::collections::HashMap;
use std::fmt;

use crate::math::Scalar;

use super::component::{Component, ComponentKind};
use super::filter::ResistorView;

/// Name given to the ground node.
pub const GROUND_NAME: &str = "gnd";

/// Opaque node handle, valid only for the graph that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Dense index of this node, usable to index per-node tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Opaque branch handle, valid only for the graph that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchId(usize);

impl BranchId {
    /// Dense index of this branch.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A component connecting two nodes. Direction is not meaningful; `a`/`b`
/// only record the order given at insertion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    a: NodeId,
    b: NodeId,
    component: Component,
}

impl Branch {
    /// Both endpoints, in insertion order.
    #[must_use]
    pub const fn endpoints(&self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }

    /// The component this branch carries.
    #[must_use]
    pub const fn component(&self) -> &Component {
        &self.component
    }

    /// The endpoint opposite `from`. For a self-loop this is `from` itself.
    ///
    /// # Panics
    /// If `from` is not an endpoint of this branch.
    #[must_use]
    pub fn opposite(&self, from: NodeId) -> NodeId {
        if from == self.a {
            self.b
        } else {
            assert_eq!(from, self.b, "node {from} is not an endpoint of this branch");
            self.a
        }
    }
}

/// One edge of an extracted netlist, keyed by node names.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    /// First terminal.
    pub from: String,
    /// Second terminal.
    pub to: String,
    /// Resistor or capacitor.
    pub kind: ComponentKind,
    /// Value in ohms or farads.
    pub value: Scalar,
}

impl EdgeRecord {
    /// Convenience constructor.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: ComponentKind,
        value: Scalar,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            value,
        }
    }
}

/// Read-only graph interface shared by [`CircuitGraph`] and its filtered views.
///
/// Algorithms are written against this trait so they run unchanged on the
/// full circuit or on a projection of it.
pub trait CircuitTopology {
    /// Number of nodes, ground included. Node indices are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// The distinguished ground node.
    fn ground(&self) -> NodeId;

    /// Branches leaving `node`, in insertion order. Empty for ground.
    fn outgoing_branches(&self, node: NodeId) -> impl Iterator<Item = BranchId> + '_;

    /// Branch payload and endpoints.
    fn branch(&self, id: BranchId) -> &Branch;

    /// Every branch visible through this topology, in insertion order.
    fn branch_ids(&self) -> impl Iterator<Item = BranchId> + '_;

    /// Display name of `node`.
    fn node_name(&self, node: NodeId) -> &str;

    /// Component carried by `id`.
    fn component(&self, id: BranchId) -> &Component {
        self.branch(id).component()
    }
}

/// Circuit graph with insertion-ordered nodes and branches.
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    names: Vec<String>,
    branches: Vec<Branch>,
    incidence: Vec<Vec<BranchId>>,
    by_name: HashMap<String, NodeId>,
    ground: NodeId,
}

impl CircuitGraph {
    /// Creates a graph holding only the ground node.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            names: Vec::new(),
            branches: Vec::new(),
            incidence: Vec::new(),
            by_name: HashMap::new(),
            ground: NodeId(0),
        };
        graph.ground = graph.add_node(GROUND_NAME);
        graph
    }

    /// Builds a graph from a stream of edge records.
    #[must_use]
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EdgeRecord>,
    {
        let mut graph = Self::new();
        for record in records {
            graph.add_record(record);
        }
        graph
    }

    /// Appends a node. Names need not be unique; name lookup resolves to the
    /// first node registered under a name.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.names.len());
        let name = name.into();
        self.by_name.entry(name.clone()).or_insert(id);
        self.names.push(name);
        self.incidence.push(Vec::new());
        id
    }

    /// Appends a branch between `a` and `b`. Parallel branches and self-loops
    /// are accepted as given.
    ///
    /// # Panics
    /// If either node id does not belong to this graph.
    pub fn add_branch(&mut self, a: NodeId, b: NodeId, component: Component) -> BranchId {
        self.check_node(a);
        self.check_node(b);
        let id = BranchId(self.branches.len());
        self.branches.push(Branch { a, b, component });
        self.incidence[a.0].push(id);
        if a != b {
            self.incidence[b.0].push(id);
        }
        id
    }

    /// Adds the branch described by `record`, creating nodes for names not
    /// seen before. `gnd` and `0` both name ground.
    pub fn add_record(&mut self, record: &EdgeRecord) -> BranchId {
        let a = self.resolve(&record.from);
        let b = self.resolve(&record.to);
        self.add_branch(a, b, Component::from_kind(record.kind, record.value))
    }

    /// Looks a node up by name.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        if name == "0" {
            return Some(self.ground);
        }
        self.by_name.get(name).copied()
    }

    /// All incident branches of `node`, ground included, in insertion order.
    /// Unlike [`CircuitTopology::outgoing_branches`] this does not treat
    /// ground as a sink.
    #[must_use]
    pub fn incident_branches(&self, node: NodeId) -> &[BranchId] {
        &self.incidence[node.0]
    }

    /// Node ids in insertion order (ground first).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.names.len()).map(NodeId)
    }

    /// Number of branches.
    #[must_use]
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Resistor-only projection of this graph.
    #[must_use]
    pub fn resistors_only(&self) -> ResistorView<'_> {
        ResistorView::new(self)
    }

    fn resolve(&mut self, name: &str) -> NodeId {
        match self.find_node(name) {
            Some(id) => id,
            None => self.add_node(name),
        }
    }

    fn check_node(&self, node: NodeId) {
        assert!(
            node.0 < self.names.len(),
            "node {node} does not belong to this graph ({} nodes)",
            self.names.len()
        );
    }
}

impl Default for CircuitGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitTopology for CircuitGraph {
    fn node_count(&self) -> usize {
        self.names.len()
    }

    fn ground(&self) -> NodeId {
        self.ground
    }

    fn outgoing_branches(&self, node: NodeId) -> impl Iterator<Item = BranchId> + '_ {
        let incident: &[BranchId] = if node == self.ground {
            &[]
        } else {
            &self.incidence[node.0]
        };
        incident.iter().copied()
    }

    fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id.0]
    }

    fn branch_ids(&self) -> impl Iterator<Item = BranchId> + '_ {
        (0..self.branches.len()).map(BranchId)
    }

    fn node_name(&self, node: NodeId) -> &str {
        &self.names[node.0]
    }
}
