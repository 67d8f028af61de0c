//! Well-formedness checks to run before the delay or MNA analyses.
//!
//! A floating node has no resistive path to ground or to any driver; its DC
//! voltage is undefined and it makes G singular. A resistor loop breaks the
//! tree assumption behind Elmore delay.

use super::graph::{BranchId, CircuitGraph, CircuitTopology, NodeId};
use super::traversal::depth_first_forest;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
struct NodeKey(u32);

type NodeUf = ena::unify::InPlaceUnificationTable<NodeKey>;

/// Lowest node index in a merged set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
struct Representative(usize);

impl ena::unify::UnifyKey for NodeKey {
    type Value = Representative;
    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        Self(u)
    }

    fn tag() -> &'static str {
        "NodeKey"
    }
}

impl ena::unify::UnifyValue for Representative {
    type Error = ena::unify::NoError;

    fn unify_values(value1: &Self, value2: &Self) -> Result<Self, Self::Error> {
        Ok(std::cmp::min(*value1, *value2))
    }
}

/// Partition of the nodes into resistively connected components.
#[derive(Debug, Clone)]
pub struct ResistiveComponents {
    labels: Vec<usize>,
    count: usize,
}

impl ResistiveComponents {
    /// Component label of `node`, in `0..count()`. Labels are assigned in
    /// order of first appearance by node index.
    #[must_use]
    pub fn label(&self, node: NodeId) -> usize {
        self.labels[node.index()]
    }

    /// Number of components.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// True when `a` and `b` share a resistive path.
    #[must_use]
    pub fn connected(&self, a: NodeId, b: NodeId) -> bool {
        self.label(a) == self.label(b)
    }
}

/// Connected components of the resistor-only view. Ground is an ordinary
/// member here: two nodes each resistively tied to ground are connected.
#[must_use]
pub fn resistive_components(graph: &CircuitGraph) -> ResistiveComponents {
    let view = graph.resistors_only();
    let mut uf = NodeUf::new();
    let keys: Vec<NodeKey> = (0..view.node_count())
        .map(|i| uf.new_key(Representative(i)))
        .collect();
    for id in view.branch_ids() {
        let (a, b) = view.branch(id).endpoints();
        uf.union(keys[a.index()], keys[b.index()]);
    }

    let mut relabel = vec![usize::MAX; view.node_count()];
    let mut labels = Vec::with_capacity(view.node_count());
    let mut count = 0;
    for &key in &keys {
        let Representative(root) = uf.probe_value(key);
        if relabel[root] == usize::MAX {
            relabel[root] = count;
            count += 1;
        }
        labels.push(relabel[root]);
    }
    ResistiveComponents { labels, count }
}

/// Nodes with no resistive path to ground or to any of `drivers`, in node
/// insertion order.
#[must_use]
pub fn floating_nodes(graph: &CircuitGraph, drivers: &[NodeId]) -> Vec<NodeId> {
    let components = resistive_components(graph);
    let mut driven = vec![false; components.count()];
    driven[components.label(graph.ground())] = true;
    for &d in drivers {
        driven[components.label(d)] = true;
    }

    let floating: Vec<NodeId> = graph
        .nodes()
        .filter(|&n| !driven[components.label(n)])
        .collect();
    for &n in &floating {
        tracing::debug!(node = graph.node_name(n), "node is undriven");
    }
    floating
}

/// A cycle in the resistor-only view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResistorLoop {
    /// Branch that closes the cycle.
    pub closing_branch: BranchId,
    /// Nodes around the cycle, starting at the node the closing branch
    /// returns to. The first node is not repeated at the end.
    pub nodes: Vec<NodeId>,
}

impl ResistorLoop {
    /// Renders the loop as `a->b->c->a` using node names.
    #[must_use]
    pub fn describe(&self, graph: &CircuitGraph) -> String {
        let mut names: Vec<&str> = self.nodes.iter().map(|&n| graph.node_name(n)).collect();
        if let Some(&first) = names.first() {
            names.push(first);
        }
        names.join("->")
    }
}

/// Every resistor loop found by a depth-first forest over the resistor-only
/// view, one per back edge. Parallel resistors form a two-node loop and a
/// resistive self-loop a one-node loop. Cycles that only close through
/// ground are not reported, since ground is never crossed.
#[must_use]
pub fn resistor_loops(graph: &CircuitGraph) -> Vec<ResistorLoop> {
    let view = graph.resistors_only();
    let tree = depth_first_forest(&view);
    let loops: Vec<ResistorLoop> = tree
        .back_edges()
        .iter()
        .filter_map(|edge| {
            let mut nodes = tree.path_to_ancestor(edge.source, edge.target)?;
            nodes.reverse();
            Some(ResistorLoop {
                closing_branch: edge.branch,
                nodes,
            })
        })
        .collect();
    for l in &loops {
        tracing::warn!("resistor loop detected: {}", l.describe(graph));
    }
    loops
}
