//! Depth-first search over circuit topologies, returned as plain data.
//!
//! Instead of visitor callbacks, a search produces a [`DfsTree`]: the
//! predecessor map, the tree edges in discovery order, the post-order finish
//! list and the back edges. Analyses then make ordinary passes over that
//! data.

use super::graph::{BranchId, CircuitTopology, NodeId};

/// A branch as traversed: `source` was on the stack when `target` was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversedEdge {
    /// Branch that was followed.
    pub branch: BranchId,
    /// Node the branch was followed from.
    pub source: NodeId,
    /// Node the branch leads to.
    pub target: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Result of one or more depth-first searches over the same topology.
#[derive(Debug, Clone)]
pub struct DfsTree {
    roots: Vec<NodeId>,
    predecessor: Vec<Option<NodeId>>,
    discovered_via: Vec<Option<BranchId>>,
    discovered: Vec<bool>,
    tree_edges: Vec<TraversedEdge>,
    back_edges: Vec<TraversedEdge>,
    finish_order: Vec<NodeId>,
}

impl DfsTree {
    /// Roots the search was started from, in order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Node from which `node` was first reached; `None` for roots and
    /// unreached nodes.
    #[must_use]
    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.predecessor[node.index()]
    }

    /// Branch by which `node` was first reached.
    #[must_use]
    pub fn discovered_via(&self, node: NodeId) -> Option<BranchId> {
        self.discovered_via[node.index()]
    }

    /// True once the search has reached `node`.
    #[must_use]
    pub fn is_discovered(&self, node: NodeId) -> bool {
        self.discovered[node.index()]
    }

    /// Tree edges in discovery order; a node's own tree edge always precedes
    /// the tree edges of its descendants.
    #[must_use]
    pub fn tree_edges(&self) -> &[TraversedEdge] {
        &self.tree_edges
    }

    /// Edges leading back to a node still on the stack, other than the edge
    /// used to arrive. Each one closes a cycle.
    #[must_use]
    pub fn back_edges(&self) -> &[TraversedEdge] {
        &self.back_edges
    }

    /// Nodes in the order they finished (post-order).
    #[must_use]
    pub fn finish_order(&self) -> &[NodeId] {
        &self.finish_order
    }

    /// Walks predecessors from `node` up to and including `ancestor`.
    /// Returns `None` if `ancestor` is not on that path.
    #[must_use]
    pub fn path_to_ancestor(&self, node: NodeId, ancestor: NodeId) -> Option<Vec<NodeId>> {
        let mut path = vec![node];
        let mut current = node;
        while current != ancestor {
            current = self.predecessor(current)?;
            path.push(current);
        }
        Some(path)
    }
}

struct Frame {
    node: NodeId,
    branches: Vec<BranchId>,
    next: usize,
}

struct Search<'t, T: CircuitTopology> {
    topology: &'t T,
    color: Vec<Color>,
    tree: DfsTree,
}

impl<'t, T: CircuitTopology> Search<'t, T> {
    fn new(topology: &'t T) -> Self {
        let n = topology.node_count();
        Self {
            topology,
            color: vec![Color::White; n],
            tree: DfsTree {
                roots: Vec::new(),
                predecessor: vec![None; n],
                discovered_via: vec![None; n],
                discovered: vec![false; n],
                tree_edges: Vec::new(),
                back_edges: Vec::new(),
                finish_order: Vec::new(),
            },
        }
    }

    fn frame(&mut self, node: NodeId) -> Frame {
        self.color[node.index()] = Color::Gray;
        self.tree.discovered[node.index()] = true;
        Frame {
            node,
            branches: self.topology.outgoing_branches(node).collect(),
            next: 0,
        }
    }

    fn visit(&mut self, root: NodeId) {
        assert!(
            root.index() < self.color.len(),
            "root {root} does not belong to this topology"
        );
        if self.color[root.index()] != Color::White {
            return;
        }
        self.tree.roots.push(root);
        let mut stack = vec![self.frame(root)];

        while let Some(top) = stack.last_mut() {
            let source = top.node;
            let Some(&branch) = top.branches.get(top.next) else {
                self.color[source.index()] = Color::Black;
                self.tree.finish_order.push(source);
                stack.pop();
                continue;
            };
            top.next += 1;

            let target = self.topology.branch(branch).opposite(source);
            let edge = TraversedEdge {
                branch,
                source,
                target,
            };
            match self.color[target.index()] {
                Color::White => {
                    self.tree.predecessor[target.index()] = Some(source);
                    self.tree.discovered_via[target.index()] = Some(branch);
                    self.tree.tree_edges.push(edge);
                    let frame = self.frame(target);
                    stack.push(frame);
                }
                Color::Gray => {
                    if self.tree.discovered_via[source.index()] != Some(branch) {
                        self.tree.back_edges.push(edge);
                    }
                }
                Color::Black => {}
            }
        }
    }
}

/// Depth-first search from `root`, following
/// [`CircuitTopology::outgoing_branches`]. Nodes not reachable from `root`
/// stay undiscovered.
///
/// # Panics
/// If `root` does not belong to `topology`.
#[must_use]
pub fn depth_first<T: CircuitTopology>(topology: &T, root: NodeId) -> DfsTree {
    let mut search = Search::new(topology);
    search.visit(root);
    search.tree
}

/// Depth-first forest: restarts from every undiscovered node, in node index
/// order, until all nodes are discovered.
#[must_use]
pub fn depth_first_forest<T: CircuitTopology>(topology: &T) -> DfsTree {
    let mut search = Search::new(topology);
    let ground = topology.ground();
    for index in 0..topology.node_count() {
        let node = NodeId::from_index(index);
        if node != ground {
            search.visit(node);
        }
    }
    search.visit(ground);
    search.tree
}
