//! Elmore delay on RC trees.
//!
//! Two passes, both rooted at a driver node:
//!
//! 1. [`downstream_capacitance`] runs on the full graph and, in post-order,
//!    totals the capacitance "below" each node. A resistor is transparent (it
//!    forwards whatever lies beyond it); a capacitor is a load and stops there.
//! 2. [`elmore_delays`] runs on the resistor-only view and accumulates
//!    `R * C_downstream` along tree edges from the root.
//!
//! Downstream direction is relative to the root, so moving the root means
//! rerunning both passes. Resistor loops are not handled: only tree edges
//! contribute, and the results on a looped network are wrong. Pass 2 logs a
//! warning when it sees one.

use crate::units::{Capacitance, Delay};

use super::component::Component;
use super::filter::ResistorView;
use super::graph::{CircuitGraph, CircuitTopology, NodeId};
use super::traversal::depth_first;

/// Pass 1 output: capacitance at and beyond every node reached from `root`.
#[derive(Debug, Clone)]
pub struct DownstreamCapacitance {
    root: NodeId,
    values: Vec<Option<Capacitance>>,
}

impl DownstreamCapacitance {
    /// Node the table was computed from.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Downstream capacitance of `node`; `None` if the traversal never
    /// reached it.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<Capacitance> {
        self.values[node.index()]
    }

    /// Number of node slots (equals the graph's node count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a table with no node slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(node, capacitance)` for every reached node, by node index.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Capacitance)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (NodeId::from_index(i), c)))
    }
}

/// Pass 2 output: Elmore delay from the root to every resistively reached node.
#[derive(Debug, Clone)]
pub struct DelayTable {
    root: NodeId,
    values: Vec<Option<Delay>>,
}

impl DelayTable {
    /// Node the delays are measured from.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Delay to `node`; `None` if no resistive path from the root reached it.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<Delay> {
        self.values[node.index()]
    }

    /// `(node, delay)` for every reached node, by node index.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Delay)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (NodeId::from_index(i), d)))
    }
}

/// Both Elmore tables for one root.
#[derive(Debug, Clone)]
pub struct ElmoreReport {
    /// Pass 1 result.
    pub downstream: DownstreamCapacitance,
    /// Pass 2 result.
    pub delays: DelayTable,
}

/// Pass 1: downstream capacitance of every node reachable from `root`.
///
/// On finishing node `u`, sums over its outgoing branches whose far end was
/// first reached from `u`, or is ground: a capacitor contributes its own
/// value, a resistor contributes the far end's downstream total.
///
/// # Panics
/// If `root` does not belong to `graph`.
#[must_use]
pub fn downstream_capacitance(graph: &CircuitGraph, root: NodeId) -> DownstreamCapacitance {
    let _span = tracing::debug_span!("downstream_capacitance", root = %root).entered();
    let tree = depth_first(graph, root);
    let ground = graph.ground();
    let mut values: Vec<Option<Capacitance>> = vec![None; graph.node_count()];

    for &u in tree.finish_order() {
        let mut total = Capacitance::zero();
        for id in graph.outgoing_branches(u) {
            let v = graph.branch(id).opposite(u);
            if tree.predecessor(v) != Some(u) && v != ground {
                continue;
            }
            total += match *graph.component(id) {
                Component::Resistor(_) => values[v.index()].unwrap_or_default(),
                Component::Capacitor(c) => c,
            };
        }
        values[u.index()] = Some(total);
    }

    tracing::debug!(
        reached = tree.finish_order().len(),
        total = %values[root.index()].unwrap_or_default(),
        "downstream capacitance summed"
    );
    DownstreamCapacitance { root, values }
}

/// Pass 2: Elmore delays over the resistor-only view, using a Pass 1 table
/// computed on the same graph. The root is taken from `downstream`.
///
/// # Panics
/// If `downstream` was computed on a graph of a different size.
#[must_use]
pub fn elmore_delays(view: &ResistorView<'_>, downstream: &DownstreamCapacitance) -> DelayTable {
    assert_eq!(
        view.node_count(),
        downstream.len(),
        "downstream table does not match this graph"
    );
    let root = downstream.root();
    let _span = tracing::debug_span!("elmore_delays", root = %root).entered();
    let tree = depth_first(view, root);

    let mut values: Vec<Option<Delay>> = vec![None; view.node_count()];
    values[root.index()] = Some(Delay::zero());

    for edge in tree.tree_edges() {
        let resistance = match *view.component(edge.branch) {
            Component::Resistor(r) => r,
            Component::Capacitor(_) => {
                unreachable!("capacitor branch {:?} in resistor-only traversal", edge.branch)
            }
        };
        let upstream = values[edge.source.index()].unwrap_or_default();
        let load = downstream.get(edge.target).unwrap_or_default();
        values[edge.target.index()] = Some(upstream + resistance * load);
    }

    if !tree.back_edges().is_empty() {
        tracing::warn!(
            loops = tree.back_edges().len(),
            "resistor loop reachable from {}; Elmore delays are not valid for it",
            view.node_name(root)
        );
    }
    DelayTable { root, values }
}

/// Runs both passes from `root`.
///
/// # Panics
/// If `root` does not belong to `graph`.
#[must_use]
pub fn elmore(graph: &CircuitGraph, root: NodeId) -> ElmoreReport {
    let _span = tracing::info_span!("elmore", root = graph.node_name(root)).entered();
    let downstream = downstream_capacitance(graph, root);
    let delays = elmore_delays(&graph.resistors_only(), &downstream);
    ElmoreReport { downstream, delays }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::constants::{FEMTO, KILO};

    #[test]
    fn single_rc_delay_is_rc() {
        let mut g = CircuitGraph::new();
        let gnd = g.ground();
        let drv = g.add_node("drv");
        let n = g.add_node("n");
        g.add_branch(drv, n, Component::resistor(1.0 * KILO));
        g.add_branch(n, gnd, Component::capacitor(100.0 * FEMTO));

        let report = elmore(&g, drv);
        assert_relative_eq!(report.delays.get(drv).unwrap().value(), 0.0);
        assert_relative_eq!(report.delays.get(n).unwrap().value(), 1.0e-10, max_relative = 1e-12);
        assert_relative_eq!(report.downstream.get(drv).unwrap().value(), 100.0 * FEMTO);
    }

    #[test]
    fn leaf_downstream_is_sum_of_its_capacitors() {
        let mut g = CircuitGraph::new();
        let gnd = g.ground();
        let a = g.add_node("a");
        let leaf = g.add_node("leaf");
        g.add_branch(a, leaf, Component::resistor(10.0));
        g.add_branch(leaf, gnd, Component::capacitor(3.0 * FEMTO));
        g.add_branch(leaf, gnd, Component::capacitor(4.0 * FEMTO));

        let table = downstream_capacitance(&g, a);
        assert_relative_eq!(table.get(leaf).unwrap().value(), 7.0 * FEMTO, max_relative = 1e-12);
        assert_eq!(table.get(gnd).map(|c| c.value()), Some(0.0));
    }

    #[test]
    fn branching_tree_matches_hand_calculation() {
        // drv -R1- a -R2- b (C_b)
        //          |
        //          +-R3- c (C_c), plus C_a on a
        let mut g = CircuitGraph::new();
        let gnd = g.ground();
        let drv = g.add_node("drv");
        let a = g.add_node("a");
        let b = g.add_node("b");
        let c = g.add_node("c");
        g.add_branch(drv, a, Component::resistor(100.0));
        g.add_branch(a, b, Component::resistor(200.0));
        g.add_branch(a, c, Component::resistor(300.0));
        g.add_branch(a, gnd, Component::capacitor(1.0 * FEMTO));
        g.add_branch(b, gnd, Component::capacitor(2.0 * FEMTO));
        g.add_branch(c, gnd, Component::capacitor(3.0 * FEMTO));

        let report = elmore(&g, drv);
        let d = |n| report.delays.get(n).unwrap().value();
        let t_a = 100.0 * 6.0 * FEMTO;
        assert_relative_eq!(d(a), t_a, max_relative = 1e-12);
        assert_relative_eq!(d(b), t_a + 200.0 * 2.0 * FEMTO, max_relative = 1e-12);
        assert_relative_eq!(d(c), t_a + 300.0 * 3.0 * FEMTO, max_relative = 1e-12);
    }

    #[test]
    fn delay_never_decreases_away_from_root() {
        let mut g = CircuitGraph::new();
        let gnd = g.ground();
        let mut prev = g.add_node("drv");
        let root = prev;
        for i in 0..20 {
            let n = g.add_node(format!("n{i}"));
            g.add_branch(prev, n, Component::resistor(10.0 + i as f64));
            g.add_branch(n, gnd, Component::capacitor((1.0 + (i % 3) as f64) * FEMTO));
            prev = n;
        }
        let report = elmore(&g, root);
        let view = g.resistors_only();
        let tree = depth_first(&view, root);
        for edge in tree.tree_edges() {
            let up = report.delays.get(edge.source).unwrap();
            let down = report.delays.get(edge.target).unwrap();
            assert!(down >= up);
        }
    }

    #[test]
    fn changing_root_requires_fresh_passes() {
        let mut g = CircuitGraph::new();
        let gnd = g.ground();
        let left = g.add_node("left");
        let right = g.add_node("right");
        g.add_branch(left, right, Component::resistor(1.0 * KILO));
        g.add_branch(left, gnd, Component::capacitor(10.0 * FEMTO));
        g.add_branch(right, gnd, Component::capacitor(30.0 * FEMTO));

        let from_left = elmore(&g, left);
        let from_right = elmore(&g, right);
        let delay_right = from_left.delays.get(right).unwrap().value();
        let delay_left = from_right.delays.get(left).unwrap().value();
        assert_relative_eq!(delay_right, 30.0e-12, max_relative = 1e-12);
        assert_relative_eq!(delay_left, 10.0e-12, max_relative = 1e-12);
    }

    #[test]
    fn capacitor_isolated_node_has_no_delay() {
        let mut g = CircuitGraph::new();
        let drv = g.add_node("drv");
        let n = g.add_node("n");
        let island = g.add_node("island");
        g.add_branch(drv, n, Component::resistor(50.0));
        g.add_branch(n, island, Component::capacitor(5.0 * FEMTO));

        let report = elmore(&g, drv);
        assert!(report.downstream.get(island).is_some());
        assert!(report.delays.get(island).is_none());
        let delay = report.delays.get(n).unwrap().value();
        assert_relative_eq!(delay, 50.0 * 5.0 * FEMTO, max_relative = 1e-12);
    }
}
