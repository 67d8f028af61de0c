//! MNA stamping for RC(L) interconnect (dense prototype).
//!
//! The assembled system is `G·x + C·dx/dt = B·u`, `y = Lᵀ·x + E·u`. State
//! variables are the non-ground node voltages followed by one current per
//! voltage input or inductor.

use nalgebra::DMatrix;

use crate::math::{Matrix, Scalar};

use super::component::Component;
use super::graph::{CircuitGraph, CircuitTopology, NodeId};

/// State row of a node; ground is represented by `None`.
pub type Node = Option<usize>;

/// Stamps a two-terminal conductance `g` between state rows `i` and `j`.
pub fn stamp_conductance(m: &mut Matrix, i: usize, j: usize, g: Scalar) {
    m[(i, i)] += g;
    m[(j, j)] += g;
    m[(i, j)] -= g;
    m[(j, i)] -= g;
}

/// Stamps a conductance `g` from row `i` to the implicit ground terminal.
pub fn stamp_to_ground(m: &mut Matrix, i: usize, g: Scalar) {
    m[(i, i)] += g;
}

/// Marks a branch current that is itself a state variable: the current in
/// `current_row` is taken into the element at `node_row`.
pub fn stamp_current_variable(m: &mut Matrix, node_row: usize, current_row: usize) {
    m[(node_row, current_row)] = 1.0;
    m[(current_row, node_row)] = -1.0;
}

/// Stamps `g` between two nodes either of which may be ground.
fn stamp_between(m: &mut Matrix, a: Node, b: Node, g: Scalar) {
    match (a, b) {
        (Some(i), Some(j)) => stamp_conductance(m, i, j, g),
        (Some(i), None) | (None, Some(i)) => stamp_to_ground(m, i, g),
        (None, None) => {}
    }
}

fn take(m: &mut Matrix) -> Matrix {
    std::mem::replace(m, DMatrix::zeros(0, 0))
}

/// Assembled MNA matrices. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MnaSystem {
    /// Conductance and incidence stamps, `n × n`.
    pub g: Matrix,
    /// Capacitance (and inductance) stamps, `n × n`.
    pub c: Matrix,
    /// Input selector, `n × inputs`.
    pub b: Matrix,
    /// Output selector, `n × outputs`.
    pub l: Matrix,
    /// Direct feedthrough, `outputs × inputs`.
    pub e: Matrix,
}

impl MnaSystem {
    /// Wraps raw matrices, checking that their shapes agree.
    ///
    /// # Panics
    /// If the shapes are inconsistent.
    #[must_use]
    pub fn new(g: Matrix, c: Matrix, b: Matrix, l: Matrix, e: Matrix) -> Self {
        let n = g.nrows();
        assert!(g.is_square(), "G must be square");
        assert_eq!(c.shape(), (n, n), "C must match G");
        assert_eq!(b.nrows(), n, "B must have one row per state");
        assert_eq!(l.nrows(), n, "L must have one row per state");
        assert_eq!(e.shape(), (l.ncols(), b.ncols()), "E must be outputs x inputs");
        Self { g, c, b, l, e }
    }

    /// Number of state variables.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.g.nrows()
    }

    /// Number of inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.b.ncols()
    }

    /// Number of outputs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.l.ncols()
    }
}

/// Incremental builder for an [`MnaSystem`].
///
/// Node rows are fixed at construction; every voltage input or inductor
/// appends one current row after them.
#[derive(Debug, Clone)]
pub struct MnaBuilder {
    n: usize,
    m: usize,
    g: Matrix,
    c: Matrix,
    b: Matrix,
    l: Matrix,
}

impl MnaBuilder {
    /// Creates a builder with `node_count` non-ground nodes.
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            n: node_count,
            m: 0,
            g: DMatrix::zeros(node_count, node_count),
            c: DMatrix::zeros(node_count, node_count),
            b: DMatrix::zeros(node_count, 0),
            l: DMatrix::zeros(node_count, 0),
        }
    }

    fn push_state(&mut self) -> usize {
        let row = self.n + self.m;
        self.m += 1;
        let size = row + 1;
        self.g.resize_mut(size, size, 0.0);
        self.c.resize_mut(size, size, 0.0);
        self.b = take(&mut self.b).insert_row(row, 0.0);
        self.l = take(&mut self.l).insert_row(row, 0.0);
        row
    }

    fn check(&self, node: Node) {
        if let Some(i) = node {
            assert!(i < self.n, "node row {i} out of range ({} nodes)", self.n);
        }
    }

    /// Stamps a resistor `r` (ohms) between `a` and `b`.
    pub fn stamp_resistor(&mut self, a: Node, b: Node, r: Scalar) {
        self.check(a);
        self.check(b);
        stamp_between(&mut self.g, a, b, 1.0 / r);
    }

    /// Stamps a capacitor `cval` (farads) between `a` and `b`.
    pub fn stamp_capacitor(&mut self, a: Node, b: Node, cval: Scalar) {
        self.check(a);
        self.check(b);
        stamp_between(&mut self.c, a, b, cval);
    }

    /// Stamps an inductor `lval` (henries) from `a` to `b`, adding its current
    /// as a state. Returns the state row of that current.
    pub fn stamp_inductor(&mut self, a: Node, b: Node, lval: Scalar) -> usize {
        self.check(a);
        self.check(b);
        let row = self.push_state();
        if let Some(i) = a {
            stamp_current_variable(&mut self.g, i, row);
        }
        if let Some(j) = b {
            self.g[(j, row)] = -1.0;
            self.g[(row, j)] = 1.0;
        }
        self.c[(row, row)] += lval;
        row
    }

    /// Drives `node` with an ideal voltage input. Adds a current state and an
    /// input column; returns the input index.
    pub fn add_voltage_input(&mut self, node: usize) -> usize {
        self.check(Some(node));
        let row = self.push_state();
        stamp_current_variable(&mut self.g, node, row);
        let input = self.b.ncols();
        self.b = take(&mut self.b).insert_column(input, 0.0);
        self.b[(row, input)] = -1.0;
        input
    }

    /// Observes the voltage of `node` as a new output; returns its index.
    pub fn add_output(&mut self, node: usize) -> usize {
        self.check(Some(node));
        let output = self.l.ncols();
        self.l = take(&mut self.l).insert_column(output, 0.0);
        self.l[(node, output)] = 1.0;
        output
    }

    /// Returns `(node_count, current_state_count)`.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.n, self.m)
    }

    /// Finalizes the builder. Feedthrough is zero.
    #[must_use]
    pub fn build(self) -> MnaSystem {
        let e = DMatrix::zeros(self.l.ncols(), self.b.ncols());
        MnaSystem::new(self.g, self.c, self.b, self.l, e)
    }

    /// Assembles a circuit graph. Non-ground nodes take state rows in
    /// insertion order; each driver gets a voltage input (in the order given)
    /// and each observed node an output.
    ///
    /// # Panics
    /// If a driver or observed node is ground or foreign to `graph`.
    #[must_use]
    pub fn from_graph(graph: &CircuitGraph, drivers: &[NodeId], observed: &[NodeId]) -> MnaSystem {
        let _span = tracing::debug_span!(
            "mna_from_graph",
            nodes = graph.node_count(),
            branches = graph.branch_count()
        )
        .entered();
        let rows = GraphRows::new(graph);
        let mut builder = Self::new(rows.count);
        for id in graph.branch_ids() {
            let (a, b) = graph.branch(id).endpoints();
            let (a, b) = (rows.row(a), rows.row(b));
            match *graph.component(id) {
                Component::Resistor(r) => builder.stamp_resistor(a, b, r.value()),
                Component::Capacitor(c) => builder.stamp_capacitor(a, b, c.value()),
            }
        }
        for &d in drivers {
            builder.add_voltage_input(rows.required(d, graph));
        }
        for &o in observed {
            builder.add_output(rows.required(o, graph));
        }
        tracing::debug!(
            states = rows.count + drivers.len(),
            inputs = drivers.len(),
            outputs = observed.len(),
            "assembled MNA system"
        );
        builder.build()
    }
}

/// Maps graph nodes to state rows, skipping ground.
struct GraphRows {
    rows: Vec<Node>,
    count: usize,
}

impl GraphRows {
    fn new(graph: &CircuitGraph) -> Self {
        let ground = graph.ground();
        let mut count = 0;
        let rows = graph
            .nodes()
            .map(|n| {
                (n != ground).then(|| {
                    count += 1;
                    count - 1
                })
            })
            .collect();
        Self { rows, count }
    }

    fn row(&self, node: NodeId) -> Node {
        self.rows[node.index()]
    }

    fn required(&self, node: NodeId, graph: &CircuitGraph) -> usize {
        self.row(node)
            .unwrap_or_else(|| panic!("{} is ground and has no state row", graph.node_name(node)))
    }
}
