//! RC interconnect circuits: graph model, Elmore delay and MNA reduction.

/// Resistor and capacitor branch payloads.
pub mod component;
/// Circuit graph with a distinguished ground node.
pub mod graph;
/// Resistor-only projection of a circuit graph.
pub mod filter;
/// Depth-first search returning its results as data.
pub mod traversal;
/// Two-pass Elmore delay.
pub mod elmore;
/// Floating-node and resistor-loop checks.
pub mod connectivity;
/// MNA stamping and assembly.
pub mod stamp;
/// Moments and elimination of algebraic states.
pub mod reduction;

pub use component::{Component, ComponentKind};
pub use connectivity::{floating_nodes, resistor_loops, ResistorLoop};
pub use elmore::{
    downstream_capacitance, elmore, elmore_delays, DelayTable, DownstreamCapacitance, ElmoreReport,
};
pub use filter::ResistorView;
pub use graph::{BranchId, CircuitGraph, CircuitTopology, EdgeRecord, NodeId};
pub use reduction::{compute_moments, regularize, ReductionError, Regularization};
pub use stamp::{MnaBuilder, MnaSystem};
