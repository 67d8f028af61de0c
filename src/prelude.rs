//! Convenience re-exports for building and analyzing RC interconnect.

pub use crate::circuits::{
    component::{Component, ComponentKind},
    connectivity::{floating_nodes, resistive_components, resistor_loops, ResistorLoop},
    elmore::{elmore, DelayTable, DownstreamCapacitance, ElmoreReport},
    graph::{CircuitGraph, CircuitTopology, EdgeRecord, NodeId, BranchId},
    reduction::{compute_moments, regularize, ReductionError, Regularization},
    stamp::{MnaBuilder, MnaSystem},
};
pub use crate::constants::*;
pub use crate::errors::InterconnectError;
pub use crate::math::{Matrix, Scalar, Vector};
pub use crate::simulation::{
    write_transient_csv, write_transient_output_csv, SimulationConfig, SimulationEngine,
    SimulationError, StateSpaceEngine, TimeIntegrator, TransientWaveform,
};
pub use crate::state_space::{StateSpaceError, StateSpaceModel};
pub use crate::units::{Capacitance, Delay, Quantity, Resistance, Unit};
