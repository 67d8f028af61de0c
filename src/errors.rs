//! Shared error types used across submodules.

use thiserror::Error;

use crate::circuits::reduction::ReductionError;
use crate::simulation::SimulationError;
use crate::state_space::StateSpaceError;

/// Top-level error type for the crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterconnectError {
    /// Wraps moment and regularization errors.
    #[error(transparent)]
    Reduction(#[from] ReductionError),
    /// Wraps state-space construction errors.
    #[error(transparent)]
    StateSpace(#[from] StateSpaceError),
    /// Wraps simulation-related errors.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}
