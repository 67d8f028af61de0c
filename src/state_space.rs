//! State-space adapter for a regularized MNA system.
//!
//! Rewrites `G·x + C·dx/dt = B·u`, `y = Lᵀ·x` as
//!
//! ```text
//! dx/dt = drift·x + input·u      drift = C⁻¹·(−G), input = C⁻¹·B
//! y     = output·x               output = Lᵀ
//! ```
//!
//! The adapter does no time stepping; it hands [`StateSpaceModel::derivative`]
//! and [`StateSpaceModel::output`] to whatever integrator drives it.

use thiserror::Error;

use crate::circuits::reduction::Regularization;
use crate::circuits::stamp::MnaSystem;
use crate::math::{can_ldlt_decompose, is_singular, Matrix, Scalar, Vector};

/// Failures building a [`StateSpaceModel`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateSpaceError {
    /// C has complex eigenvalues or eigenvalues of both signs.
    #[error("capacitance matrix is not real semidefinite")]
    NotSemidefinite,
    /// C cannot be inverted; regularize the system first.
    #[error("capacitance matrix is singular")]
    SingularCapacitance,
    /// The system has a direct input-to-output term, which the model does
    /// not carry.
    #[error("feedthrough is not supported (max |E| = {magnitude:e})")]
    FeedthroughUnsupported {
        /// Largest absolute entry of `E`.
        magnitude: Scalar,
    },
    /// Matrix shapes do not describe one system.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// `C⁻¹·rhs`, trying Cholesky on `C` and on `-C` before a general LU.
fn solve_capacitance(c: &Matrix, rhs: &Matrix) -> Option<Matrix> {
    if let Some(chol) = c.clone().cholesky() {
        tracing::trace!("capacitance factored by Cholesky");
        return Some(chol.solve(rhs));
    }
    if let Some(chol) = (-c).cholesky() {
        tracing::trace!("negated capacitance factored by Cholesky");
        return Some(-chol.solve(rhs));
    }
    tracing::debug!("Cholesky failed; falling back to LU");
    c.clone().lu().solve(rhs)
}

/// Linear time-invariant model `(drift, input, output)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceModel {
    drift: Matrix,
    input: Matrix,
    output: Matrix,
}

impl StateSpaceModel {
    /// Builds the model from raw `G`, `C`, `B`, `L`.
    pub fn from_matrices(
        g: &Matrix,
        c: &Matrix,
        b: &Matrix,
        l: &Matrix,
    ) -> Result<Self, StateSpaceError> {
        let n = g.nrows();
        if !g.is_square() || c.shape() != (n, n) || b.nrows() != n || l.nrows() != n {
            return Err(StateSpaceError::DimensionMismatch(format!(
                "G {:?}, C {:?}, B {:?}, L {:?}",
                g.shape(),
                c.shape(),
                b.shape(),
                l.shape()
            )));
        }
        if !can_ldlt_decompose(c) {
            return Err(StateSpaceError::NotSemidefinite);
        }
        if is_singular(c) {
            return Err(StateSpaceError::SingularCapacitance);
        }

        let drift = solve_capacitance(c, &(-g)).ok_or(StateSpaceError::SingularCapacitance)?;
        let input = solve_capacitance(c, b).ok_or(StateSpaceError::SingularCapacitance)?;
        tracing::debug!(
            states = n,
            inputs = b.ncols(),
            outputs = l.ncols(),
            "state-space model built"
        );
        Ok(Self {
            drift,
            input,
            output: l.transpose(),
        })
    }

    /// Builds the model from an MNA system whose C is invertible. The
    /// feedthrough `E` is not carried and must be zero.
    pub fn new(system: &MnaSystem) -> Result<Self, StateSpaceError> {
        let magnitude = if system.e.is_empty() {
            0.0
        } else {
            system.e.amax()
        };
        if magnitude > 0.0 {
            return Err(StateSpaceError::FeedthroughUnsupported { magnitude });
        }
        Self::from_matrices(&system.g, &system.c, &system.b, &system.l)
    }

    /// Builds the model from the output of
    /// [`regularize`](crate::circuits::reduction::regularize).
    pub fn from_regularization(reduced: &Regularization) -> Result<Self, StateSpaceError> {
        Self::new(&reduced.system)
    }

    /// `C⁻¹·(−G)`.
    #[must_use]
    pub fn drift(&self) -> &Matrix {
        &self.drift
    }

    /// `C⁻¹·B`.
    #[must_use]
    pub fn input(&self) -> &Matrix {
        &self.input
    }

    /// `Lᵀ`.
    #[must_use]
    pub fn output_matrix(&self) -> &Matrix {
        &self.output
    }

    /// Number of states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.drift.nrows()
    }

    /// Number of inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input.ncols()
    }

    /// Number of outputs.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.output.nrows()
    }

    /// `dx/dt = drift·state + input·inputs`.
    ///
    /// # Panics
    /// If `state` or `inputs` has the wrong length.
    #[must_use]
    pub fn derivative(&self, state: &Vector, inputs: &Vector) -> Vector {
        &self.drift * state + &self.input * inputs
    }

    /// `y = output·state`.
    ///
    /// # Panics
    /// If `state` has the wrong length.
    #[must_use]
    pub fn output(&self, state: &Vector) -> Vector {
        &self.output * state
    }
}
