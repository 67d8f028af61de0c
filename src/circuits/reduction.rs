//! Moment matching and algebraic-state elimination for MNA systems.
//!
//! [`regularize`] removes the states whose rows of C are entirely zero (node
//! voltages with no capacitance, source and inductor-free currents) by a
//! Schur complement on G, leaving a system whose C can be inverted.
//! [`compute_moments`] gives the transfer-function moments that the reduced
//! and unreduced systems must share.

use thiserror::Error;

use crate::math::{is_singular, zero_rows, Matrix, Scalar};

use super::stamp::MnaSystem;

/// Largest feedthrough entry treated as zero after elimination.
pub const FEEDTHROUGH_TOLERANCE: Scalar = 1.0e-12;

/// Failures of the moment and regularization routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReductionError {
    /// G has no inverse, so moments are undefined.
    #[error("conductance matrix is singular")]
    SingularConductance,
    /// The algebraic states have no unique solution.
    #[error("algebraic block G22 ({size}x{size}) is singular")]
    SingularAlgebraicBlock {
        /// Number of algebraic states.
        size: usize,
    },
    /// Eliminating the algebraic states would need a direct input-to-output
    /// term, which the reduced model does not carry.
    #[error("elimination introduces a feedthrough term (max |D| = {magnitude:e})")]
    FeedthroughRequired {
        /// Largest absolute entry of the feedthrough matrix.
        magnitude: Scalar,
    },
    /// Matrix shapes do not describe one system.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

fn check_shapes(
    g: &Matrix,
    c: &Matrix,
    b: &Matrix,
    l: &Matrix,
    e: &Matrix,
) -> Result<(), ReductionError> {
    let n = g.nrows();
    let mismatch = |what: &str| Err(ReductionError::DimensionMismatch(what.to_owned()));
    if !g.is_square() {
        return mismatch("G is not square");
    }
    if c.shape() != (n, n) {
        return mismatch("C does not match G");
    }
    if b.nrows() != n || l.nrows() != n {
        return mismatch("B and L need one row per state");
    }
    if e.shape() != (l.ncols(), b.ncols()) {
        return mismatch("E must be outputs x inputs");
    }
    Ok(())
}

/// First `count` moments of `H(s) = Lᵀ(G + sC)⁻¹B + E` about `s = 0`.
///
/// With `A = -G⁻¹C` and `R = G⁻¹B`, moment 0 is `LᵀR + E` and moment `k` is
/// `LᵀAᵏR`. Each moment is `outputs × inputs`.
pub fn compute_moments(
    g: &Matrix,
    c: &Matrix,
    b: &Matrix,
    l: &Matrix,
    e: &Matrix,
    count: usize,
) -> Result<Vec<Matrix>, ReductionError> {
    check_shapes(g, c, b, l, e)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    if is_singular(g) {
        return Err(ReductionError::SingularConductance);
    }

    let lu = g.clone().full_piv_lu();
    let a = -lu.solve(c).ok_or(ReductionError::SingularConductance)?;
    let mut x = lu.solve(b).ok_or(ReductionError::SingularConductance)?;
    let lt = l.transpose();

    let mut moments = Vec::with_capacity(count);
    moments.push(&lt * &x + e);
    for _ in 1..count {
        x = &a * &x;
        moments.push(&lt * &x);
    }
    Ok(moments)
}

impl MnaSystem {
    /// See [`compute_moments`].
    pub fn moments(&self, count: usize) -> Result<Vec<Matrix>, ReductionError> {
        compute_moments(&self.g, &self.c, &self.b, &self.l, &self.e, count)
    }
}

/// A system with its algebraic states eliminated.
#[derive(Debug, Clone)]
pub struct Regularization {
    /// Reduced system over the dynamic states, in their original relative
    /// order.
    pub system: MnaSystem,
    /// Stable partition of the original state indices: dynamic states first,
    /// then algebraic ones.
    pub order: Vec<usize>,
    /// Number of dynamic (kept) states.
    pub dynamic_count: usize,
}

impl Regularization {
    /// Original indices of the states that survive.
    #[must_use]
    pub fn dynamic_states(&self) -> &[usize] {
        &self.order[..self.dynamic_count]
    }

    /// Original indices of the eliminated states.
    #[must_use]
    pub fn algebraic_states(&self) -> &[usize] {
        &self.order[self.dynamic_count..]
    }
}

fn block(m: &Matrix, rows: &[usize], cols: &[usize]) -> Matrix {
    m.select_rows(rows).select_columns(cols)
}

/// Eliminates every state whose row of C is entirely zero.
///
/// With the states split into dynamic (1) and algebraic (2) blocks:
///
/// ```text
/// G' = G11 - G12·G22⁻¹·G21
/// B' = B1  - G12·G22⁻¹·B2
/// L' = L1  - (G22⁻¹·G21)ᵀ·L2
/// C' = C11
/// ```
///
/// C is taken to be symmetric, so its dynamic-to-algebraic block is zero
/// along with the algebraic rows. A system with no algebraic rows comes back
/// unchanged with the identity order. A non-zero `E` is rejected, since the
/// reduced model has no feedthrough.
pub fn regularize(system: &MnaSystem) -> Result<Regularization, ReductionError> {
    let MnaSystem { g, c, b, l, e } = system;
    check_shapes(g, c, b, l, e)?;
    let given = if e.is_empty() { 0.0 } else { e.amax() };
    if given > FEEDTHROUGH_TOLERANCE {
        return Err(ReductionError::FeedthroughRequired { magnitude: given });
    }
    let n = system.state_count();
    let algebraic = zero_rows(c);
    let order: Vec<usize> = (0..n)
        .filter(|&i| !algebraic[i])
        .chain((0..n).filter(|&i| algebraic[i]))
        .collect();
    let dynamic_count = algebraic.iter().filter(|&&z| !z).count();
    let _span = tracing::debug_span!(
        "regularize",
        states = n,
        algebraic = n - dynamic_count
    )
    .entered();

    if dynamic_count == n {
        tracing::warn!("no algebraic states; system unchanged");
        return Ok(Regularization {
            system: system.clone(),
            order,
            dynamic_count,
        });
    }

    let (dynamic, alg) = order.split_at(dynamic_count);
    let g22 = block(g, alg, alg);
    if is_singular(&g22) {
        return Err(ReductionError::SingularAlgebraicBlock { size: alg.len() });
    }
    let c12 = block(c, dynamic, alg);
    if c12.iter().any(|&v| v != 0.0) {
        tracing::warn!("C couples dynamic to algebraic states; those terms are dropped");
    }

    let g11 = block(g, dynamic, dynamic);
    let g12 = block(g, dynamic, alg);
    let g21 = block(g, alg, dynamic);
    let b1 = b.select_rows(dynamic);
    let b2 = b.select_rows(alg);
    let l1 = l.select_rows(dynamic);
    let l2 = l.select_rows(alg);

    let lu = g22.full_piv_lu();
    let solve = |rhs: &Matrix| {
        lu.solve(rhs)
            .ok_or(ReductionError::SingularAlgebraicBlock { size: alg.len() })
    };
    let g22_inv_g21 = solve(&g21)?;
    let g22_inv_b2 = solve(&b2)?;

    let feedthrough = l2.transpose() * &g22_inv_b2;
    let magnitude = if feedthrough.is_empty() {
        0.0
    } else {
        feedthrough.amax()
    };
    if magnitude > FEEDTHROUGH_TOLERANCE {
        return Err(ReductionError::FeedthroughRequired { magnitude });
    }

    let reduced = MnaSystem::new(
        g11 - &g12 * &g22_inv_g21,
        block(c, dynamic, dynamic),
        b1 - &g12 * &g22_inv_b2,
        l1 - g22_inv_g21.transpose() * &l2,
        e.clone(),
    );
    tracing::debug!(dynamic = dynamic_count, "algebraic states eliminated");
    Ok(Regularization {
        system: reduced,
        order,
        dynamic_count,
    })
}
