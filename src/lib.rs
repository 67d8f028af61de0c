#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// SI prefixes and value parsing.
pub mod constants;
/// Strongly typed resistance, capacitance and delay.
pub mod units;
/// Shared matrix aliases and numerical tests.
pub mod math;
/// Circuit graph, Elmore delay and MNA reduction.
pub mod circuits;
/// State-space view of a regularized MNA system.
pub mod state_space;
/// Fixed-step transient simulation and waveform output.
pub mod simulation;
/// Error types shared between modules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;
