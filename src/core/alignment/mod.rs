//! Core alignment kernels - vectorized banded Smith-Waterman.
//!
//! These modules hold the DP machinery: score profiles, the per-cell
//! recurrences, the sweeps that drive them over lane vectors, and the scalar
//! traceback pass.

pub mod cell_update;
pub mod extent;
pub mod profile;
pub mod swipe;
pub mod traceback;
pub mod types;
pub mod workspace; // Thread-local buffer pools for allocation reuse
