//! Core reusable components.
//!
//! `compute` holds the alphabet and the lane abstraction, `stats` the
//! scoring systems and their statistics, `alignment` the DP kernels.

pub mod alignment;
pub mod compute;
pub mod sequence;
pub mod stats;
