//! Compute backends: residue encoding and the score-lane engines the
//! alignment kernels run on.

pub mod encoding;
pub mod simd_abstraction;
