// src/defaults.rs

// Gap Costs (BLAST convention: a gap of length k costs GAP_OPEN + k * GAP_EXTEND)
pub const GAP_OPEN: i32 = 11;
pub const GAP_EXTEND: i32 = 1;
pub const FRAME_SHIFT: i32 = 15;

// Reporting
pub const MIN_SCORE: i32 = 1;
pub const DB_LETTERS: u64 = 0;
pub const DB_SEQUENCES: u64 = 0;

// Composition-Based Statistics
pub const CBS_ERR_TOLERANCE: f64 = 0.00001;
pub const CBS_ITERATION_LIMIT: usize = 2000;
pub const RELATIVE_ENTROPY_TARGET: f64 = 0.44;
pub const CBS_PSEUDOCOUNTS: f64 = 20.0;
pub const BIAS_WINDOW: usize = 40;

// Driver
/// Intra-target packing is considered once a band is at least this many lanes wide.
pub const INTRA_TARGET_MIN_BAND_LANES: usize = 1;
/// Targets per rayon task in `swipe_par`.
pub const PAR_CHUNK_SIZE: usize = 64;
