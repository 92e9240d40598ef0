// src/dp_opt.rs
//
// Options for the SWIPE driver and the composition statistics.

use crate::core::compute::simd_abstraction::{LaneWidth, SimdEngineType};
use crate::core::stats::evalue::EvalueMode;
use crate::defaults;

/// How targets are spread across lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackingPolicy {
    /// Inter-target unless a group would leave most lanes idle.
    #[default]
    Auto,
    /// One target per lane.
    InterTarget,
    /// Adjacent diagonals of one target per lane.
    IntraTarget,
}

/// Driver options. Every invocation reads its own immutable copy.
#[derive(Debug, Clone)]
pub struct DpOpt {
    // Gap costs
    pub gap_open: i32,    // Cost to open a gap (charged once per gap)
    pub gap_extend: i32,  // Cost per gap position
    pub frame_shift: i32, // Penalty per frame shift in translated alignment

    // Reporting
    pub min_score: i32,     // Report targets whose best score is >= this
    pub db_letters: u64,    // Database size for e-values (0: pairwise)
    pub db_sequences: u64,  // Sequences in the database
    pub evalue_mode: EvalueMode,

    // Execution
    pub engine: Option<SimdEngineType>, // None: detect at call time
    pub packing: PackingPolicy,
    pub initial_width: LaneWidth, // First rung of the 8 -> 16 -> 32 ladder
    pub intra_target_min_band_lanes: usize,

    pub cbs: CbsParams,
}

/// Composition-based statistics parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CbsParams {
    pub err_tolerance: f64,
    pub iteration_limit: usize,
    /// Relative entropy held during target frequency optimization; `None`
    /// fits the marginals only.
    pub relative_entropy: Option<f64>,
    pub pseudocounts: f64,
    pub bias_window: usize,
}

impl Default for CbsParams {
    fn default() -> Self {
        Self {
            err_tolerance: defaults::CBS_ERR_TOLERANCE,
            iteration_limit: defaults::CBS_ITERATION_LIMIT,
            relative_entropy: Some(defaults::RELATIVE_ENTROPY_TARGET),
            pseudocounts: defaults::CBS_PSEUDOCOUNTS,
            bias_window: defaults::BIAS_WINDOW,
        }
    }
}

impl Default for DpOpt {
    fn default() -> Self {
        DpOpt {
            gap_open: defaults::GAP_OPEN,
            gap_extend: defaults::GAP_EXTEND,
            frame_shift: defaults::FRAME_SHIFT,

            min_score: defaults::MIN_SCORE,
            db_letters: defaults::DB_LETTERS,
            db_sequences: defaults::DB_SEQUENCES,
            evalue_mode: EvalueMode::Fast,

            engine: None,
            packing: PackingPolicy::Auto,
            initial_width: LaneWidth::W8,
            intra_target_min_band_lanes: defaults::INTRA_TARGET_MIN_BAND_LANES,

            cbs: CbsParams::default(),
        }
    }
}

impl DpOpt {
    /// Cost of a one-residue gap as seen by the cell kernels.
    #[inline]
    pub fn gap_first_residue(&self) -> i32 {
        self.gap_open + self.gap_extend
    }

    /// Validate parameters for consistency.
    /// Returns Ok(()) if valid, or Err with description of issues.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.gap_open < 0 {
            errors.push(format!("gap_open must be >= 0, got {}", self.gap_open));
        }
        if self.gap_extend < 1 {
            errors.push(format!("gap_extend must be >= 1, got {}", self.gap_extend));
        }
        if self.frame_shift < 0 {
            errors.push(format!("frame_shift must be >= 0, got {}", self.frame_shift));
        }
        if self.min_score < 1 {
            errors.push(format!("min_score must be >= 1, got {}", self.min_score));
        }
        if !(self.cbs.err_tolerance > 0.0) {
            errors.push(format!(
                "cbs err_tolerance must be > 0, got {}",
                self.cbs.err_tolerance
            ));
        }
        if let Some(re) = self.cbs.relative_entropy {
            if !(re > 0.0) {
                errors.push(format!("relative_entropy must be > 0, got {}", re));
            }
        }
        if self.cbs.pseudocounts < 0.0 {
            errors.push(format!(
                "pseudocounts must be >= 0, got {}",
                self.cbs.pseudocounts
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
