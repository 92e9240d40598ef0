//! Vectorized local alignment of one protein (or translated DNA) query
//! against many targets, in the SWIPE style: targets or band diagonals are
//! packed into the lanes of saturating integer vectors, scores start at
//! 8-bit width and are promoted to 16 and 32 bits on overflow.
//!
//! ```no_run
//! use ferrous_swipe::{swipe, DpOpt, DpParams, DpQuery, ScoreMatrix, Sequence, TargetDescriptor};
//! use ferrous_swipe::core::compute::encoding::encode_protein;
//!
//! let query = encode_protein(b"MKVLAAGIVG").unwrap();
//! let target = encode_protein(b"MKVLAGIVGL").unwrap();
//! let matrix = ScoreMatrix::blosum62();
//! let opt = DpOpt::default();
//! let params = DpParams::new(DpQuery::Protein(Sequence::new(&query).unwrap()), &matrix, &opt);
//! let targets = [TargetDescriptor::new(0, Sequence::new(&target).unwrap())];
//! for hsp in swipe(&targets, &params).unwrap() {
//!     println!("{} {} {:e}", hsp.target, hsp.score, hsp.evalue);
//! }
//! ```

pub mod core;
pub mod defaults;
pub mod dp_opt;
pub mod error;

pub use crate::core::alignment::swipe::{swipe, swipe_par, DpParams, DpQuery};
pub use crate::core::alignment::traceback::{EditOp, Transcript};
pub use crate::core::alignment::types::{
    Band, BestCell, DpFlags, Frame, Hsp, KernelVariant, TargetDescriptor,
};
pub use crate::core::compute::encoding::TranslatedQuery;
pub use crate::core::sequence::Sequence;
pub use crate::core::stats::composition::BiasCorrection;
pub use crate::core::stats::evalue::{EvalueCalculator, EvalueMode};
pub use crate::core::stats::score_matrix::{ScoreMatrix, SubstitutionScores};
pub use crate::core::stats::target_matrix::{optimize_target_frequencies, AdjustedMatrix};
pub use crate::dp_opt::{CbsParams, DpOpt, PackingPolicy};
pub use crate::error::{Result, SwipeError};
