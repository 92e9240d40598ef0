//! Scoring statistics: substitution matrices, composition-based corrections
//! and e-values.

pub mod composition;
pub mod evalue;
pub mod score_matrix;
pub mod target_matrix;
