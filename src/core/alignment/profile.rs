//! Score profiles laid out for lane-wide lookup.
//!
//! Two layouts cover the two packing modes:
//!
//! ```text
//! SwipeProfile (inter-target, per target column j)
//!   data[a] = [ s(a, t0[j]), s(a, t1[j]), ..., s(a, tN-1[j]) ]   a = query letter
//!
//! SubstitutionProfile (per query position i)
//!   build(i) = [ s(q[i], 0), s(q[i], 1), ..., s(q[i], 23) ]      gathered by residue
//! ```
//!
//! Both are filled from a `LetterProfile`, the typed copy of a substitution
//! matrix at the lane's score width.

use crate::core::compute::encoding::{Letter, ALPHABET_SIZE};
use crate::core::compute::simd_abstraction::{LaneScore, ScoreLane};
use crate::core::stats::score_matrix::SubstitutionScores;

/// Substitution scores converted to one lane score width.
#[derive(Debug, Clone)]
pub struct LetterProfile<S: LaneScore> {
    table: Vec<S>,
}

impl<S: LaneScore> LetterProfile<S> {
    pub fn new(scores: &impl SubstitutionScores) -> Self {
        let mut table = Vec::with_capacity(ALPHABET_SIZE * ALPHABET_SIZE);
        for a in 0..ALPHABET_SIZE {
            table.extend(scores.row(a as Letter).iter().map(|&s| S::from_i32(s)));
        }
        Self { table }
    }

    #[inline(always)]
    pub fn row(&self, query: Letter) -> &[S] {
        let start = query as usize * ALPHABET_SIZE;
        &self.table[start..start + ALPHABET_SIZE]
    }
}

/// Per-column profile for lanes that hold distinct targets.
#[derive(Debug, Clone)]
pub struct SwipeProfile<L: ScoreLane> {
    data: Vec<L>,
}

impl<L: ScoreLane> SwipeProfile<L> {
    pub fn new() -> Self {
        Self {
            data: vec![L::zero(); ALPHABET_SIZE],
        }
    }

    /// Loads the scores of every query letter against the target residues of
    /// the current column (`residues[l]` is lane `l`'s residue).
    #[inline]
    pub fn set(&mut self, letters: &LetterProfile<L::Score>, residues: &[Letter]) {
        for (a, slot) in self.data.iter_mut().enumerate() {
            *slot = L::gather(letters.row(a as Letter), residues);
        }
    }

    #[inline(always)]
    pub fn get(&self, query: Letter) -> L {
        self.data[query as usize]
    }
}

impl<L: ScoreLane> Default for SwipeProfile<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-query-position rows for lanes drawn from one target window.
#[derive(Debug, Clone)]
pub struct SubstitutionProfile<S: LaneScore> {
    rows: Vec<S>,
    len: usize,
}

impl<S: LaneScore> SubstitutionProfile<S> {
    pub fn new(query: &[Letter], scores: &impl SubstitutionScores) -> Self {
        let mut rows = Vec::with_capacity(query.len() * ALPHABET_SIZE);
        for &q in query {
            rows.extend(scores.row(q).iter().map(|&s| S::from_i32(s)));
        }
        Self {
            rows,
            len: query.len(),
        }
    }

    pub fn from_letters(query: &[Letter], letters: &LetterProfile<S>) -> Self {
        let mut rows = Vec::with_capacity(query.len() * ALPHABET_SIZE);
        for &q in query {
            rows.extend_from_slice(letters.row(q));
        }
        Self {
            rows,
            len: query.len(),
        }
    }

    /// Scores of query position `query_position` against every residue code.
    #[inline(always)]
    pub fn build(&self, query_position: usize) -> &[S] {
        let start = query_position * ALPHABET_SIZE;
        &self.rows[start..start + ALPHABET_SIZE]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
