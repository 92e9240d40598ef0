//! Substitution matrices and their Karlin-Altschul parameters.
//!
//! Scores are stored as a dense 24x24 `i32` table in alphabet order. Anything
//! that can hand out such rows implements `SubstitutionScores`, which is the
//! only view of a matrix the profiles and the traceback pass need.

use crate::core::compute::encoding::{Letter, ALPHABET_SIZE, STOP_LETTER, TRUE_AA};

/// Dense per-query-letter score rows.
pub trait SubstitutionScores: Sync {
    /// Scores of `query` against every target code, `ALPHABET_SIZE` long.
    fn row(&self, query: Letter) -> &[i32];

    #[inline]
    fn score(&self, query: Letter, target: Letter) -> i32 {
        self.row(query)[target as usize]
    }

    /// Largest entry over the true amino acids.
    fn max_score(&self) -> i32 {
        (0..TRUE_AA as Letter)
            .flat_map(|a| self.row(a)[..TRUE_AA].iter().copied())
            .max()
            .unwrap_or(0)
    }
}

/// Karlin-Altschul and Spouge parameters for one scoring system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GumbelParams {
    pub lambda: f64,
    pub k: f64,
    /// Relative entropy per aligned pair (nats).
    pub h: f64,
    /// Length-correction slope (`a` in the finite-size correction).
    pub alpha: f64,
    /// Variance slope of the finite-size correction.
    pub alpha_v: f64,
    pub sigma: f64,
}

impl GumbelParams {
    /// BLOSUM62 without gaps.
    pub const BLOSUM62_UNGAPPED: GumbelParams = GumbelParams {
        lambda: 0.3176,
        k: 0.134,
        h: 0.4012,
        alpha: 0.7916,
        alpha_v: 4.96466,
        sigma: 4.96466,
    };

    /// BLOSUM62 with gap open 11, extend 1.
    pub const BLOSUM62_11_1: GumbelParams = GumbelParams {
        lambda: 0.267,
        k: 0.041,
        h: 0.14,
        alpha: 1.9,
        alpha_v: 42.6,
        sigma: 43.6,
    };
}

/// Background amino-acid frequencies (Robinson & Robinson) over `TRUE_AA`.
pub const BACKGROUND_FREQUENCIES: [f64; TRUE_AA] = [
    0.07805, 0.05129, 0.04487, 0.05364, 0.01925, 0.04264, 0.06295, 0.07377, 0.02199, 0.05142,
    0.09019, 0.05744, 0.02243, 0.03856, 0.05203, 0.07120, 0.05841, 0.01330, 0.03216, 0.06441,
];

/// Normalized copy of `BACKGROUND_FREQUENCIES`.
pub fn background_frequencies() -> [f64; TRUE_AA] {
    let total: f64 = BACKGROUND_FREQUENCIES.iter().sum();
    let mut out = BACKGROUND_FREQUENCIES;
    for f in out.iter_mut() {
        *f /= total;
    }
    out
}

#[derive(Debug, Clone)]
pub struct ScoreMatrix {
    name: String,
    scores: Vec<i32>,
    ungapped_lambda: f64,
}

impl ScoreMatrix {
    pub fn blosum62() -> Self {
        Self::from_table("BLOSUM62", BLOSUM62.to_vec())
    }

    /// Match/mismatch matrix over the whole alphabet. The stop letter scores
    /// `mismatch` against everything, itself included.
    pub fn identity(match_score: i32, mismatch: i32) -> Self {
        let mut scores = vec![mismatch; ALPHABET_SIZE * ALPHABET_SIZE];
        for a in 0..ALPHABET_SIZE {
            if a != STOP_LETTER as usize {
                scores[a * ALPHABET_SIZE + a] = match_score;
            }
        }
        Self::from_table(&format!("identity({},{})", match_score, mismatch), scores)
    }

    /// Builds a matrix from a row-major `ALPHABET_SIZE x ALPHABET_SIZE` table.
    pub fn from_table(name: &str, scores: Vec<i32>) -> Self {
        assert_eq!(scores.len(), ALPHABET_SIZE * ALPHABET_SIZE);
        let ungapped_lambda = solve_ungapped_lambda(&scores, &background_frequencies())
            .unwrap_or(GumbelParams::BLOSUM62_UNGAPPED.lambda);
        Self {
            name: name.to_string(),
            scores,
            ungapped_lambda,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `lambda` solving `sum p_a p_b exp(lambda s_ab) = 1` over the
    /// background frequencies.
    pub fn ungapped_lambda(&self) -> f64 {
        self.ungapped_lambda
    }

    /// Gapped Karlin-Altschul parameters for the given gap costs.
    ///
    /// Only BLOSUM62 11/1 is tabulated; any other combination falls back to
    /// those values with a warning.
    pub fn gumbel(&self, gap_open: i32, gap_extend: i32) -> GumbelParams {
        if !(self.name == "BLOSUM62" && gap_open == 11 && gap_extend == 1) {
            log::warn!(
                "No Karlin-Altschul parameters for {} {}/{}, using BLOSUM62 11/1",
                self.name,
                gap_open,
                gap_extend
            );
        }
        GumbelParams::BLOSUM62_11_1
    }

    pub fn ungapped_gumbel(&self) -> GumbelParams {
        GumbelParams::BLOSUM62_UNGAPPED
    }

    /// Reference joint probabilities `p_a p_b exp(lambda s_ab)` over the true
    /// amino acids, normalized to sum to one. Row-major `TRUE_AA x TRUE_AA`.
    pub fn joint_probabilities(&self) -> Vec<f64> {
        let bg = background_frequencies();
        let mut joint = vec![0.0; TRUE_AA * TRUE_AA];
        let mut total = 0.0;
        for a in 0..TRUE_AA {
            for b in 0..TRUE_AA {
                let s = self.scores[a * ALPHABET_SIZE + b] as f64;
                let p = bg[a] * bg[b] * (self.ungapped_lambda * s).exp();
                joint[a * TRUE_AA + b] = p;
                total += p;
            }
        }
        for p in joint.iter_mut() {
            *p /= total;
        }
        joint
    }

    pub fn table(&self) -> &[i32] {
        &self.scores
    }
}

impl SubstitutionScores for ScoreMatrix {
    #[inline]
    fn row(&self, query: Letter) -> &[i32] {
        let start = query as usize * ALPHABET_SIZE;
        &self.scores[start..start + ALPHABET_SIZE]
    }
}

/// Solves for the ungapped lambda by bisection. `None` when the expected
/// score is not negative (no positive root exists).
pub fn solve_ungapped_lambda(scores: &[i32], bg: &[f64; TRUE_AA]) -> Option<f64> {
    let f = |lambda: f64| -> f64 {
        let mut sum = 0.0;
        for a in 0..TRUE_AA {
            for b in 0..TRUE_AA {
                sum += bg[a] * bg[b] * (lambda * scores[a * ALPHABET_SIZE + b] as f64).exp();
            }
        }
        sum - 1.0
    };

    let expected: f64 = (0..TRUE_AA)
        .flat_map(|a| (0..TRUE_AA).map(move |b| (a, b)))
        .map(|(a, b)| bg[a] * bg[b] * scores[a * ALPHABET_SIZE + b] as f64)
        .sum();
    if expected >= 0.0 {
        return None;
    }

    let mut hi = 0.5;
    while f(hi) <= 0.0 {
        hi *= 2.0;
        if hi > 64.0 {
            return None;
        }
    }
    let mut lo = 0.0;
    for _ in 0..64 {
        let mid = 0.5 * (lo + hi);
        if f(mid) > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// BLOSUM62, NCBI reference values.
#[rustfmt::skip]
const BLOSUM62: [i32; ALPHABET_SIZE * ALPHABET_SIZE] = [
//   A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V   B   Z   X   *
     4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1,  0, -4, // A
    -1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1,  0, -1, -4, // R
    -2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  3,  0, -1, -4, // N
    -2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4,  1, -1, -4, // D
     0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2, -4, // C
    -1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0,  3, -1, -4, // Q
    -1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4, // E
     0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -2, -1, -4, // G
    -2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0,  0, -1, -4, // H
    -1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3, -3, -1, -4, // I
    -1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4, -3, -1, -4, // L
    -1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0,  1, -1, -4, // K
    -1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3, -1, -1, -4, // M
    -2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3, -3, -1, -4, // F
    -1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -1, -2, -4, // P
     1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0,  0,  0, -4, // S
     0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1,  0, -4, // T
    -3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -3, -2, -4, // W
    -2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -2, -1, -4, // Y
     0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3, -2, -1, -4, // V
    -2, -1,  3,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4,  1, -1, -4, // B
    -1,  0,  0,  1, -3,  3,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4, // Z
     0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2,  0,  0, -2, -1, -1, -1, -1, -1, -4, // X
    -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1, // *
];
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::encoding::encode_protein;

    #[test]
    fn test_blosum62_lookups() {
        let m = ScoreMatrix::blosum62();
        let w = encode_protein(b"W").unwrap()[0];
        let a = encode_protein(b"A").unwrap()[0];
        assert_eq!(m.score(w, w), 11);
        assert_eq!(m.score(a, w), -3);
        assert_eq!(m.score(w, a), -3);
        assert_eq!(m.max_score(), 11);
    }

    #[test]
    fn test_blosum62_is_symmetric() {
        let m = ScoreMatrix::blosum62();
        for a in 0..ALPHABET_SIZE as Letter {
            for b in 0..ALPHABET_SIZE as Letter {
                assert_eq!(m.score(a, b), m.score(b, a), "{} {}", a, b);
            }
        }
    }

    #[test]
    fn test_ungapped_lambda_close_to_published() {
        let m = ScoreMatrix::blosum62();
        assert!((m.ungapped_lambda() - 0.3176).abs() < 0.01, "{}", m.ungapped_lambda());
    }

    #[test]
    fn test_joint_probabilities_sum_to_one() {
        let joint = ScoreMatrix::blosum62().joint_probabilities();
        let total: f64 = joint.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(joint.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_identity_matrix() {
        let m = ScoreMatrix::identity(5, -4);
        assert_eq!(m.score(3, 3), 5);
        assert_eq!(m.score(3, 4), -4);
        assert_eq!(m.score(STOP_LETTER, STOP_LETTER), -4);
        assert!(m.ungapped_lambda() > 0.0);
    }

    #[test]
    fn test_positive_expectation_has_no_lambda() {
        let scores = vec![1; ALPHABET_SIZE * ALPHABET_SIZE];
        assert!(solve_ungapped_lambda(&scores, &background_frequencies()).is_none());
    }
}
