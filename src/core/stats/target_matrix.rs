//! Composition-adjusted substitution matrices.
//!
//! The adjustment rescales a reference joint distribution of aligned residue
//! pairs until its row and column marginals match the query and target
//! compositions (iterative proportional fitting). Optionally the fitted
//! distribution is also held at a fixed relative entropy by bisecting over an
//! exponent applied to the reference before fitting. Scores are the rounded
//! log-odds of the fitted distribution against the two compositions.
//!
//! Hitting the iteration cap is not an error: the best distribution reached is
//! returned with `converged == false`.

use crate::core::compute::encoding::{Letter, ALPHABET_SIZE, TRUE_AA};
use crate::core::stats::composition::{composition, with_pseudocounts};
use crate::core::stats::score_matrix::{ScoreMatrix, SubstitutionScores};
use crate::dp_opt::CbsParams;

/// Upper bound on the exponent searched when bracketing a relative-entropy target.
const MAX_EXPONENT: f64 = 16.0;

/// Bisection steps over the exponent.
const BISECTION_STEPS: usize = 40;

/// Result of `optimize_target_frequencies`.
#[derive(Debug, Clone)]
pub struct TargetFrequencies {
    /// Fitted joint probabilities, row-major `TRUE_AA x TRUE_AA`.
    pub probs: Vec<f64>,
    /// Proportional-fitting sweeps performed over all evaluations.
    pub iterations: usize,
    pub converged: bool,
    /// Largest marginal deviation of `probs`.
    pub max_error: f64,
    pub relative_entropy: f64,
}

fn marginal_error(q: &[f64], rows: &[f64; TRUE_AA], cols: &[f64; TRUE_AA]) -> f64 {
    let mut err: f64 = 0.0;
    for a in 0..TRUE_AA {
        let r: f64 = q[a * TRUE_AA..(a + 1) * TRUE_AA].iter().sum();
        err = err.max((r - rows[a]).abs());
    }
    for b in 0..TRUE_AA {
        let c: f64 = (0..TRUE_AA).map(|a| q[a * TRUE_AA + b]).sum();
        err = err.max((c - cols[b]).abs());
    }
    err
}

/// `sum q_ab ln(q_ab / (r_a c_b))` in nats.
pub fn relative_entropy(q: &[f64], rows: &[f64; TRUE_AA], cols: &[f64; TRUE_AA]) -> f64 {
    let mut d = 0.0;
    for a in 0..TRUE_AA {
        for b in 0..TRUE_AA {
            let p = q[a * TRUE_AA + b];
            if p > 0.0 {
                d += p * (p / (rows[a] * cols[b])).ln();
            }
        }
    }
    d
}

/// Alternately rescales rows and columns until every marginal is within
/// `tolerance` or `limit` sweeps have run. Returns (sweeps, converged, error).
/// Input that already fits is left untouched.
fn fit_marginals(
    q: &mut [f64],
    rows: &[f64; TRUE_AA],
    cols: &[f64; TRUE_AA],
    tolerance: f64,
    limit: usize,
) -> (usize, bool, f64) {
    let mut sweeps = 0;
    loop {
        let err = marginal_error(q, rows, cols);
        if err < tolerance {
            return (sweeps, true, err);
        }
        if sweeps >= limit {
            return (sweeps, false, err);
        }
        for a in 0..TRUE_AA {
            let row = &mut q[a * TRUE_AA..(a + 1) * TRUE_AA];
            let sum: f64 = row.iter().sum();
            if sum > 0.0 {
                let scale = rows[a] / sum;
                row.iter_mut().for_each(|p| *p *= scale);
            }
        }
        for b in 0..TRUE_AA {
            let sum: f64 = (0..TRUE_AA).map(|a| q[a * TRUE_AA + b]).sum();
            if sum > 0.0 {
                let scale = cols[b] / sum;
                for a in 0..TRUE_AA {
                    q[a * TRUE_AA + b] *= scale;
                }
            }
        }
        sweeps += 1;
    }
}

/// Fits `joint` to the given marginals, optionally at a fixed relative entropy.
///
/// `iteration_limit` caps the fitting sweeps of each evaluation.
pub fn optimize_target_frequencies(
    joint: &[f64],
    row_probs: &[f64; TRUE_AA],
    col_probs: &[f64; TRUE_AA],
    relative_entropy_target: Option<f64>,
    tolerance: f64,
    iteration_limit: usize,
) -> TargetFrequencies {
    debug_assert_eq!(joint.len(), TRUE_AA * TRUE_AA);

    let evaluate = |exponent: f64| -> TargetFrequencies {
        let mut q: Vec<f64> = if exponent == 1.0 {
            joint.to_vec()
        } else {
            let mut q: Vec<f64> = joint.iter().map(|&p| p.powf(exponent)).collect();
            let total: f64 = q.iter().sum();
            q.iter_mut().for_each(|p| *p /= total);
            q
        };
        let (iterations, converged, max_error) =
            fit_marginals(&mut q, row_probs, col_probs, tolerance, iteration_limit);
        let relative_entropy = relative_entropy(&q, row_probs, col_probs);
        TargetFrequencies {
            probs: q,
            iterations,
            converged,
            max_error,
            relative_entropy,
        }
    };

    let base = evaluate(1.0);
    let target = match relative_entropy_target {
        None => return base,
        Some(t) => t,
    };
    if (base.relative_entropy - target).abs() <= tolerance {
        return base;
    }

    let mut total_iterations = base.iterations;
    let (mut lo, mut hi) = (0.0, 1.0);
    let mut best = base;
    if best.relative_entropy < target {
        lo = 1.0;
        hi = 2.0;
        loop {
            let trial = evaluate(hi);
            total_iterations += trial.iterations;
            let reached = trial.relative_entropy >= target;
            best = trial;
            if reached || hi >= MAX_EXPONENT {
                break;
            }
            lo = hi;
            hi *= 2.0;
        }
    }

    let half_tolerance = 0.5 * tolerance;
    if (best.relative_entropy - target).abs() > half_tolerance {
        for _ in 0..BISECTION_STEPS {
            let mid = 0.5 * (lo + hi);
            let trial = evaluate(mid);
            total_iterations += trial.iterations;
            if trial.relative_entropy < target {
                lo = mid;
            } else {
                hi = mid;
            }
            let done = (trial.relative_entropy - target).abs() <= half_tolerance;
            if (trial.relative_entropy - target).abs() <= (best.relative_entropy - target).abs() {
                best = trial;
            }
            if done {
                break;
            }
        }
    }

    best.converged = best.converged && (best.relative_entropy - target).abs() <= tolerance;
    best.iterations = total_iterations;
    best
}

/// A substitution matrix rescaled for one query/target composition pair.
///
/// Rows and columns of the non-standard letters keep their base scores.
#[derive(Debug, Clone)]
pub struct AdjustedMatrix {
    scores: Vec<i32>,
    frequencies: TargetFrequencies,
}

impl AdjustedMatrix {
    pub fn new(base: &ScoreMatrix, query: &[Letter], target: &[Letter], params: &CbsParams) -> Self {
        let rows = with_pseudocounts(&composition(query), query.len(), params.pseudocounts);
        let cols = with_pseudocounts(&composition(target), target.len(), params.pseudocounts);
        Self::from_compositions(base, &rows, &cols, params)
    }

    pub fn from_compositions(
        base: &ScoreMatrix,
        rows: &[f64; TRUE_AA],
        cols: &[f64; TRUE_AA],
        params: &CbsParams,
    ) -> Self {
        let frequencies = optimize_target_frequencies(
            &base.joint_probabilities(),
            rows,
            cols,
            params.relative_entropy,
            params.err_tolerance,
            params.iteration_limit,
        );
        if !frequencies.converged {
            log::warn!(
                "Target frequency optimization stopped after {} iterations (error {:.2e})",
                frequencies.iterations,
                frequencies.max_error
            );
        }
        let scores = log_odds_scores(base, &frequencies.probs, rows, cols);
        Self {
            scores,
            frequencies,
        }
    }

    pub fn frequencies(&self) -> &TargetFrequencies {
        &self.frequencies
    }

    pub fn table(&self) -> &[i32] {
        &self.scores
    }
}

/// Rounded `ln(q_ab / (r_a c_b)) / lambda` for the true amino acids; other
/// entries copied from `base`.
fn log_odds_scores(
    base: &ScoreMatrix,
    probs: &[f64],
    rows: &[f64; TRUE_AA],
    cols: &[f64; TRUE_AA],
) -> Vec<i32> {
    let lambda = base.ungapped_lambda();
    let mut scores = base.table().to_vec();
    for a in 0..TRUE_AA {
        for b in 0..TRUE_AA {
            let q = probs[a * TRUE_AA + b];
            scores[a * ALPHABET_SIZE + b] = ((q / (rows[a] * cols[b])).ln() / lambda).round() as i32;
        }
    }
    scores
}

impl SubstitutionScores for AdjustedMatrix {
    #[inline]
    fn row(&self, query: Letter) -> &[i32] {
        let start = query as usize * ALPHABET_SIZE;
        &self.scores[start..start + ALPHABET_SIZE]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::encoding::encode_protein;

    fn marginals(q: &[f64]) -> ([f64; TRUE_AA], [f64; TRUE_AA]) {
        let mut rows = [0.0; TRUE_AA];
        let mut cols = [0.0; TRUE_AA];
        for a in 0..TRUE_AA {
            for b in 0..TRUE_AA {
                rows[a] += q[a * TRUE_AA + b];
                cols[b] += q[a * TRUE_AA + b];
            }
        }
        (rows, cols)
    }

    #[test]
    fn test_fit_reaches_requested_marginals() {
        let joint = ScoreMatrix::blosum62().joint_probabilities();
        let rows = with_pseudocounts(&composition(&encode_protein(b"KKKKRRRREEDD").unwrap()), 12, 20.0);
        let cols = with_pseudocounts(&composition(&encode_protein(b"LLLLIIVVFFAA").unwrap()), 12, 20.0);
        let fit = optimize_target_frequencies(&joint, &rows, &cols, None, 1e-8, 1000);
        assert!(fit.converged);
        assert!(fit.iterations > 0);
        let (r, c) = marginals(&fit.probs);
        for a in 0..TRUE_AA {
            assert!((r[a] - rows[a]).abs() < 1e-8);
            assert!((c[a] - cols[a]).abs() < 1e-8);
        }
    }

    #[test]
    fn test_iteration_cap_is_honored() {
        let joint = ScoreMatrix::blosum62().joint_probabilities();
        let rows = with_pseudocounts(&composition(&encode_protein(b"WWWWWWWWWWCC").unwrap()), 12, 1.0);
        let cols = with_pseudocounts(&composition(&encode_protein(b"GGGGGGGGPPPP").unwrap()), 12, 1.0);
        let fit = optimize_target_frequencies(&joint, &rows, &cols, None, 1e-15, 2);
        assert_eq!(fit.iterations, 2);
        assert!(!fit.converged);
        assert!(fit.probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_relative_entropy_target_is_met() {
        let joint = ScoreMatrix::blosum62().joint_probabilities();
        let rows = with_pseudocounts(&composition(&encode_protein(b"MKVLAAGIVGLLLA").unwrap()), 14, 20.0);
        let cols = with_pseudocounts(&composition(&encode_protein(b"MKTAYIAKQRQISF").unwrap()), 14, 20.0);
        let fit = optimize_target_frequencies(&joint, &rows, &cols, Some(0.44), 1e-5, 2000);
        assert!(fit.converged);
        assert!((fit.relative_entropy - 0.44).abs() <= 1e-5);
    }

    #[test]
    fn test_adjustment_never_touches_base() {
        let base = ScoreMatrix::blosum62();
        let before = base.table().to_vec();
        let q = encode_protein(b"MKVLAAGIVGLLLAXB*").unwrap();
        let t = encode_protein(b"MKTAYIAKQRQISFVK").unwrap();
        let adjusted = AdjustedMatrix::new(&base, &q, &t, &CbsParams::default());
        assert_eq!(base.table(), &before[..]);
        // non-standard letters keep base scores
        let x = 22;
        assert_eq!(adjusted.row(x), base.row(x));
        assert_eq!(adjusted.score(0, 23), base.score(0, 23));
    }
}
