//! Karlin-Altschul significance of raw alignment scores.
//!
//! Two modes are provided. `Fast` is the closed form `K m' n' exp(-lambda S)`
//! over length-adjusted sizes. `Precise` applies Spouge's finite-size
//! correction, which matters for short sequences and low scores. Everything
//! here is a pure function of its arguments.

use std::f64::consts::{LN_2, SQRT_2};

use crate::core::stats::score_matrix::GumbelParams;

/// `1 / sqrt(2 pi)`
const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Fixed-point iterations for the length adjustment.
const LENGTH_ADJUSTMENT_ROUNDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalueMode {
    #[default]
    Fast,
    Precise,
}

/// Normalized score in bits.
pub fn bit_score(raw_score: i32, params: &GumbelParams) -> f64 {
    (params.lambda * raw_score as f64 - params.k.ln()) / LN_2
}

/// Expected HSP length removed from both sequences before computing the
/// search space. Solves `l = ln(K (m - l)(n - N l)) / H` by fixed-point
/// iteration and keeps `m - l >= 1/K`.
pub fn length_adjustment(
    query_len: usize,
    db_letters: u64,
    db_sequences: u64,
    params: &GumbelParams,
) -> f64 {
    let m = query_len as f64;
    let n = db_letters as f64;
    let seqs = db_sequences.max(1) as f64;
    let max_adjust = (m - 1.0 / params.k).max(0.0);
    let mut ell: f64 = 0.0;
    for _ in 0..LENGTH_ADJUSTMENT_ROUNDS {
        let space = params.k * (m - ell).max(1.0) * (n - seqs * ell).max(1.0);
        ell = (space.ln() / params.h).clamp(0.0, max_adjust);
    }
    ell
}

/// Closed-form e-value over the length-adjusted search space.
pub fn evalue_fast(
    raw_score: i32,
    query_len: usize,
    db_letters: u64,
    db_sequences: u64,
    params: &GumbelParams,
) -> f64 {
    let ell = length_adjustment(query_len, db_letters, db_sequences, params);
    let m = (query_len as f64 - ell).max(1.0);
    let n = (db_letters as f64 - db_sequences.max(1) as f64 * ell).max(1.0);
    params.k * m * n * (-params.lambda * raw_score.max(0) as f64).exp()
}

/// Spouge finite-size corrected e-value for one query/target pair, scaled to
/// a database of `db_letters` residues.
///
/// `ungapped` supplies the reference slopes; `gap_open + gap_extend` is the
/// cost of a one-residue gap.
#[allow(clippy::too_many_arguments)]
pub fn evalue_precise(
    raw_score: i32,
    query_len: usize,
    target_len: usize,
    db_letters: u64,
    gapped: &GumbelParams,
    ungapped: &GumbelParams,
    gap_open: i32,
    gap_extend: i32,
) -> f64 {
    let g = (gap_open + gap_extend) as f64;
    let b = 2.0 * g * (ungapped.alpha - gapped.alpha);
    let beta = 2.0 * g * (ungapped.alpha_v - gapped.alpha_v);
    let tau = 2.0 * g * (ungapped.alpha_v - gapped.sigma);

    let y = raw_score.max(0) as f64;
    let lambda = gapped.lambda;

    let edge = |len: f64| -> (f64, f64) {
        let l_y = len - (gapped.alpha * y + b);
        let v_y = (2.0 * gapped.alpha_v / lambda).max(gapped.alpha_v * y + beta);
        let sqrt_v = v_y.sqrt();
        let f = l_y / sqrt_v;
        let p_f = erfc(-f / SQRT_2) / 2.0;
        let p = l_y * p_f + sqrt_v * INV_SQRT_2PI * (-0.5 * f * f).exp();
        (p, p_f)
    };

    let (p1, p_m) = edge(query_len as f64);
    let (p2, p_n) = edge(target_len.max(1) as f64);
    let c_y = (2.0 * gapped.sigma / lambda).max(gapped.sigma * y + tau);
    let area = p1 * p2 + c_y * p_m * p_n;

    let db_scale = if db_letters > 0 {
        db_letters as f64 / target_len.max(1) as f64
    } else {
        1.0
    };
    (area * gapped.k * (-lambda * y).exp() * db_scale).max(0.0)
}

/// Complementary error function (Chebyshev fit, fractional error < 1.2e-7).
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Search-space description and parameters for converting scores.
#[derive(Debug, Clone, Copy)]
pub struct EvalueCalculator {
    pub gapped: GumbelParams,
    pub ungapped: GumbelParams,
    pub gap_open: i32,
    pub gap_extend: i32,
    /// Database size in residues; 0 means "the target alone".
    pub db_letters: u64,
    pub db_sequences: u64,
    pub mode: EvalueMode,
}

impl EvalueCalculator {
    pub fn evalue(&self, raw_score: i32, query_len: usize, target_len: usize) -> f64 {
        let (letters, seqs) = if self.db_letters > 0 {
            (self.db_letters, self.db_sequences.max(1))
        } else {
            (target_len as u64, 1)
        };
        match self.mode {
            EvalueMode::Fast => evalue_fast(raw_score, query_len, letters, seqs, &self.gapped),
            EvalueMode::Precise => evalue_precise(
                raw_score,
                query_len,
                target_len,
                letters,
                &self.gapped,
                &self.ungapped,
                self.gap_open,
                self.gap_extend,
            ),
        }
    }

    pub fn bit_score(&self, raw_score: i32) -> f64 {
        bit_score(raw_score, &self.gapped)
    }
}
