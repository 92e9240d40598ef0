//! Amino-acid composition and the per-position query bias correction.

use crate::core::compute::encoding::{Letter, TRUE_AA};
use crate::core::stats::score_matrix::{background_frequencies, SubstitutionScores};

/// Frequencies of the twenty standard amino acids in `seq`. Other letters are
/// ignored; a sequence with no standard residue gets the background.
pub fn composition(seq: &[Letter]) -> [f64; TRUE_AA] {
    let mut counts = [0usize; TRUE_AA];
    for &l in seq {
        if (l as usize) < TRUE_AA {
            counts[l as usize] += 1;
        }
    }
    let total: usize = counts.iter().sum();
    if total == 0 {
        return background_frequencies();
    }
    let mut out = [0.0; TRUE_AA];
    for (o, &c) in out.iter_mut().zip(counts.iter()) {
        *o = c as f64 / total as f64;
    }
    out
}

/// Mixes observed frequencies of `n` residues with the background using
/// `pseudocounts` background residues.
pub fn with_pseudocounts(observed: &[f64; TRUE_AA], n: usize, pseudocounts: f64) -> [f64; TRUE_AA] {
    let bg = background_frequencies();
    let n = n as f64;
    let mut out = [0.0; TRUE_AA];
    for a in 0..TRUE_AA {
        out[a] = (n * observed[a] + pseudocounts * bg[a]) / (n + pseudocounts);
    }
    out
}

/// Per-query-position score correction for locally biased composition.
///
/// For position `i` holding letter `a`, the correction is the expected score
/// of `a` against background residues minus its expected score against the
/// residues in a window of `window` positions centred on `i` (excluding `i`
/// itself). Regions rich in a letter that scores well against itself get a
/// negative correction.
#[derive(Debug, Clone)]
pub struct BiasCorrection {
    bias: Vec<f32>,
    int8: Vec<i8>,
}

impl BiasCorrection {
    pub fn new(query: &[Letter], matrix: &impl SubstitutionScores, window: usize) -> Self {
        let half = window / 2;
        let bg = background_frequencies();

        // expected score of each letter against the background
        let mut expected_bg = [0.0f64; TRUE_AA];
        for (a, e) in expected_bg.iter_mut().enumerate() {
            let row = matrix.row(a as Letter);
            *e = (0..TRUE_AA).map(|b| bg[b] * row[b] as f64).sum();
        }

        let mut counts = [0u32; TRUE_AA];
        let mut in_window = 0u32;
        let add = |counts: &mut [u32; TRUE_AA], n: &mut u32, l: Letter, delta: i32| {
            if (l as usize) < TRUE_AA {
                counts[l as usize] = (counts[l as usize] as i32 + delta) as u32;
                *n = (*n as i32 + delta) as u32;
            }
        };

        let len = query.len();
        let mut hi = 0usize;
        let mut lo = 0usize;
        let mut bias = Vec::with_capacity(len);
        for i in 0..len {
            let end = (i + half + 1).min(len);
            while hi < end {
                add(&mut counts, &mut in_window, query[hi], 1);
                hi += 1;
            }
            let begin = i.saturating_sub(half);
            while lo < begin {
                add(&mut counts, &mut in_window, query[lo], -1);
                lo += 1;
            }

            let a = query[i];
            if (a as usize) >= TRUE_AA {
                bias.push(0.0);
                continue;
            }
            let n = in_window - 1;
            if n == 0 {
                bias.push(0.0);
                continue;
            }
            let row = matrix.row(a);
            let mut local = 0.0;
            for b in 0..TRUE_AA {
                let c = counts[b] - u32::from(b == a as usize);
                local += c as f64 * row[b] as f64;
            }
            bias.push((expected_bg[a as usize] - local / n as f64) as f32);
        }

        let int8 = bias
            .iter()
            .map(|&b| b.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8)
            .collect();
        Self { bias, int8 }
    }

    /// Exact per-position corrections.
    pub fn values(&self) -> &[f32] {
        &self.bias
    }

    /// Corrections rounded for the biased kernels.
    pub fn int8(&self) -> &[i8] {
        &self.int8
    }
}
