// tests/common/mod.rs
// Shared helpers: a plain O(mn) Gotoh reference and random protein generators.
#![allow(dead_code)]

use ferrous_swipe::core::compute::encoding::{Letter, TRUE_AA};
use ferrous_swipe::SubstitutionScores;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Best local score and its cell (smallest row, then smallest column, among
/// equal maxima). `gap_open` is the cost of a one-residue gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefHit {
    pub score: i32,
    pub row: usize,
    pub col: usize,
}

const NEG: i64 = i64::MIN / 4;

/// Smith-Waterman with affine gaps, optionally restricted to diagonals
/// `band.0 ..= band.1` (`j - i`).
pub fn reference_sw(
    query: &[Letter],
    target: &[Letter],
    scores: &impl SubstitutionScores,
    bias: Option<&[i8]>,
    gap_open: i32,
    gap_extend: i32,
    band: Option<(i32, i32)>,
) -> RefHit {
    let (m, n) = (query.len(), target.len());
    let inside = |i: usize, j: usize| match band {
        Some((lo, hi)) => {
            let d = j as i32 - i as i32;
            lo <= d && d <= hi
        }
        None => true,
    };
    let (go, ge) = (gap_open as i64, gap_extend as i64);
    // matrices with a zero border at index 0
    let mut h = vec![vec![0i64; n + 1]; m + 1];
    let mut e = vec![vec![NEG; n + 1]; m + 1];
    let mut f = vec![vec![NEG; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            if !inside(i - 1, j - 1) {
                continue;
            }
            let s = scores.score(query[i - 1], target[j - 1]) as i64
                + bias.map_or(0, |b| b[i - 1] as i64);
            e[i][j] = (e[i][j - 1] - ge).max(h[i][j - 1] - go);
            f[i][j] = (f[i - 1][j] - ge).max(h[i - 1][j] - go);
            h[i][j] = 0.max(h[i - 1][j - 1] + s).max(e[i][j]).max(f[i][j]);
        }
    }
    let mut best = RefHit { score: 0, row: 0, col: 0 };
    for i in 1..=m {
        for j in 1..=n {
            if h[i][j] as i32 > best.score {
                best = RefHit {
                    score: h[i][j] as i32,
                    row: i - 1,
                    col: j - 1,
                };
            }
        }
    }
    best
}

/// Frame-shift reference over nucleotide rows of one strand.
pub fn reference_frameshift(
    frames: [&[Letter]; 3],
    target: &[Letter],
    scores: &impl SubstitutionScores,
    gap_open: i32,
    gap_extend: i32,
    frame_shift: i32,
) -> RefHit {
    let rows = (0..3)
        .filter(|&f| !frames[f].is_empty())
        .map(|f| 3 * (frames[f].len() - 1) + f + 1)
        .max()
        .unwrap_or(0);
    let n = target.len();
    let (go, ge, fs) = (gap_open as i64, gap_extend as i64, frame_shift as i64);
    let mut h = vec![vec![0i64; n + 1]; rows];
    let mut e = vec![vec![NEG; n + 1]; rows];
    let mut f = vec![vec![NEG; n + 1]; rows];
    let at = |h: &Vec<Vec<i64>>, r: usize, back: usize, j: usize| {
        if r >= back {
            h[r - back][j]
        } else {
            0
        }
    };
    let mut best = RefHit { score: 0, row: 0, col: 0 };
    for r in 0..rows {
        let q = frames[r % 3][r / 3];
        for j in 1..=n {
            let s = scores.score(q, target[j - 1]) as i64;
            e[r][j] = (e[r][j - 1] - ge).max(h[r][j - 1] - go);
            f[r][j] = if r >= 3 {
                (f[r - 3][j] - ge).max(h[r - 3][j] - go)
            } else {
                NEG
            };
            let v = 0
                .max(at(&h, r, 3, j - 1) + s)
                .max(at(&h, r, 2, j - 1) + s - fs)
                .max(at(&h, r, 4, j - 1) + s - fs)
                .max(e[r][j])
                .max(f[r][j]);
            h[r][j] = v;
            if v as i32 > best.score {
                best = RefHit {
                    score: v as i32,
                    row: r,
                    col: j - 1,
                };
            }
        }
    }
    best
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform random protein over the 20 true amino acids.
pub fn random_protein(rng: &mut StdRng, len: usize) -> Vec<Letter> {
    (0..len).map(|_| rng.gen_range(0..TRUE_AA as u8)).collect()
}

/// Copy of `seq` with substitutions and short indels.
pub fn mutate(rng: &mut StdRng, seq: &[Letter], rate: f64) -> Vec<Letter> {
    let mut out = Vec::with_capacity(seq.len() + 8);
    for &c in seq {
        let roll: f64 = rng.gen();
        if roll < rate * 0.7 {
            out.push(rng.gen_range(0..TRUE_AA as u8));
        } else if roll < rate * 0.85 {
            // deletion
        } else if roll < rate {
            out.push(c);
            out.push(rng.gen_range(0..TRUE_AA as u8));
        } else {
            out.push(c);
        }
    }
    if out.is_empty() {
        out.push(seq[0]);
    }
    out
}

/// Random DNA over ACGT as ASCII.
pub fn random_dna(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}
