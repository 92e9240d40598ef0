//! Begin coordinates of the best local alignment without a traceback.
//!
//! A scalar 32-bit pass over the same cells as `traceback`, carrying for
//! every cell and gap state the first cell of the path that produced it.
//! Sources are chosen with the traceback tie rules, so the begin reported
//! here is the one a traceback would walk back to. Memory is one band row
//! (five rows for frame-shift alignments).

use crate::core::alignment::traceback::TracebackCosts;
use crate::core::alignment::types::{Band, BestCell};
use crate::core::compute::encoding::Letter;
use crate::core::stats::score_matrix::SubstitutionScores;

const NEG: i32 = i32::MIN / 2;

/// Query and target coordinates of a cell.
type Cell = (usize, usize);

/// End cell and first cell of the best alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub best: BestCell,
    pub query_begin: usize,
    pub target_begin: usize,
}

impl Extent {
    fn new(best: BestCell, start: Cell) -> Self {
        Self {
            best,
            query_begin: start.0,
            target_begin: start.1,
        }
    }
}

/// Extent of the best alignment of one target within `band` (already
/// clipped). `None` when no cell scores above zero.
pub fn alignment_extent<M: SubstitutionScores + ?Sized>(
    query: &[Letter],
    target: &[Letter],
    band: Band,
    scores: &M,
    bias: Option<&[i8]>,
    costs: &TracebackCosts,
) -> Option<Extent> {
    let m = query.len();
    let width = band.width();
    if m == 0 || target.is_empty() {
        return None;
    }
    let column = |i: usize, k: usize| {
        let j = i as i64 + band.begin as i64 + k as i64;
        (j >= 0 && (j as usize) < target.len()).then_some(j as usize)
    };

    let mut h = vec![0i32; width + 1];
    let mut h_start: Vec<Cell> = vec![(0, 0); width + 1];
    let mut vgap = vec![NEG; width + 1];
    let mut vgap_start: Vec<Cell> = vec![(0, 0); width + 1];
    let mut best = BestCell::default();
    let mut best_start = (0, 0);

    for (i, &q) in query.iter().enumerate() {
        let row = scores.row(q);
        let row_bias = bias.map_or(0, |b| b[i] as i32);
        let mut horizontal_gap = NEG;
        let mut horizontal_start = (i, 0);
        for k in 0..width {
            let Some(j) = column(i, k) else {
                h[k] = 0;
                vgap[k] = NEG;
                horizontal_gap = NEG;
                continue;
            };
            let diagonal = h[k];
            let vertical = vgap[k + 1];
            let matched = diagonal + row[target[j] as usize] + row_bias;

            let (cell, start) = if matched >= vertical && matched >= horizontal_gap {
                let start = if diagonal == 0 || i == 0 || j == 0 {
                    (i, j)
                } else {
                    h_start[k]
                };
                (matched, start)
            } else if vertical >= horizontal_gap {
                (vertical, vgap_start[k + 1])
            } else {
                (horizontal_gap, horizontal_start)
            };
            let cell = cell.max(0);

            let open = cell - costs.gap_open;
            let vertical_ext = vertical.saturating_sub(costs.gap_extend);
            if vertical_ext <= open {
                vgap_start[k] = start;
            } else {
                vgap_start[k] = vgap_start[k + 1];
            }
            vgap[k] = vertical_ext.max(open);
            let horizontal_ext = horizontal_gap.saturating_sub(costs.gap_extend);
            if horizontal_ext <= open {
                horizontal_start = start;
            }
            horizontal_gap = horizontal_ext.max(open);

            h[k] = cell;
            h_start[k] = start;
            let before = best;
            best.offer(cell, i, j);
            if best != before {
                best_start = start;
            }
        }
    }

    (best.score > 0).then(|| Extent::new(best, best_start))
}

/// Extent of the best frame-shift alignment of one target against the three
/// frames of a strand. Query coordinates are nucleotide rows of the strand.
pub fn frameshift_extent<M: SubstitutionScores + ?Sized>(
    frames: [&[Letter]; 3],
    target: &[Letter],
    scores: &M,
    costs: &TracebackCosts,
) -> Option<Extent> {
    const RING: usize = 5;
    let rows = super::swipe::frameshift::frameshift_rows(frames);
    let n = target.len();
    if rows == 0 || n == 0 {
        return None;
    }
    let letter = |r: usize| frames[r % 3][r / 3];

    // rows r-2, r-3 and r-4 of cells and vertical gaps, by r % RING
    let mut h = vec![0i32; RING * n];
    let mut h_start: Vec<Cell> = vec![(0, 0); RING * n];
    let mut vgap = vec![NEG; RING * n];
    let mut vgap_start: Vec<Cell> = vec![(0, 0); RING * n];
    let slot = |r: usize, j: usize| (r % RING) * n + j;
    let mut best = BestCell::default();
    let mut best_start = (0, 0);

    for r in 0..rows {
        let row = scores.row(letter(r));
        let mut horizontal_gap = NEG;
        let mut horizontal_start = (r, 0);
        for j in 0..n {
            let s = row[target[j] as usize];
            let back = |b: usize| (r >= b && j > 0).then(|| slot(r - b, j - 1));
            let h_back = |b: usize| back(b).map_or(0, |x| h[x]);

            let diagonal = h_back(3);
            let diagonal_start = match back(3) {
                Some(x) if diagonal != 0 => h_start[x],
                _ => (r, j),
            };
            let mut cell = diagonal + s;
            let mut start = diagonal_start;

            for b in [2, 4] {
                let shifted = h_back(b) + s - costs.frame_shift;
                if shifted > cell {
                    cell = shifted;
                    start = back(b).map_or((r, j), |x| h_start[x]);
                }
            }
            let (vertical, vertical_start) = if r >= 3 {
                let x = slot(r - 3, j);
                (vgap[x], vgap_start[x])
            } else {
                (NEG, (r, j))
            };
            if vertical > cell {
                cell = vertical;
                start = vertical_start;
            }
            if horizontal_gap > cell {
                cell = horizontal_gap;
                start = horizontal_start;
            }
            let cell = cell.max(0);

            let here = slot(r, j);
            let open = cell - costs.gap_open;
            let vertical_ext = vertical.saturating_sub(costs.gap_extend);
            vgap_start[here] = if vertical_ext > open { vertical_start } else { start };
            vgap[here] = vertical_ext.max(open);
            let horizontal_ext = horizontal_gap.saturating_sub(costs.gap_extend);
            if horizontal_ext <= open {
                horizontal_start = start;
            }
            horizontal_gap = horizontal_ext.max(open);

            h[here] = cell;
            h_start[here] = start;
            let before = best;
            best.offer(cell, r, j);
            if best != before {
                best_start = start;
            }
        }
    }

    (best.score > 0).then(|| Extent::new(best, best_start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::traceback::{traceback, traceback_frameshift};
    use crate::core::compute::encoding::{encode_protein, TranslatedQuery};
    use crate::core::stats::score_matrix::ScoreMatrix;

    const COSTS: TracebackCosts = TracebackCosts {
        gap_open: 11,
        gap_extend: 1,
        frame_shift: 15,
    };

    #[test]
    fn test_extent_of_embedded_match() {
        let m = ScoreMatrix::identity(5, -4);
        let q = encode_protein(b"PPPPMPEEEY").unwrap();
        let t = encode_protein(b"MPEEEYWWWW").unwrap();
        let e = alignment_extent(&q, &t, Band::full(q.len(), t.len()), &m, None, &COSTS).unwrap();
        assert_eq!(e.best, BestCell { score: 30, row: 9, col: 5 });
        assert_eq!((e.query_begin, e.target_begin), (4, 0));
    }

    #[test]
    fn test_extent_agrees_with_traceback_across_gap() {
        let m = ScoreMatrix::blosum62();
        let q = encode_protein(b"MKVLAAGIVGHHHWWTRPLLAQ").unwrap();
        let t = encode_protein(b"GGMKVLAAGIVGWWTRPLLAQ").unwrap();
        let costs = TracebackCosts {
            gap_open: 12,
            gap_extend: 1,
            frame_shift: 15,
        };
        let band = Band::full(q.len(), t.len());
        let tb = traceback(&q, &t, band, &m, None, &costs).unwrap();
        let e = alignment_extent(&q, &t, band, &m, None, &costs).unwrap();
        assert_eq!(e.best, tb.best);
        assert_eq!(
            (e.query_begin, e.target_begin),
            (tb.transcript.query_begin, tb.transcript.target_begin)
        );
    }

    #[test]
    fn test_extent_respects_band_and_bias() {
        let m = ScoreMatrix::blosum62();
        let q = encode_protein(b"WWWWMKVLAAGIVG").unwrap();
        let t = encode_protein(b"MKVLAAGIVGWWWW").unwrap();
        let bias: Vec<i8> = (0..q.len() as i8).map(|i| (i % 3) - 1).collect();
        let band = Band::new(-6, 2).unwrap().clip(q.len(), t.len()).unwrap();
        let tb = traceback(&q, &t, band, &m, Some(&bias), &COSTS).unwrap();
        let e = alignment_extent(&q, &t, band, &m, Some(&bias), &COSTS).unwrap();
        assert_eq!(e.best, tb.best);
        assert_eq!(
            (e.query_begin, e.target_begin),
            (tb.transcript.query_begin, tb.transcript.target_begin)
        );
    }

    #[test]
    fn test_frameshift_extent_agrees_with_traceback() {
        let m = ScoreMatrix::blosum62();
        let dna = b"GGCATGAAATGGTGGCTCGAACCATGGTTCGCAAGCTTGGCACTGGCC";
        let q = TranslatedQuery::from_dna(dna).unwrap();
        let mut t = q.frame(0)[1..6].to_vec();
        t.extend_from_slice(&q.frame(1)[6..12]);
        let costs = TracebackCosts {
            gap_open: 12,
            gap_extend: 1,
            frame_shift: 3,
        };
        let tb = traceback_frameshift(q.strand(0), &t, &m, &costs).unwrap();
        let e = frameshift_extent(q.strand(0), &t, &m, &costs).unwrap();
        assert_eq!(e.best, tb.best);
        assert_eq!(
            (e.query_begin, e.target_begin),
            (tb.transcript.query_begin, tb.transcript.target_begin)
        );
    }

    #[test]
    fn test_no_positive_cell() {
        let m = ScoreMatrix::identity(5, -4);
        let q = encode_protein(b"AAA").unwrap();
        let t = encode_protein(b"CCC").unwrap();
        assert_eq!(
            alignment_extent(&q, &t, Band::full(3, 3), &m, None, &COSTS),
            None
        );
    }
}
