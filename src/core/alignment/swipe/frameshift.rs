//! Frame-shift sweep for translated queries.
//!
//! Rows are nucleotide offsets on one strand: row `r = 3 * c + f` is codon
//! `c` of frame `f`. A cell extends the in-frame diagonal (row `r - 3`) or
//! jumps frames from rows `r - 2` and `r - 4` at the frame-shift penalty.
//! Vertical gaps stay within a frame. Lanes hold different targets and the
//! whole matrix is computed.

use crate::core::alignment::cell_update::{cell_update_frameshift, LaneCosts, LaneMask};
use crate::core::alignment::profile::{LetterProfile, SwipeProfile};
use crate::core::alignment::types::{BestCell, LaneOutcome};
use crate::core::alignment::workspace::{with_workspace, WorkspaceScore};
use crate::core::compute::encoding::{Letter, MASK_LETTER};
use crate::core::compute::simd_abstraction::{LaneScore, ScoreLane, MAX_LANES};

use super::inter::outcomes;

/// Number of leading rows `r` for which codon `r / 3` exists in frame `r % 3`.
pub fn frameshift_rows(frames: [&[Letter]; 3]) -> usize {
    (0..3)
        .filter(|&f| !frames[f].is_empty())
        .map(|f| 3 * (frames[f].len() - 1) + f + 1)
        .max()
        .unwrap_or(0)
}

#[inline(always)]
fn row_letter(frames: [&[Letter]; 3], r: usize) -> Option<Letter> {
    frames[r % 3].get(r / 3).copied()
}

/// Sweep up to `L::LANES` targets against the three frames of one strand.
pub fn frameshift_sweep<L>(
    frames: [&[Letter]; 3],
    targets: &[&[Letter]],
    letters: &LetterProfile<L::Score>,
    costs: &LaneCosts<L>,
) -> Vec<LaneOutcome>
where
    L: ScoreLane,
    L::Score: WorkspaceScore,
{
    let lanes = L::LANES;
    assert!(targets.len() <= lanes, "batch larger than lane count");
    let rows = frameshift_rows(frames);
    let max_len = targets.iter().map(|t| t.len()).max().unwrap_or(0);
    let mut best = vec![BestCell::default(); targets.len()];
    if rows == 0 || max_len == 0 {
        return outcomes::<L::Score>(&best);
    }

    with_workspace(|ws| {
        let (h, hgap) = L::Score::buffers(ws).reset(rows * lanes);
        let mut profile = SwipeProfile::<L>::new();
        let mut residues = [MASK_LETTER; MAX_LANES];

        for j in 0..max_len {
            for (l, t) in targets.iter().enumerate() {
                residues[l] = t.get(j).copied().unwrap_or(MASK_LETTER);
            }
            profile.set(letters, &residues[..lanes]);
            let mask = LaneMask::<L>::from_fn(|l| l < targets.len() && j < targets[l].len());

            // previous-column cells of the last rows, slot r % 5
            let mut previous = [L::zero(); 5];
            let mut vertical_gap = [L::splat(L::Score::MIN); 3];
            let mut column_best = L::zero();
            let prev = |previous: &[L; 5], r: usize, back: usize| {
                if r >= back {
                    previous[(r - back) % 5]
                } else {
                    L::zero()
                }
            };

            for r in 0..rows {
                let off = r * lanes;
                let Some(q) = row_letter(frames, r) else {
                    continue;
                };
                let diagonal = prev(&previous, r, 3);
                let shift0 = prev(&previous, r, 2);
                let shift1 = prev(&previous, r, 4);
                previous[r % 5] = L::load(&h[off..]);

                let mut horizontal_gap = L::load(&hgap[off..]);
                let current = cell_update_frameshift(
                    diagonal,
                    shift0,
                    shift1,
                    profile.get(q),
                    costs.gap_extension,
                    costs.gap_open,
                    costs.frame_shift,
                    &mut horizontal_gap,
                    &mut vertical_gap[r % 3],
                    &mut column_best,
                    &mask,
                );
                current.store(&mut h[off..]);
                horizontal_gap.store(&mut hgap[off..]);
            }

            for (l, cell) in best.iter_mut().enumerate() {
                let s = column_best.lane(l).to_i32();
                if s > 0 && s >= cell.score {
                    if let Some(r) = (0..rows).find(|&r| h[r * lanes + l].to_i32() == s) {
                        cell.offer(s, r, j);
                    }
                }
            }
        }
    });

    outcomes::<L::Score>(&best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::encoding::{encode_protein, TranslatedQuery};
    use crate::core::compute::simd_abstraction::PortableI16;
    use crate::core::stats::score_matrix::ScoreMatrix;

    #[test]
    fn test_rows_cover_all_frames() {
        let q = TranslatedQuery::from_dna(b"ATGGCCAAGTTT").unwrap();
        // frames hold 4, 3 and 3 codons
        assert_eq!(frameshift_rows(q.strand(0)), 10);
    }

    #[test]
    fn test_in_frame_alignment() {
        // ATG GCC AAG TTT -> M A K F
        let q = TranslatedQuery::from_dna(b"ATGGCCAAGTTT").unwrap();
        let t = encode_protein(b"MAKF").unwrap();
        let m = ScoreMatrix::identity(5, -4);
        let letters = LetterProfile::<i16>::new(&m);
        let costs = LaneCosts::<PortableI16>::new(12, 1, 15);
        let out = frameshift_sweep(q.strand(0), &[&t[..]], &letters, &costs);
        assert_eq!(out[0].best, BestCell { score: 20, row: 9, col: 3 });
    }

    #[test]
    fn test_frame_shift_joins_two_frames() {
        // MAKF in frame 0, an extra T, then WWWW in frame 1
        let dna = b"ATGGCCAAGTTTTTGGTGGTGGTGG";
        let q = TranslatedQuery::from_dna(dna).unwrap();
        let t = encode_protein(b"MAKFWWWW").unwrap();
        let m = ScoreMatrix::identity(5, -4);
        let letters = LetterProfile::<i16>::new(&m);

        let cheap = LaneCosts::<PortableI16>::new(12, 1, 3);
        let out = frameshift_sweep(q.strand(0), &[&t[..]], &letters, &cheap);
        assert_eq!(out[0].best.score, 40 - 3);

        // without shifts the best is FWWWW in frame 1
        let expensive = LaneCosts::<PortableI16>::new(12, 1, 1000);
        let out = frameshift_sweep(q.strand(0), &[&t[..]], &letters, &expensive);
        assert_eq!(out[0].best, BestCell { score: 25, row: 22, col: 7 });
    }
}
