//! Inter-target sweeps: each lane holds a different target.
//!
//! `full_matrix_sweep` walks target columns and keeps one cell and one
//! horizontal-gap row per query position (SoA: `row * LANES + lane`).
//! `banded_sweep` walks query rows in band coordinates `k = j - i - begin`,
//! keeping one cell and one vertical-gap row per band column.

use crate::core::alignment::cell_update::{
    cell_update, cell_update_biased, CellMask, LaneCosts, LaneMask, NoMask,
};
use crate::core::alignment::profile::{LetterProfile, SubstitutionProfile, SwipeProfile};
use crate::core::alignment::types::{Band, BestCell, LaneOutcome};
use crate::core::alignment::workspace::{with_workspace, WorkspaceScore};
use crate::core::compute::encoding::{Letter, MASK_LETTER};
use crate::core::compute::simd_abstraction::{LaneScore, ScoreLane, MAX_LANES};

/// A target and its clipped band, as packed into one lane.
#[derive(Debug, Clone, Copy)]
pub struct BandedTarget<'a> {
    pub letters: &'a [Letter],
    pub band: Band,
}

pub(crate) fn bias_lanes<L: ScoreLane>(bias: Option<&[i8]>) -> Option<Vec<L>> {
    bias.map(|b| {
        b.iter()
            .map(|&x| L::splat(L::Score::from_i32(x as i32)))
            .collect()
    })
}

pub(crate) fn outcomes<S: LaneScore>(best: &[BestCell]) -> Vec<LaneOutcome> {
    let max = S::MAX.to_i32();
    best.iter()
        .map(|&b| LaneOutcome {
            best: b,
            overflow: b.score >= max,
        })
        .collect()
}

/// Plain or biased cell, depending on whether a query bias is present.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub(crate) fn update<L: ScoreLane, M: CellMask<L>>(
    diagonal: L,
    scores: L,
    bias: Option<L>,
    costs: &LaneCosts<L>,
    horizontal_gap: &mut L,
    vertical_gap: &mut L,
    best: &mut L,
    mask: &M,
) -> L {
    match bias {
        Some(b) => cell_update_biased(
            diagonal,
            scores,
            b,
            costs.gap_extension,
            costs.gap_open,
            horizontal_gap,
            vertical_gap,
            best,
            mask,
        ),
        None => cell_update(
            diagonal,
            scores,
            costs.gap_extension,
            costs.gap_open,
            horizontal_gap,
            vertical_gap,
            best,
            mask,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn full_column<L: ScoreLane, M: CellMask<L>>(
    query: &[Letter],
    bias: Option<&[L]>,
    profile: &SwipeProfile<L>,
    costs: &LaneCosts<L>,
    h: &mut [L::Score],
    hgap: &mut [L::Score],
    mask: &M,
) -> L {
    let lanes = L::LANES;
    let mut vertical_gap = L::splat(L::Score::MIN);
    let mut diagonal = L::zero();
    let mut best = L::zero();
    for (i, &q) in query.iter().enumerate() {
        let off = i * lanes;
        let mut horizontal_gap = L::load(&hgap[off..]);
        let left = L::load(&h[off..]);
        let scores = profile.get(q);
        let current = update(
            diagonal,
            scores,
            bias.map(|b| b[i]),
            costs,
            &mut horizontal_gap,
            &mut vertical_gap,
            &mut best,
            mask,
        );
        diagonal = left;
        current.store(&mut h[off..]);
        horizontal_gap.store(&mut hgap[off..]);
    }
    best
}

/// Full-matrix sweep of up to `L::LANES` targets against one query.
pub fn full_matrix_sweep<L>(
    query: &[Letter],
    bias: Option<&[i8]>,
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
    let m = query.len();
    let max_len = targets.iter().map(|t| t.len()).max().unwrap_or(0);
    let mut best = vec![BestCell::default(); targets.len()];
    if m == 0 || max_len == 0 {
        return outcomes::<L::Score>(&best);
    }
    let bias = bias_lanes::<L>(bias);

    with_workspace(|ws| {
        let (h, hgap) = L::Score::buffers(ws).reset(m * lanes);
        let mut profile = SwipeProfile::<L>::new();
        let mut residues = [MASK_LETTER; MAX_LANES];

        for j in 0..max_len {
            let mut all_open = targets.len() == lanes;
            for (l, t) in targets.iter().enumerate() {
                if j < t.len() {
                    residues[l] = t[j];
                } else {
                    residues[l] = MASK_LETTER;
                    all_open = false;
                }
            }
            profile.set(letters, &residues[..lanes]);

            let column_best = if all_open {
                full_column(query, bias.as_deref(), &profile, costs, h, hgap, &NoMask)
            } else {
                let mask = LaneMask::<L>::from_fn(|l| l < targets.len() && j < targets[l].len());
                full_column(query, bias.as_deref(), &profile, costs, h, hgap, &mask)
            };

            for (l, cell) in best.iter_mut().enumerate() {
                let s = column_best.lane(l).to_i32();
                if s > 0 && s >= cell.score {
                    if let Some(i) = (0..m).find(|&i| h[i * lanes + l].to_i32() == s) {
                        cell.offer(s, i, j);
                    }
                }
            }
        }
    });

    outcomes::<L::Score>(&best)
}

/// Banded sweep of up to `L::LANES` targets, each restricted to its own
/// (already clipped) band.
pub fn banded_sweep<L>(
    query: &[Letter],
    bias: Option<&[i8]>,
    targets: &[BandedTarget<'_>],
    profile: &SubstitutionProfile<L::Score>,
    costs: &LaneCosts<L>,
) -> Vec<LaneOutcome>
where
    L: ScoreLane,
    L::Score: WorkspaceScore,
{
    let lanes = L::LANES;
    assert!(targets.len() <= lanes, "batch larger than lane count");
    let m = query.len();
    let width = targets.iter().map(|t| t.band.width()).max().unwrap_or(0);
    let mut best = vec![BestCell::default(); targets.len()];
    if m == 0 || width == 0 {
        return outcomes::<L::Score>(&best);
    }
    let bias = bias_lanes::<L>(bias);

    with_workspace(|ws| {
        // one extra band column holds the vertical-gap sentinel
        let (h, vgap) = L::Score::buffers(ws).reset((width + 1) * lanes);
        let mut residues = [MASK_LETTER; MAX_LANES];
        let mut open = [false; MAX_LANES];

        for i in 0..m {
            let row = profile.build(i);
            let mut horizontal_gap = L::splat(L::Score::MIN);
            let mut row_best = L::zero();

            for k in 0..width {
                let mut all_open = targets.len() == lanes;
                for (l, t) in targets.iter().enumerate() {
                    let j = i as i64 + t.band.begin as i64 + k as i64;
                    open[l] = k < t.band.width() && j >= 0 && (j as usize) < t.letters.len();
                    residues[l] = if open[l] { t.letters[j as usize] } else { MASK_LETTER };
                    all_open &= open[l];
                }
                let scores = L::gather(row, &residues[..lanes]);
                let diagonal = L::load(&h[k * lanes..]);
                let mut vertical_gap = L::load(&vgap[(k + 1) * lanes..]);
                let row_bias = bias.as_ref().map(|b| b[i]);
                let current = if all_open {
                    update(
                        diagonal,
                        scores,
                        row_bias,
                        costs,
                        &mut horizontal_gap,
                        &mut vertical_gap,
                        &mut row_best,
                        &NoMask,
                    )
                } else {
                    let mask = LaneMask::<L>::from_fn(|l| open[l]);
                    update(
                        diagonal,
                        scores,
                        row_bias,
                        costs,
                        &mut horizontal_gap,
                        &mut vertical_gap,
                        &mut row_best,
                        &mask,
                    )
                };
                current.store(&mut h[k * lanes..]);
                vertical_gap.store(&mut vgap[k * lanes..]);
            }

            for (l, cell) in best.iter_mut().enumerate() {
                let s = row_best.lane(l).to_i32();
                if s > 0 && s >= cell.score {
                    let t = &targets[l];
                    if let Some(k) = (0..t.band.width()).find(|&k| h[k * lanes + l].to_i32() == s) {
                        let j = (i as i64 + t.band.begin as i64 + k as i64) as usize;
                        cell.offer(s, i, j);
                    }
                }
            }
        }
    });

    outcomes::<L::Score>(&best)
}
