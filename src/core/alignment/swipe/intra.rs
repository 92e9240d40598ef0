//! Intra-target sweep: one target, adjacent band diagonals packed into the
//! lanes of a vector.
//!
//! For row `i`, lane `l` of chunk `c` holds band column `k = c * LANES + l`,
//! i.e. target column `j = i + begin + k`. The diagonal predecessor sits in
//! the same lane of the previous row, the vertical one in lane `l + 1`, and
//! the horizontal one in lane `l - 1` of the current row. The horizontal
//! dependency is resolved by re-running the chunk until the gap values
//! shifted in from the left no longer change any non-negative lane.

use super::inter::{bias_lanes, update};
use crate::core::alignment::cell_update::{LaneCosts, LaneMask};
use crate::core::alignment::profile::SubstitutionProfile;
use crate::core::alignment::types::{Band, BestCell, LaneOutcome};
use crate::core::alignment::workspace::{with_workspace, WorkspaceScore};
use crate::core::compute::encoding::{Letter, MASK_LETTER};
use crate::core::compute::simd_abstraction::{LaneScore, ScoreLane, MAX_LANES};

/// Sweep one target restricted to `band` (already clipped to the matrix).
pub fn intra_target_sweep<L>(
    query: &[Letter],
    bias: Option<&[i8]>,
    target: &[Letter],
    band: Band,
    profile: &SubstitutionProfile<L::Score>,
    costs: &LaneCosts<L>,
) -> LaneOutcome
where
    L: ScoreLane,
    L::Score: WorkspaceScore,
{
    let lanes = L::LANES;
    let m = query.len();
    let width = band.width();
    let mut best = BestCell::default();
    if m == 0 || target.is_empty() {
        return LaneOutcome::default();
    }
    let chunks = width.div_ceil(lanes);
    let bias = bias_lanes::<L>(bias);
    let min = L::Score::MIN;

    with_workspace(|ws| {
        let (h, vgap) = L::Score::buffers(ws).reset(chunks * lanes);
        let mut residues = [MASK_LETTER; MAX_LANES];
        let mut open = [false; MAX_LANES];

        for i in 0..m {
            let row = profile.build(i);
            let row_bias = bias.as_ref().map(|b| b[i]);
            let mut carry = min;
            let mut row_best = L::zero();

            for c in 0..chunks {
                let off = c * lanes;
                let diagonal = L::load(&h[off..]);
                let next_first = if c + 1 < chunks { vgap[off + lanes] } else { min };
                let vertical_in = L::load(&vgap[off..]).shift_down(next_first);

                for l in 0..lanes {
                    let k = off + l;
                    let j = i as i64 + band.begin as i64 + k as i64;
                    open[l] = k < width && j >= 0 && (j as usize) < target.len();
                    residues[l] = if open[l] { target[j as usize] } else { MASK_LETTER };
                }
                let scores = L::gather(row, &residues[..lanes]);
                let mask = LaneMask::<L>::from_fn(|l| open[l]);

                let mut horizontal_in = L::splat(min).with_lane(0, carry);
                loop {
                    let mut horizontal_gap = horizontal_in;
                    let mut vertical_gap = vertical_in;
                    let mut chunk_best = L::zero();
                    let current = update(
                        diagonal,
                        scores,
                        row_bias,
                        costs,
                        &mut horizontal_gap,
                        &mut vertical_gap,
                        &mut chunk_best,
                        &mask,
                    );
                    let propagated = horizontal_gap.shift_up(carry).max(horizontal_in);
                    if propagated.saturate().lanes_eq(horizontal_in.saturate()) {
                        current.store(&mut h[off..]);
                        vertical_gap.store(&mut vgap[off..]);
                        carry = horizontal_gap.lane(lanes - 1);
                        row_best = row_best.max(chunk_best);
                        break;
                    }
                    horizontal_in = propagated;
                }
            }

            let s = row_best.hmax().to_i32();
            if s > 0 && s >= best.score {
                if let Some(k) = (0..width).find(|&k| h[k].to_i32() == s) {
                    let j = (i as i64 + band.begin as i64 + k as i64) as usize;
                    best.offer(s, i, j);
                }
            }
        }
    });

    LaneOutcome {
        best,
        overflow: best.score >= L::Score::MAX.to_i32(),
    }
}
