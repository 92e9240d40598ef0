//! Single-target sweep with a target-specific 32-bit matrix.
//!
//! Composition-adjusted matrices differ per target, so targets cannot share a
//! profile; each one runs alone in a one-lane 32-bit vector, which also means
//! it never overflows.

use crate::core::alignment::cell_update::{cell_update_matrix, LaneCosts, NoMask};
use crate::core::alignment::types::{Band, BestCell, LaneOutcome};
use crate::core::alignment::workspace::with_workspace;
use crate::core::compute::encoding::Letter;
use crate::core::compute::simd_abstraction::{LaneScore, ScoreLane, WideScalar};
use crate::core::stats::score_matrix::SubstitutionScores;

pub fn matrix_sweep<M: SubstitutionScores + ?Sized>(
    query: &[Letter],
    target: &[Letter],
    band: Band,
    matrix: &M,
    costs: &LaneCosts<WideScalar>,
) -> LaneOutcome {
    let m = query.len();
    let width = band.width();
    let mut best = BestCell::default();
    if m == 0 || target.is_empty() {
        return LaneOutcome::default();
    }

    with_workspace(|ws| {
        let (h, vgap) = ws.i32.reset(width + 1);

        for (i, &q) in query.iter().enumerate() {
            let row = matrix.row(q);
            let mut horizontal_gap = WideScalar::splat(i32::MIN);
            let mut row_best = WideScalar::zero();

            for k in 0..width {
                let j = i as i64 + band.begin as i64 + k as i64;
                if j < 0 || j as usize >= target.len() {
                    h[k] = 0;
                    vgap[k] = i32::MIN;
                    horizontal_gap = WideScalar::splat(i32::MIN);
                    continue;
                }
                let mut vertical_gap = WideScalar::load(&vgap[k + 1..]);
                let current = cell_update_matrix(
                    WideScalar::load(&h[k..]),
                    row,
                    target[j as usize],
                    costs.gap_extension,
                    costs.gap_open,
                    &mut horizontal_gap,
                    &mut vertical_gap,
                    &mut row_best,
                    &NoMask,
                );
                current.store(&mut h[k..]);
                vertical_gap.store(&mut vgap[k..]);
            }

            let s = row_best.lane(0).to_i32();
            if s > 0 && s >= best.score {
                if let Some(k) = (0..width).find(|&k| h[k] == s) {
                    best.offer(s, i, (i as i64 + band.begin as i64 + k as i64) as usize);
                }
            }
        }
    });

    LaneOutcome {
        best,
        overflow: false,
    }
}
