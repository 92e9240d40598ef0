//! Per-cell affine-gap recurrences.
//!
//! All variants share one shape:
//!
//! ```text
//! current = saturate(max(diagonal + score, vertical_gap, horizontal_gap))
//! best    = max(best, current)
//! vgap    = max(vgap - extend, current - open)
//! hgap    = max(hgap - extend, current - open)
//! ```
//!
//! `gap_open` here is the cost of a one-residue gap (open + extend in
//! configuration terms). The return value is the new cell, which becomes the
//! diagonal input one row and one column further on.
//!
//! A `CellMask` clamps cells that lie outside a lane's band or past the end of
//! its target: their value is forced to 0 and their gap states to the lane
//! minimum so that nothing leaks into valid cells.

use crate::core::compute::encoding::Letter;
use crate::core::compute::simd_abstraction::{LaneScore, ScoreLane, WideScalar, MAX_LANES};

/// Caps applied to cell and gap values.
pub trait CellMask<L: ScoreLane> {
    fn cap_cell(&self, v: L) -> L;
    fn cap_gap(&self, v: L) -> L;
}

/// Every lane open.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMask;

impl<L: ScoreLane> CellMask<L> for NoMask {
    #[inline(always)]
    fn cap_cell(&self, v: L) -> L {
        v
    }

    #[inline(always)]
    fn cap_gap(&self, v: L) -> L {
        v
    }
}

/// Per-lane open/blocked caps.
#[derive(Debug, Clone, Copy)]
pub struct LaneMask<L: ScoreLane> {
    cell: L,
    gap: L,
}

impl<L: ScoreLane> LaneMask<L> {
    /// Lane `l` is open when `is_open(l)` holds.
    #[inline]
    pub fn from_fn(is_open: impl Fn(usize) -> bool) -> Self {
        let mut cell = [L::Score::ZERO; MAX_LANES];
        let mut gap = [L::Score::MIN; MAX_LANES];
        for l in 0..L::LANES {
            if is_open(l) {
                cell[l] = L::Score::MAX;
                gap[l] = L::Score::MAX;
            }
        }
        Self {
            cell: L::load(&cell[..L::LANES]),
            gap: L::load(&gap[..L::LANES]),
        }
    }
}

impl<L: ScoreLane> CellMask<L> for LaneMask<L> {
    #[inline(always)]
    fn cap_cell(&self, v: L) -> L {
        v.min(self.cell)
    }

    #[inline(always)]
    fn cap_gap(&self, v: L) -> L {
        v.min(self.gap)
    }
}

#[inline(always)]
fn finish<L: ScoreLane, M: CellMask<L>>(
    current_cell: L,
    gap_extension: L,
    gap_open: L,
    horizontal_gap: &mut L,
    vertical_gap: &mut L,
    best: &mut L,
    mask: &M,
) -> L {
    let current_cell = mask.cap_cell(current_cell.saturate());
    *best = best.max(current_cell);
    let vg = vertical_gap.subs(gap_extension);
    let hg = horizontal_gap.subs(gap_extension);
    let open = current_cell.subs(gap_open);
    *vertical_gap = mask.cap_gap(vg.max(open));
    *horizontal_gap = mask.cap_gap(hg.max(open));
    current_cell
}

/// Plain affine-gap cell.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub fn cell_update<L: ScoreLane, M: CellMask<L>>(
    diagonal_cell: L,
    scores: L,
    gap_extension: L,
    gap_open: L,
    horizontal_gap: &mut L,
    vertical_gap: &mut L,
    best: &mut L,
    mask: &M,
) -> L {
    let current_cell = diagonal_cell
        .adds(scores)
        .max(*vertical_gap)
        .max(*horizontal_gap);
    finish(
        current_cell,
        gap_extension,
        gap_open,
        horizontal_gap,
        vertical_gap,
        best,
        mask,
    )
}

/// Composition-biased cell: `query_bias` joins the score before saturation.
/// Pass a splatted scalar for a per-position correction or a full vector for
/// per-lane corrections.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub fn cell_update_biased<L: ScoreLane, M: CellMask<L>>(
    diagonal_cell: L,
    scores: L,
    query_bias: L,
    gap_extension: L,
    gap_open: L,
    horizontal_gap: &mut L,
    vertical_gap: &mut L,
    best: &mut L,
    mask: &M,
) -> L {
    cell_update(
        diagonal_cell,
        scores.adds(query_bias),
        gap_extension,
        gap_open,
        horizontal_gap,
        vertical_gap,
        best,
        mask,
    )
}

/// Frame-shifted cell for translated alignment.
///
/// `shift_cell0` and `shift_cell1` are the cells one nucleotide behind and
/// one nucleotide ahead of the in-frame diagonal; both pay `frame_shift`.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub fn cell_update_frameshift<L: ScoreLane, M: CellMask<L>>(
    diagonal_cell: L,
    shift_cell0: L,
    shift_cell1: L,
    scores: L,
    gap_extension: L,
    gap_open: L,
    frame_shift: L,
    horizontal_gap: &mut L,
    vertical_gap: &mut L,
    best: &mut L,
    mask: &M,
) -> L {
    let shifted = scores.subs(frame_shift);
    let current_cell = diagonal_cell
        .adds(scores)
        .max(shift_cell0.adds(shifted))
        .max(shift_cell1.adds(shifted))
        .max(*vertical_gap)
        .max(*horizontal_gap);
    finish(
        current_cell,
        gap_extension,
        gap_open,
        horizontal_gap,
        vertical_gap,
        best,
        mask,
    )
}

/// Single-target cell reading its score from a 32-bit matrix row.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub fn cell_update_matrix<M: CellMask<WideScalar>>(
    diagonal_cell: WideScalar,
    row: &[i32],
    target_letter: Letter,
    gap_extension: WideScalar,
    gap_open: WideScalar,
    horizontal_gap: &mut WideScalar,
    vertical_gap: &mut WideScalar,
    best: &mut WideScalar,
    mask: &M,
) -> WideScalar {
    cell_update(
        diagonal_cell,
        WideScalar::splat(row[target_letter as usize]),
        gap_extension,
        gap_open,
        horizontal_gap,
        vertical_gap,
        best,
        mask,
    )
}

/// Gap and frame-shift costs broadcast to one lane type.
#[derive(Debug, Clone, Copy)]
pub struct LaneCosts<L: ScoreLane> {
    pub gap_open: L,
    pub gap_extension: L,
    pub frame_shift: L,
}

impl<L: ScoreLane> LaneCosts<L> {
    /// `gap_open` is the one-residue gap cost.
    pub fn new(gap_open: i32, gap_extension: i32, frame_shift: i32) -> Self {
        Self {
            gap_open: L::splat(L::Score::from_i32(gap_open)),
            gap_extension: L::splat(L::Score::from_i32(gap_extension)),
            frame_shift: L::splat(L::Score::from_i32(frame_shift)),
        }
    }
}
