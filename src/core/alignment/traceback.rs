//! Alignment traceback.
//!
//! The vectorized sweeps only report scores and end cells. For targets that
//! need an alignment, a scalar 32-bit pass recomputes the band and records
//! one origin byte per cell, then walks back from the best cell.
//!
//! Among equal-scoring predecessors the walk prefers the diagonal, then a
//! frame shift, then the vertical gap, then the horizontal gap; gap states
//! prefer opening over extending.

use std::fmt;

use crate::core::alignment::types::{Band, BestCell};
use crate::core::alignment::workspace::{with_workspace, DpWorkspace};
use crate::core::compute::encoding::Letter;
use crate::core::stats::score_matrix::SubstitutionScores;

// Cell source, low three bits
pub const TB_DIAG: u8 = 1;
pub const TB_SHIFT_REVERSE: u8 = 2; // from nucleotide row r - 2
pub const TB_SHIFT_FORWARD: u8 = 3; // from nucleotide row r - 4
pub const TB_VERTICAL: u8 = 4;
pub const TB_HORIZONTAL: u8 = 5;
const TB_SOURCE: u8 = 0b111;
/// The diagonal predecessor is empty: the alignment starts here.
pub const TB_START: u8 = 1 << 3;
/// The vertical gap leaving this cell extends the one entering it.
pub const TB_VERTICAL_EXTEND: u8 = 1 << 4;
/// The horizontal gap leaving this cell extends the one entering it.
pub const TB_HORIZONTAL_EXTEND: u8 = 1 << 5;

const NEG: i32 = i32::MIN / 2;

/// One column of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    Match,
    Mismatch,
    /// Query residue against a gap.
    Insertion,
    /// Target residue against a gap.
    Deletion,
    /// The next codon starts one nucleotide later than in-frame.
    FrameshiftForward,
    /// The next codon starts one nucleotide earlier than in-frame.
    FrameshiftReverse,
}

impl EditOp {
    fn cigar_char(self) -> char {
        match self {
            EditOp::Match | EditOp::Mismatch => 'M',
            EditOp::Insertion => 'I',
            EditOp::Deletion => 'D',
            EditOp::FrameshiftForward => '/',
            EditOp::FrameshiftReverse => '\\',
        }
    }
}

/// Edit operations of one local alignment, in query order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    /// First aligned query position (nucleotide row for frame-shift alignments).
    pub query_begin: usize,
    pub target_begin: usize,
    pub ops: Vec<EditOp>,
}

impl Transcript {
    /// Number of alignment columns, frame-shift markers excluded.
    pub fn length(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| {
                !matches!(op, EditOp::FrameshiftForward | EditOp::FrameshiftReverse)
            })
            .count()
    }

    pub fn identities(&self) -> usize {
        self.ops.iter().filter(|&&op| op == EditOp::Match).count()
    }

    pub fn mismatches(&self) -> usize {
        self.ops.iter().filter(|&&op| op == EditOp::Mismatch).count()
    }

    /// Number of gap runs.
    pub fn gap_openings(&self) -> usize {
        let mut previous = None;
        let mut count = 0;
        for &op in &self.ops {
            if matches!(op, EditOp::Insertion | EditOp::Deletion) && previous != Some(op) {
                count += 1;
            }
            previous = Some(op);
        }
        count
    }

    /// Run-length encoding with `M`, `I`, `D`, `/` and `\`.
    pub fn cigar(&self) -> String {
        let mut out = String::new();
        let mut run: Option<(char, usize)> = None;
        for op in &self.ops {
            let c = op.cigar_char();
            run = match run {
                Some((prev, n)) if prev == c => Some((prev, n + 1)),
                Some((prev, n)) => {
                    out.push_str(&format!("{n}{prev}"));
                    Some((c, 1))
                }
                None => Some((c, 1)),
            };
        }
        if let Some((c, n)) = run {
            out.push_str(&format!("{n}{c}"));
        }
        out
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.cigar(), self.query_begin, self.target_begin)
    }
}

/// Score, end cell and transcript recovered by a traceback pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackResult {
    pub best: BestCell,
    pub transcript: Transcript,
}

/// Gap and frame-shift costs of the traceback pass. `gap_open` is the cost of
/// a one-residue gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracebackCosts {
    pub gap_open: i32,
    pub gap_extend: i32,
    pub frame_shift: i32,
}

#[inline]
fn pair_op(q: Letter, t: Letter) -> EditOp {
    if q == t {
        EditOp::Match
    } else {
        EditOp::Mismatch
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Cell,
    Vertical,
    Horizontal,
}

/// Traceback of one target within `band` (already clipped to the matrix).
///
/// Returns `None` when no cell scores above zero.
pub fn traceback<M: SubstitutionScores + ?Sized>(
    query: &[Letter],
    target: &[Letter],
    band: Band,
    scores: &M,
    bias: Option<&[i8]>,
    costs: &TracebackCosts,
) -> Option<TracebackResult> {
    let m = query.len();
    let width = band.width();
    if m == 0 || target.is_empty() {
        return None;
    }
    let column = |i: usize, k: usize| (i as i64 + band.begin as i64 + k as i64) as usize;
    let in_matrix = |i: usize, k: usize| {
        let j = i as i64 + band.begin as i64 + k as i64;
        j >= 0 && (j as usize) < target.len()
    };

    with_workspace(|ws| {
        let DpWorkspace { i32: buffers, origins, .. } = ws;
        let (h, vgap) = buffers.reset(width + 1);
        for x in vgap.iter_mut() {
            *x = NEG;
        }
        origins.clear();
        origins.resize(m * width, 0);
        let mut best = BestCell::default();

        for (i, &q) in query.iter().enumerate() {
            let row = scores.row(q);
            let row_bias = bias.map_or(0, |b| b[i] as i32);
            let mut horizontal_gap = NEG;
            for k in 0..width {
                if !in_matrix(i, k) {
                    h[k] = 0;
                    vgap[k] = NEG;
                    horizontal_gap = NEG;
                    continue;
                }
                let j = column(i, k);
                let diagonal = h[k];
                let vertical = vgap[k + 1];
                let matched = diagonal + row[target[j] as usize] + row_bias;

                let (cell, mut origin) = if matched >= vertical && matched >= horizontal_gap {
                    (matched, TB_DIAG)
                } else if vertical >= horizontal_gap {
                    (vertical, TB_VERTICAL)
                } else {
                    (horizontal_gap, TB_HORIZONTAL)
                };
                let cell = cell.max(0);
                if diagonal == 0 {
                    origin |= TB_START;
                }

                let open = cell - costs.gap_open;
                let vertical_ext = vertical.saturating_sub(costs.gap_extend);
                if vertical_ext > open {
                    origin |= TB_VERTICAL_EXTEND;
                }
                let horizontal_ext = horizontal_gap.saturating_sub(costs.gap_extend);
                if horizontal_ext > open {
                    origin |= TB_HORIZONTAL_EXTEND;
                }
                vgap[k] = vertical_ext.max(open);
                horizontal_gap = horizontal_ext.max(open);
                h[k] = cell;
                origins[i * width + k] = origin;
                best.offer(cell, i, j);
            }
        }

        if best.score <= 0 {
            return None;
        }

        let origin_at = |i: usize, j: usize| {
            let k = (j as i64 - i as i64 - band.begin as i64) as usize;
            origins[i * width + k]
        };
        let mut ops = Vec::new();
        let (mut i, mut j) = (best.row, best.col);
        let mut state = State::Cell;
        loop {
            match state {
                State::Cell => match origin_at(i, j) & TB_SOURCE {
                    TB_VERTICAL => state = State::Vertical,
                    TB_HORIZONTAL => state = State::Horizontal,
                    _ => {
                        ops.push(pair_op(query[i], target[j]));
                        if origin_at(i, j) & TB_START != 0 || i == 0 || j == 0 {
                            break;
                        }
                        i -= 1;
                        j -= 1;
                    }
                },
                State::Vertical => {
                    ops.push(EditOp::Insertion);
                    i -= 1;
                    if origin_at(i, j) & TB_VERTICAL_EXTEND == 0 {
                        state = State::Cell;
                    }
                }
                State::Horizontal => {
                    ops.push(EditOp::Deletion);
                    j -= 1;
                    if origin_at(i, j) & TB_HORIZONTAL_EXTEND == 0 {
                        state = State::Cell;
                    }
                }
            }
        }
        ops.reverse();
        Some(TracebackResult {
            best,
            transcript: Transcript {
                query_begin: i,
                target_begin: j,
                ops,
            },
        })
    })
}

/// Frame-shift traceback of one target against the three frames of a strand.
/// Rows are nucleotide offsets on the strand; the whole matrix is computed.
pub fn traceback_frameshift<M: SubstitutionScores + ?Sized>(
    frames: [&[Letter]; 3],
    target: &[Letter],
    scores: &M,
    costs: &TracebackCosts,
) -> Option<TracebackResult> {
    let rows = super::swipe::frameshift::frameshift_rows(frames);
    let n = target.len();
    if rows == 0 || n == 0 {
        return None;
    }
    let letter = |r: usize| frames[r % 3][r / 3];

    with_workspace(|ws| {
        let DpWorkspace { i32: buffers, origins, .. } = ws;
        // h and the vertical gaps, both (rows + 1) x (n + 1) with a zero border
        let stride = n + 1;
        let (h, vgap) = buffers.reset((rows + 1) * stride);
        for x in vgap.iter_mut() {
            *x = NEG;
        }
        origins.clear();
        origins.resize(rows * n, 0);
        let at = |r: usize, j: usize| (r + 1) * stride + j + 1;
        let h_at = |h: &[i32], r: usize, back: usize, j: usize| {
            if r >= back && j > 0 {
                h[at(r - back, j - 1)]
            } else {
                0
            }
        };
        let mut best = BestCell::default();

        for r in 0..rows {
            let row = scores.row(letter(r));
            let mut horizontal_gap = NEG;
            for j in 0..n {
                let s = row[target[j] as usize];
                let diagonal = h_at(&*h, r, 3, j);
                let matched = diagonal + s;
                let reverse = h_at(&*h, r, 2, j) + s - costs.frame_shift;
                let forward = h_at(&*h, r, 4, j) + s - costs.frame_shift;
                let vertical = if r >= 3 { vgap[at(r - 3, j)] } else { NEG };

                let mut cell = matched;
                let mut origin = TB_DIAG;
                for (value, source) in [
                    (reverse, TB_SHIFT_REVERSE),
                    (forward, TB_SHIFT_FORWARD),
                    (vertical, TB_VERTICAL),
                    (horizontal_gap, TB_HORIZONTAL),
                ] {
                    if value > cell {
                        cell = value;
                        origin = source;
                    }
                }
                let cell = cell.max(0);
                if diagonal == 0 {
                    origin |= TB_START;
                }

                let open = cell - costs.gap_open;
                let vertical_ext = vertical.saturating_sub(costs.gap_extend);
                if vertical_ext > open {
                    origin |= TB_VERTICAL_EXTEND;
                }
                let horizontal_ext = horizontal_gap.saturating_sub(costs.gap_extend);
                if horizontal_ext > open {
                    origin |= TB_HORIZONTAL_EXTEND;
                }
                vgap[at(r, j)] = vertical_ext.max(open);
                horizontal_gap = horizontal_ext.max(open);
                h[at(r, j)] = cell;
                origins[r * n + j] = origin;
                best.offer(cell, r, j);
            }
        }

        if best.score <= 0 {
            return None;
        }

        let mut ops = Vec::new();
        let (mut r, mut j) = (best.row, best.col);
        let mut state = State::Cell;
        loop {
            let origin = origins[r * n + j];
            match state {
                State::Cell => match origin & TB_SOURCE {
                    TB_VERTICAL => state = State::Vertical,
                    TB_HORIZONTAL => state = State::Horizontal,
                    TB_SHIFT_REVERSE => {
                        ops.push(pair_op(letter(r), target[j]));
                        ops.push(EditOp::FrameshiftReverse);
                        r -= 2;
                        j -= 1;
                    }
                    TB_SHIFT_FORWARD => {
                        ops.push(pair_op(letter(r), target[j]));
                        ops.push(EditOp::FrameshiftForward);
                        r -= 4;
                        j -= 1;
                    }
                    _ => {
                        ops.push(pair_op(letter(r), target[j]));
                        if origin & TB_START != 0 || r < 3 || j == 0 {
                            break;
                        }
                        r -= 3;
                        j -= 1;
                    }
                },
                State::Vertical => {
                    ops.push(EditOp::Insertion);
                    r -= 3;
                    if origins[r * n + j] & TB_VERTICAL_EXTEND == 0 {
                        state = State::Cell;
                    }
                }
                State::Horizontal => {
                    ops.push(EditOp::Deletion);
                    j -= 1;
                    if origins[r * n + j] & TB_HORIZONTAL_EXTEND == 0 {
                        state = State::Cell;
                    }
                }
            }
        }
        ops.reverse();
        Some(TracebackResult {
            best,
            transcript: Transcript {
                query_begin: r,
                target_begin: j,
                ops,
            },
        })
    })
}

/// Recomputes the score of a protein transcript.
pub fn replay_score<M: SubstitutionScores + ?Sized>(
    transcript: &Transcript,
    query: &[Letter],
    target: &[Letter],
    scores: &M,
    bias: Option<&[i8]>,
    costs: &TracebackCosts,
) -> i32 {
    let (mut i, mut j) = (transcript.query_begin, transcript.target_begin);
    let mut total = 0;
    let mut previous = None;
    for &op in &transcript.ops {
        match op {
            EditOp::Match | EditOp::Mismatch => {
                total += scores.score(query[i], target[j]) + bias.map_or(0, |b| b[i] as i32);
                i += 1;
                j += 1;
            }
            EditOp::Insertion | EditOp::Deletion => {
                total -= if previous == Some(op) {
                    costs.gap_extend
                } else {
                    costs.gap_open
                };
                if op == EditOp::Insertion {
                    i += 1;
                } else {
                    j += 1;
                }
            }
            EditOp::FrameshiftForward | EditOp::FrameshiftReverse => {}
        }
        previous = Some(op);
    }
    total
}

/// Recomputes the score of a frame-shift transcript against one strand.
pub fn replay_frameshift_score<M: SubstitutionScores + ?Sized>(
    transcript: &Transcript,
    frames: [&[Letter]; 3],
    target: &[Letter],
    scores: &M,
    costs: &TracebackCosts,
) -> i32 {
    let (mut r, mut j) = (transcript.query_begin, transcript.target_begin);
    let mut total = 0;
    let mut previous = None;
    for &op in &transcript.ops {
        match op {
            EditOp::Match | EditOp::Mismatch => {
                total += scores.score(frames[r % 3][r / 3], target[j]);
                r += 3;
                j += 1;
            }
            EditOp::Insertion => {
                total -= if previous == Some(op) {
                    costs.gap_extend
                } else {
                    costs.gap_open
                };
                r += 3;
            }
            EditOp::Deletion => {
                total -= if previous == Some(op) {
                    costs.gap_extend
                } else {
                    costs.gap_open
                };
                j += 1;
            }
            EditOp::FrameshiftForward => {
                total -= costs.frame_shift;
                r += 1;
            }
            EditOp::FrameshiftReverse => {
                total -= costs.frame_shift;
                r -= 1;
            }
        }
        previous = Some(op);
    }
    total
}
