//! Shared types for the SWIPE driver: target descriptors, bands, flags and
//! the emitted `Hsp` records.

use std::fmt;
use std::ops::{BitOr, BitOrAssign, Range};

use crate::core::compute::simd_abstraction::LaneWidth;
use crate::core::sequence::Sequence;
use crate::core::stats::target_matrix::AdjustedMatrix;
use crate::core::alignment::traceback::Transcript;
use crate::error::{Result, SwipeError};

/// Inclusive range of diagonals `j - i` computed for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub begin: i32,
    pub end: i32,
}

impl Band {
    pub fn new(begin: i32, end: i32) -> Result<Self> {
        if begin > end {
            return Err(SwipeError::InvalidBand { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Every diagonal of a `query_len x target_len` matrix. Diagonals beyond
    /// the `i32` range are clamped.
    pub fn full(query_len: usize, target_len: usize) -> Self {
        Self {
            begin: diagonal(1 - query_len as i64),
            end: diagonal(target_len as i64 - 1),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        (self.end as i64 - self.begin as i64 + 1) as usize
    }

    #[inline]
    pub fn contains(&self, diagonal: i32) -> bool {
        self.begin <= diagonal && diagonal <= self.end
    }

    /// Intersection with the diagonals of the matrix, `None` if empty.
    pub fn clip(&self, query_len: usize, target_len: usize) -> Option<Band> {
        let full = Band::full(query_len, target_len);
        let begin = self.begin.max(full.begin);
        let end = self.end.min(full.end);
        (begin <= end).then_some(Band { begin, end })
    }

    pub fn covers(&self, query_len: usize, target_len: usize) -> bool {
        let full = Band::full(query_len, target_len);
        self.begin <= full.begin && self.end >= full.end
    }
}

#[inline]
fn diagonal(d: i64) -> i32 {
    d.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Reading frame of a translated query: 0..3 forward, 3..6 reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Frame(pub u8);

impl Frame {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 0 for the forward strand, 1 for the reverse strand.
    #[inline]
    pub fn strand(self) -> usize {
        self.index() / 3
    }

    /// Frame of a nucleotide row offset on the strand of `self`.
    #[inline]
    pub fn on_strand(self, offset: usize) -> Frame {
        Frame((self.strand() * 3 + offset % 3) as u8)
    }
}

/// One target submitted to the driver.
#[derive(Debug, Clone, Copy)]
pub struct TargetDescriptor<'a> {
    /// Caller's identifier, copied into the `Hsp`.
    pub id: usize,
    pub seq: Sequence<'a>,
    /// Length the caller believes the target has.
    pub declared_len: usize,
    /// `None` computes the whole matrix.
    pub band: Option<Band>,
    pub frame: Frame,
    /// Per-target adjusted matrix, used when composition adjustment is on.
    pub matrix: Option<&'a AdjustedMatrix>,
}

impl<'a> TargetDescriptor<'a> {
    pub fn new(id: usize, seq: Sequence<'a>) -> Self {
        Self {
            id,
            seq,
            declared_len: seq.len(),
            band: None,
            frame: Frame(0),
            matrix: None,
        }
    }

    pub fn with_band(mut self, band: Band) -> Self {
        self.band = Some(band);
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_matrix(mut self, matrix: &'a AdjustedMatrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    pub fn with_declared_len(mut self, len: usize) -> Self {
        self.declared_len = len;
        self
    }
}

/// Driver mode flags.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct DpFlags(u32);

impl DpFlags {
    pub const NONE: DpFlags = DpFlags(0);
    /// Ignore target bands and compute whole matrices.
    pub const FULL_MATRIX: DpFlags = DpFlags(1);
    /// Codon-aware alignment of a translated query with frame shifts.
    pub const FRAME_SHIFT: DpFlags = DpFlags(1 << 1);
    /// Recover the edit path of every reported target.
    pub const TRACEBACK: DpFlags = DpFlags(1 << 2);
    /// Score targets carrying an adjusted matrix with that matrix.
    pub const COMPOSITION_ADJUSTED: DpFlags = DpFlags(1 << 3);

    #[inline]
    pub fn contains(self, other: DpFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for DpFlags {
    type Output = DpFlags;

    fn bitor(self, rhs: DpFlags) -> DpFlags {
        DpFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for DpFlags {
    fn bitor_assign(&mut self, rhs: DpFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for DpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (DpFlags::FULL_MATRIX, "FULL_MATRIX"),
            (DpFlags::FRAME_SHIFT, "FRAME_SHIFT"),
            (DpFlags::TRACEBACK, "TRACEBACK"),
            (DpFlags::COMPOSITION_ADJUSTED, "COMPOSITION_ADJUSTED"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "DpFlags({})", set.join(" | "))
    }
}

/// Recurrence used for a group of targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    Plain,
    /// Per-query-position score correction added before saturation.
    Biased,
    FrameShifted,
    /// One target at a time with its own 32-bit score rows.
    MatrixProvided,
}

/// Best cell of one lane after a sweep.
///
/// Among cells sharing the maximal score the one with the smallest row wins,
/// then the smallest column. Row is the query coordinate (nucleotide row in
/// frame-shift sweeps), column the target coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BestCell {
    pub score: i32,
    pub row: usize,
    pub col: usize,
}

impl BestCell {
    #[inline]
    pub fn offer(&mut self, score: i32, row: usize, col: usize) {
        if score > self.score
            || (score == self.score && score > 0 && (row, col) < (self.row, self.col))
        {
            *self = BestCell { score, row, col };
        }
    }
}

/// Per-lane result of one sweep at one width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneOutcome {
    pub best: BestCell,
    /// The lane reached the representable maximum; its score is a lower bound.
    pub overflow: bool,
}

/// A reported local alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Hsp {
    /// `TargetDescriptor::id` of the target.
    pub target: usize,
    pub score: i32,
    pub frame: Frame,
    /// First aligned query position, in the same units as `query_end`.
    pub query_begin: usize,
    /// One past the last aligned query position. Residues of the frame for
    /// protein and translated queries, nucleotides of the strand for
    /// frame-shift alignments.
    pub query_end: usize,
    pub target_begin: usize,
    /// One past the last aligned target residue.
    pub target_end: usize,
    pub bit_score: f64,
    pub evalue: f64,
    pub variant: KernelVariant,
    /// Lane width that produced the final score.
    pub lane_width: LaneWidth,
    pub transcript: Option<Transcript>,
}

impl Hsp {
    pub fn query_range(&self) -> Range<usize> {
        self.query_begin..self.query_end
    }

    pub fn target_range(&self) -> Range<usize> {
        self.target_begin..self.target_end
    }
}
