//! Score lane abstraction
//!
//! This module exposes one small capability interface, `ScoreLane`, that every
//! DP kernel in the crate is written against. A lane vector holds `LANES`
//! saturating signed integers of one width (8, 16 or 32 bit); each lane is one
//! alignment in flight (a target, a diagonal or a frame depending on packing).
//!
//! ## Engines and widths
//!
//! - `ScoreVector<S, N>` (`portable.rs`): scalar loop over lanes. Exists for
//!   every width and every architecture and is the semantic reference.
//! - `engine128`: 128-bit native vectors, 16 lanes of i8 / 8 lanes of i16
//!   (SSE2 on x86_64; NEON on aarch64).
//!
//! Native engines must be lane-for-lane equivalent to the portable baseline;
//! they are a performance detail, never a semantic variation.
//!
//! ## Runtime dispatch pattern
//!
//! 1) Detect the engine once: `detect_optimal_simd_engine()`
//! 2) Dispatch: the driver matches on `(engine, width)` and instantiates the
//!    generic sweep with the matching lane type.

use std::fmt::Debug;

use crate::core::compute::encoding::Letter;

pub mod engine128;
pub mod portable;
pub mod simd;

pub use portable::ScoreVector;
pub use simd::{detect_optimal_simd_engine, simd_engine_description, SimdEngineType};

/// Upper bound on `ScoreLane::LANES` across all engines. Sizes stack buffers
/// used by the default lane accessors.
pub const MAX_LANES: usize = 64;

/// Integer width of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LaneWidth {
    W8,
    W16,
    W32,
}

impl LaneWidth {
    /// Next wider width, `None` at 32 bits.
    pub fn promote(self) -> Option<LaneWidth> {
        match self {
            LaneWidth::W8 => Some(LaneWidth::W16),
            LaneWidth::W16 => Some(LaneWidth::W32),
            LaneWidth::W32 => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            LaneWidth::W8 => 8,
            LaneWidth::W16 => 16,
            LaneWidth::W32 => 32,
        }
    }

    /// Largest score representable at this width.
    pub fn max_score(self) -> i32 {
        match self {
            LaneWidth::W8 => i8::MAX as i32,
            LaneWidth::W16 => i16::MAX as i32,
            LaneWidth::W32 => i32::MAX,
        }
    }
}

/// Scalar element of a lane vector.
pub trait LaneScore: Copy + Ord + Default + Debug + Send + Sync + 'static {
    const MIN: Self;
    const MAX: Self;
    const ZERO: Self;
    const WIDTH: LaneWidth;

    /// Conversion that clamps into the representable range.
    fn from_i32(v: i32) -> Self;
    fn to_i32(self) -> i32;
    fn sat_add(self, other: Self) -> Self;
    fn sat_sub(self, other: Self) -> Self;
}

macro_rules! impl_lane_score {
    ($t:ty, $width:expr) => {
        impl LaneScore for $t {
            const MIN: Self = <$t>::MIN;
            const MAX: Self = <$t>::MAX;
            const ZERO: Self = 0;
            const WIDTH: LaneWidth = $width;

            #[inline(always)]
            fn from_i32(v: i32) -> Self {
                v.clamp(<$t>::MIN as i32, <$t>::MAX as i32) as $t
            }

            #[inline(always)]
            fn to_i32(self) -> i32 {
                self as i32
            }

            #[inline(always)]
            fn sat_add(self, other: Self) -> Self {
                self.saturating_add(other)
            }

            #[inline(always)]
            fn sat_sub(self, other: Self) -> Self {
                self.saturating_sub(other)
            }
        }
    };
}

impl_lane_score!(i8, LaneWidth::W8);
impl_lane_score!(i16, LaneWidth::W16);
impl_lane_score!(i32, LaneWidth::W32);

/// A fixed-width vector of saturating scores.
///
/// All arithmetic is total: results clamp at `Score::MIN` / `Score::MAX`
/// instead of wrapping. `load`/`store` panic if the slice is shorter than
/// `LANES`.
pub trait ScoreLane: Copy + Debug + Send + Sync {
    type Score: LaneScore;
    const LANES: usize;

    fn splat(v: Self::Score) -> Self;
    fn load(src: &[Self::Score]) -> Self;
    fn store(self, dst: &mut [Self::Score]);
    fn adds(self, other: Self) -> Self;
    fn subs(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
    fn min(self, other: Self) -> Self;

    #[inline(always)]
    fn zero() -> Self {
        Self::splat(Self::Score::ZERO)
    }

    /// Clamps every lane into `[0, Score::MAX]`. The upper bound already holds
    /// by saturating arithmetic; the lower bound is the local-alignment floor.
    #[inline(always)]
    fn saturate(self) -> Self {
        self.max(Self::zero())
    }

    /// Lane `l` takes `row[residues[l]]`. Lanes past `residues.len()` read 0.
    #[inline]
    fn gather(row: &[Self::Score], residues: &[Letter]) -> Self {
        let mut buf = [Self::Score::ZERO; MAX_LANES];
        for (slot, &r) in buf.iter_mut().zip(residues.iter().take(Self::LANES)) {
            *slot = row[r as usize];
        }
        Self::load(&buf[..Self::LANES])
    }

    #[inline]
    fn to_array(self) -> [Self::Score; MAX_LANES] {
        let mut buf = [Self::Score::ZERO; MAX_LANES];
        self.store(&mut buf[..Self::LANES]);
        buf
    }

    #[inline]
    fn lane(self, i: usize) -> Self::Score {
        self.to_array()[i]
    }

    #[inline]
    fn with_lane(self, i: usize, v: Self::Score) -> Self {
        let mut buf = self.to_array();
        buf[i] = v;
        Self::load(&buf[..Self::LANES])
    }

    /// Moves every lane one position up (lane `l` takes lane `l - 1`); lane 0
    /// takes `fill`.
    #[inline]
    fn shift_up(self, fill: Self::Score) -> Self {
        let src = self.to_array();
        let mut buf = [fill; MAX_LANES];
        buf[1..Self::LANES].copy_from_slice(&src[..Self::LANES - 1]);
        Self::load(&buf[..Self::LANES])
    }

    /// Moves every lane one position down (lane `l` takes lane `l + 1`); the
    /// last lane takes `fill`.
    #[inline]
    fn shift_down(self, fill: Self::Score) -> Self {
        let src = self.to_array();
        let mut buf = [fill; MAX_LANES];
        buf[..Self::LANES - 1].copy_from_slice(&src[1..Self::LANES]);
        Self::load(&buf[..Self::LANES])
    }

    #[inline]
    fn lanes_eq(self, other: Self) -> bool {
        let a = self.to_array();
        let b = other.to_array();
        a[..Self::LANES] == b[..Self::LANES]
    }

    /// Largest lane value.
    #[inline]
    fn hmax(self) -> Self::Score {
        let a = self.to_array();
        a[..Self::LANES]
            .iter()
            .copied()
            .max()
            .unwrap_or(Self::Score::MIN)
    }
}

// ============================================================================
// LANE TYPE ALIASES
// ============================================================================

pub type PortableI8 = ScoreVector<i8, 16>;
pub type PortableI16 = ScoreVector<i16, 8>;
pub type PortableI32 = ScoreVector<i32, 8>;

/// Single 32-bit lane for one-target-at-a-time kernels.
pub type WideScalar = ScoreVector<i32, 1>;

#[cfg(target_arch = "x86_64")]
pub type NativeI8 = engine128::Sse2I8;
#[cfg(target_arch = "x86_64")]
pub type NativeI16 = engine128::Sse2I16;

#[cfg(target_arch = "aarch64")]
pub type NativeI8 = engine128::NeonI8;
#[cfg(target_arch = "aarch64")]
pub type NativeI16 = engine128::NeonI16;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub type NativeI8 = PortableI8;
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub type NativeI16 = PortableI16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_score_clamps() {
        assert_eq!(i8::from_i32(300), 127);
        assert_eq!(i8::from_i32(-300), -128);
        assert_eq!(i16::from_i32(40_000), i16::MAX);
        assert_eq!(120i8.sat_add(20), 127);
        assert_eq!((-120i8).sat_sub(20), -128);
    }

    #[test]
    fn test_width_promotion_ladder() {
        assert_eq!(LaneWidth::W8.promote(), Some(LaneWidth::W16));
        assert_eq!(LaneWidth::W16.promote(), Some(LaneWidth::W32));
        assert_eq!(LaneWidth::W32.promote(), None);
        assert_eq!(LaneWidth::W16.max_score(), 32767);
    }

    #[test]
    fn test_shifts_and_lanes() {
        let v = PortableI8::load(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
        let up = v.shift_up(-1);
        assert_eq!(up.lane(0), -1);
        assert_eq!(up.lane(1), 1);
        assert_eq!(up.lane(15), 15);
        let down = v.shift_down(0);
        assert_eq!(down.lane(0), 2);
        assert_eq!(down.lane(15), 0);
        assert_eq!(v.hmax(), 16);
        assert!(v.with_lane(3, 4).lanes_eq(v));
        assert!(!v.with_lane(3, 0).lanes_eq(v));
    }

    #[test]
    fn test_gather_reads_row_by_residue() {
        let row: Vec<i16> = (0..24).map(|x| x * 10).collect();
        let v = PortableI16::gather(&row, &[3, 0, 23]);
        assert_eq!(v.lane(0), 30);
        assert_eq!(v.lane(1), 0);
        assert_eq!(v.lane(2), 230);
        assert_eq!(v.lane(7), 0);
    }

    #[test]
    fn test_saturate_floors_at_zero() {
        let v = PortableI16::load(&[-5, 3, i16::MIN, 7, 0, -1, 100, i16::MAX]);
        let s = v.saturate();
        let mut out = [0i16; 8];
        s.store(&mut out);
        assert_eq!(out, [0, 3, 0, 7, 0, 0, 100, i16::MAX]);
    }
}
