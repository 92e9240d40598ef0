//! Portable lane vector: a plain array with lane-wise saturating arithmetic.
//!
//! This is the baseline every native engine is checked against, and the only
//! engine for 32-bit lanes.

use super::{LaneScore, ScoreLane};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreVector<S: LaneScore, const N: usize>(pub [S; N]);

impl<S: LaneScore, const N: usize> ScoreVector<S, N> {
    #[inline(always)]
    fn zip_with(self, other: Self, f: impl Fn(S, S) -> S) -> Self {
        let mut out = self.0;
        for (o, &b) in out.iter_mut().zip(other.0.iter()) {
            *o = f(*o, b);
        }
        Self(out)
    }
}

impl<S: LaneScore, const N: usize> ScoreLane for ScoreVector<S, N> {
    type Score = S;
    const LANES: usize = N;

    #[inline(always)]
    fn splat(v: S) -> Self {
        Self([v; N])
    }

    #[inline(always)]
    fn load(src: &[S]) -> Self {
        let mut out = [S::ZERO; N];
        out.copy_from_slice(&src[..N]);
        Self(out)
    }

    #[inline(always)]
    fn store(self, dst: &mut [S]) {
        dst[..N].copy_from_slice(&self.0);
    }

    #[inline(always)]
    fn adds(self, other: Self) -> Self {
        self.zip_with(other, S::sat_add)
    }

    #[inline(always)]
    fn subs(self, other: Self) -> Self {
        self.zip_with(other, S::sat_sub)
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a.max(b))
    }

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        self.zip_with(other, |a, b| a.min(b))
    }

    #[inline(always)]
    fn lane(self, i: usize) -> S {
        self.0[i]
    }

    #[inline(always)]
    fn hmax(self) -> S {
        self.0.iter().copied().max().unwrap_or(S::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_add_sub() {
        let a = ScoreVector::<i8, 4>([120, -120, 5, 0]);
        let b = ScoreVector::<i8, 4>([10, 10, 5, -128]);
        assert_eq!(a.adds(b).0, [127, -110, 10, -128]);
        assert_eq!(a.subs(b).0, [110, -128, 0, 127]);
    }

    #[test]
    fn test_max_min() {
        let a = ScoreVector::<i32, 2>([1, 9]);
        let b = ScoreVector::<i32, 2>([4, 2]);
        assert_eq!(a.max(b).0, [4, 9]);
        assert_eq!(a.min(b).0, [1, 2]);
    }
}
