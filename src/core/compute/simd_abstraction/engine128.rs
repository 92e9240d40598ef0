//! 128-bit native lane engines (SSE2 on x86_64; NEON on aarch64)
//!
//! Highlights
//! - 16 lanes of i8 and 8 lanes of i16 per vector.
//! - SSE2 has no signed 8-bit max/min, so `Sse2I8` builds them from
//!   `cmpgt` plus a bitwise select.
//! - Both ISAs are baseline for their architecture, so no runtime feature
//!   check is needed before using these types.
//!
//! Safety
//! - Loads and stores go through unaligned intrinsics on slices whose length
//!   is asserted first; every other operation is register-only.

use super::ScoreLane;

#[cfg(target_arch = "x86_64")]
mod x86 {
    use super::ScoreLane;
    use std::arch::x86_64::*;

    /// 16 x i8 in one SSE register.
    #[derive(Clone, Copy, Debug)]
    pub struct Sse2I8(pub(crate) __m128i);

    /// 8 x i16 in one SSE register.
    #[derive(Clone, Copy, Debug)]
    pub struct Sse2I16(pub(crate) __m128i);

    impl ScoreLane for Sse2I8 {
        type Score = i8;
        const LANES: usize = 16;

        #[inline(always)]
        fn splat(v: i8) -> Self {
            unsafe { Self(_mm_set1_epi8(v)) }
        }

        #[inline(always)]
        fn load(src: &[i8]) -> Self {
            assert!(src.len() >= 16);
            unsafe { Self(_mm_loadu_si128(src.as_ptr() as *const __m128i)) }
        }

        #[inline(always)]
        fn store(self, dst: &mut [i8]) {
            assert!(dst.len() >= 16);
            unsafe { _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, self.0) }
        }

        #[inline(always)]
        fn adds(self, other: Self) -> Self {
            unsafe { Self(_mm_adds_epi8(self.0, other.0)) }
        }

        #[inline(always)]
        fn subs(self, other: Self) -> Self {
            unsafe { Self(_mm_subs_epi8(self.0, other.0)) }
        }

        #[inline(always)]
        fn max(self, other: Self) -> Self {
            unsafe {
                let gt = _mm_cmpgt_epi8(self.0, other.0);
                Self(_mm_or_si128(
                    _mm_and_si128(gt, self.0),
                    _mm_andnot_si128(gt, other.0),
                ))
            }
        }

        #[inline(always)]
        fn min(self, other: Self) -> Self {
            unsafe {
                let lt = _mm_cmplt_epi8(self.0, other.0);
                Self(_mm_or_si128(
                    _mm_and_si128(lt, self.0),
                    _mm_andnot_si128(lt, other.0),
                ))
            }
        }

        #[inline(always)]
        fn lanes_eq(self, other: Self) -> bool {
            unsafe { _mm_movemask_epi8(_mm_cmpeq_epi8(self.0, other.0)) == 0xFFFF }
        }
    }

    impl ScoreLane for Sse2I16 {
        type Score = i16;
        const LANES: usize = 8;

        #[inline(always)]
        fn splat(v: i16) -> Self {
            unsafe { Self(_mm_set1_epi16(v)) }
        }

        #[inline(always)]
        fn load(src: &[i16]) -> Self {
            assert!(src.len() >= 8);
            unsafe { Self(_mm_loadu_si128(src.as_ptr() as *const __m128i)) }
        }

        #[inline(always)]
        fn store(self, dst: &mut [i16]) {
            assert!(dst.len() >= 8);
            unsafe { _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, self.0) }
        }

        #[inline(always)]
        fn adds(self, other: Self) -> Self {
            unsafe { Self(_mm_adds_epi16(self.0, other.0)) }
        }

        #[inline(always)]
        fn subs(self, other: Self) -> Self {
            unsafe { Self(_mm_subs_epi16(self.0, other.0)) }
        }

        #[inline(always)]
        fn max(self, other: Self) -> Self {
            unsafe { Self(_mm_max_epi16(self.0, other.0)) }
        }

        #[inline(always)]
        fn min(self, other: Self) -> Self {
            unsafe { Self(_mm_min_epi16(self.0, other.0)) }
        }

        #[inline(always)]
        fn lanes_eq(self, other: Self) -> bool {
            unsafe { _mm_movemask_epi8(_mm_cmpeq_epi16(self.0, other.0)) == 0xFFFF }
        }
    }
}

#[cfg(target_arch = "x86_64")]
pub use x86::{Sse2I16, Sse2I8};

#[cfg(target_arch = "aarch64")]
mod neon {
    use super::ScoreLane;
    use std::arch::aarch64::*;

    /// 16 x i8 in one NEON register.
    #[derive(Clone, Copy, Debug)]
    pub struct NeonI8(pub(crate) int8x16_t);

    /// 8 x i16 in one NEON register.
    #[derive(Clone, Copy, Debug)]
    pub struct NeonI16(pub(crate) int16x8_t);

    impl ScoreLane for NeonI8 {
        type Score = i8;
        const LANES: usize = 16;

        #[inline(always)]
        fn splat(v: i8) -> Self {
            unsafe { Self(vdupq_n_s8(v)) }
        }

        #[inline(always)]
        fn load(src: &[i8]) -> Self {
            assert!(src.len() >= 16);
            unsafe { Self(vld1q_s8(src.as_ptr())) }
        }

        #[inline(always)]
        fn store(self, dst: &mut [i8]) {
            assert!(dst.len() >= 16);
            unsafe { vst1q_s8(dst.as_mut_ptr(), self.0) }
        }

        #[inline(always)]
        fn adds(self, other: Self) -> Self {
            unsafe { Self(vqaddq_s8(self.0, other.0)) }
        }

        #[inline(always)]
        fn subs(self, other: Self) -> Self {
            unsafe { Self(vqsubq_s8(self.0, other.0)) }
        }

        #[inline(always)]
        fn max(self, other: Self) -> Self {
            unsafe { Self(vmaxq_s8(self.0, other.0)) }
        }

        #[inline(always)]
        fn min(self, other: Self) -> Self {
            unsafe { Self(vminq_s8(self.0, other.0)) }
        }

        #[inline(always)]
        fn lanes_eq(self, other: Self) -> bool {
            unsafe { vminvq_u8(vceqq_s8(self.0, other.0)) == u8::MAX }
        }
    }

    impl ScoreLane for NeonI16 {
        type Score = i16;
        const LANES: usize = 8;

        #[inline(always)]
        fn splat(v: i16) -> Self {
            unsafe { Self(vdupq_n_s16(v)) }
        }

        #[inline(always)]
        fn load(src: &[i16]) -> Self {
            assert!(src.len() >= 8);
            unsafe { Self(vld1q_s16(src.as_ptr())) }
        }

        #[inline(always)]
        fn store(self, dst: &mut [i16]) {
            assert!(dst.len() >= 8);
            unsafe { vst1q_s16(dst.as_mut_ptr(), self.0) }
        }

        #[inline(always)]
        fn adds(self, other: Self) -> Self {
            unsafe { Self(vqaddq_s16(self.0, other.0)) }
        }

        #[inline(always)]
        fn subs(self, other: Self) -> Self {
            unsafe { Self(vqsubq_s16(self.0, other.0)) }
        }

        #[inline(always)]
        fn max(self, other: Self) -> Self {
            unsafe { Self(vmaxq_s16(self.0, other.0)) }
        }

        #[inline(always)]
        fn min(self, other: Self) -> Self {
            unsafe { Self(vminq_s16(self.0, other.0)) }
        }

        #[inline(always)]
        fn lanes_eq(self, other: Self) -> bool {
            unsafe { vminvq_u16(vceqq_s16(self.0, other.0)) == u16::MAX }
        }
    }
}

#[cfg(target_arch = "aarch64")]
pub use neon::{NeonI16, NeonI8};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::simd_abstraction::{NativeI16, NativeI8, PortableI16, PortableI8};

    fn sample_i8(seed: i32) -> [i8; 16] {
        let mut out = [0i8; 16];
        for (l, v) in out.iter_mut().enumerate() {
            *v = (((seed + l as i32) * 73) % 256 - 128) as i8;
        }
        out
    }

    fn sample_i16(seed: i32) -> [i16; 8] {
        let mut out = [0i16; 8];
        for (l, v) in out.iter_mut().enumerate() {
            *v = (((seed + l as i32) * 9_973) % 65_536 - 32_768) as i16;
        }
        out
    }

    #[test]
    fn test_native_i8_matches_portable() {
        for seed in 0..64 {
            let (a, b) = (sample_i8(seed), sample_i8(seed * 7 + 3));
            let (na, nb) = (NativeI8::load(&a), NativeI8::load(&b));
            let (pa, pb) = (PortableI8::load(&a), PortableI8::load(&b));
            let ops: [(NativeI8, PortableI8); 5] = [
                (na.adds(nb), pa.adds(pb)),
                (na.subs(nb), pa.subs(pb)),
                (na.max(nb), pa.max(pb)),
                (na.min(nb), pa.min(pb)),
                (na.saturate(), pa.saturate()),
            ];
            for (n, p) in ops {
                let mut out = [0i8; 16];
                n.store(&mut out);
                assert_eq!(out, p.0, "seed {}", seed);
            }
            assert!(na.lanes_eq(na));
            assert_eq!(na.lanes_eq(nb), pa.lanes_eq(pb));
        }
    }

    #[test]
    fn test_native_i16_matches_portable() {
        for seed in 0..64 {
            let (a, b) = (sample_i16(seed), sample_i16(seed * 5 + 11));
            let (na, nb) = (NativeI16::load(&a), NativeI16::load(&b));
            let (pa, pb) = (PortableI16::load(&a), PortableI16::load(&b));
            let ops: [(NativeI16, PortableI16); 4] = [
                (na.adds(nb), pa.adds(pb)),
                (na.subs(nb), pa.subs(pb)),
                (na.max(nb), pa.max(pb)),
                (na.min(nb), pa.min(pb)),
            ];
            for (n, p) in ops {
                let mut out = [0i16; 8];
                n.store(&mut out);
                assert_eq!(out, p.0, "seed {}", seed);
            }
            assert_eq!(na.shift_up(-7).lane(0), -7);
            assert_eq!(na.shift_down(3).lane(0), a[1]);
        }
    }
}
