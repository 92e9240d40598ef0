//! Runtime lane-engine selection.
//!
//! This module picks the lane engine for the current CPU. The choice never
//! changes results, only speed.

use std::sync::Once;

/// Available lane engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdEngineType {
    /// 128-bit native vectors (SSE2 on x86_64, NEON on aarch64)
    Engine128,
    /// Scalar loop over lanes, available everywhere
    Portable,
}

/// Detects the best lane engine for this CPU.
///
/// Environment variable override for testing/debugging:
/// - `FERROUS_SWIPE_FORCE_PORTABLE=1`: use the portable engine
pub fn detect_optimal_simd_engine() -> SimdEngineType {
    let engine = detect_engine();
    ENGINE_REPORTED.call_once(|| {
        log::info!("Using lane engine: {}", simd_engine_description(engine));
    });
    engine
}

static ENGINE_REPORTED: Once = Once::new();

fn detect_engine() -> SimdEngineType {
    if std::env::var("FERROUS_SWIPE_FORCE_PORTABLE")
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        log::debug!("FERROUS_SWIPE_FORCE_PORTABLE=1: Using portable lane engine");
        return SimdEngineType::Portable;
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    {
        // SSE2 and NEON are baseline for these targets
        SimdEngineType::Engine128
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SimdEngineType::Portable
    }
}

/// Returns a human-readable description of the lane engine
pub fn simd_engine_description(engine: SimdEngineType) -> &'static str {
    match engine {
        SimdEngineType::Engine128 => {
            #[cfg(target_arch = "x86_64")]
            {
                "SSE2 (128-bit, 16 x i8 / 8 x i16)"
            }
            #[cfg(not(target_arch = "x86_64"))]
            {
                "NEON (128-bit, 16 x i8 / 8 x i16)"
            }
        }
        SimdEngineType::Portable => "portable (scalar lanes, 16 x i8 / 8 x i16 / 8 x i32)",
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
