//! Thread-local workspace for reusable DP buffers
//!
//! Every sweep needs a few rows of cell and gap state sized by the query (or
//! band) length times the lane count. This module keeps one set of those rows
//! per score width on each thread so that repeated driver calls do not
//! allocate. Concurrent invocations on different threads never share buffers.

use std::cell::RefCell;

use crate::core::compute::simd_abstraction::LaneScore;

/// Initial capacity in scores (rows x lanes) per width.
const INITIAL_ROW_CAPACITY: usize = 4096;

// Thread-local workspace for DP buffers
thread_local! {
    static WORKSPACE: RefCell<DpWorkspace> = RefCell::new(DpWorkspace::new());
}

/// Cell and gap rows of one score width.
#[derive(Debug, Default)]
pub struct DpBuffers<S> {
    h: Vec<S>,
    gap: Vec<S>,
}

impl<S: LaneScore> DpBuffers<S> {
    fn with_capacity(cap: usize) -> Self {
        Self {
            h: Vec::with_capacity(cap),
            gap: Vec::with_capacity(cap),
        }
    }

    /// Resizes and initializes the rows: cells to 0, gap states to the lane
    /// minimum. Returns (cells, gaps).
    pub fn reset(&mut self, len: usize) -> (&mut [S], &mut [S]) {
        reset_row(&mut self.h, len, S::ZERO);
        reset_row(&mut self.gap, len, S::MIN);
        (&mut self.h[..], &mut self.gap[..])
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.h.capacity()
    }
}

#[inline]
fn reset_row<S: Copy>(row: &mut Vec<S>, len: usize, fill: S) {
    row.clear();
    row.resize(len, fill);
}

/// Reusable buffers for the SWIPE driver
#[derive(Debug)]
pub struct DpWorkspace {
    pub i8: DpBuffers<i8>,
    pub i16: DpBuffers<i16>,
    pub i32: DpBuffers<i32>,
    /// Per-cell origin codes of the traceback pass.
    pub origins: Vec<u8>,
}

impl DpWorkspace {
    pub fn new() -> Self {
        Self {
            i8: DpBuffers::with_capacity(INITIAL_ROW_CAPACITY),
            i16: DpBuffers::with_capacity(INITIAL_ROW_CAPACITY),
            i32: DpBuffers::with_capacity(INITIAL_ROW_CAPACITY),
            origins: Vec::new(),
        }
    }
}

impl Default for DpWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Score widths that own a buffer set in the workspace.
pub trait WorkspaceScore: LaneScore {
    fn buffers(ws: &mut DpWorkspace) -> &mut DpBuffers<Self>;
}

impl WorkspaceScore for i8 {
    #[inline]
    fn buffers(ws: &mut DpWorkspace) -> &mut DpBuffers<i8> {
        &mut ws.i8
    }
}

impl WorkspaceScore for i16 {
    #[inline]
    fn buffers(ws: &mut DpWorkspace) -> &mut DpBuffers<i16> {
        &mut ws.i16
    }
}

impl WorkspaceScore for i32 {
    #[inline]
    fn buffers(ws: &mut DpWorkspace) -> &mut DpBuffers<i32> {
        &mut ws.i32
    }
}

/// Execute a closure with the thread-local workspace
///
/// Calls must not nest on one thread.
pub fn with_workspace<F, R>(f: F) -> R
where
    F: FnOnce(&mut DpWorkspace) -> R,
{
    WORKSPACE.with(|ws| f(&mut ws.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_initializes_rows() {
        with_workspace(|ws| {
            let (h, gap) = i16::buffers(ws).reset(10);
            h[3] = 7;
            gap[3] = 9;
            assert_eq!(h.len(), 10);
            assert!(gap.iter().enumerate().all(|(i, &g)| i == 3 || g == i16::MIN));
        });
        with_workspace(|ws| {
            let (h, gap) = i16::buffers(ws).reset(12);
            assert!(h.iter().all(|&v| v == 0));
            assert!(gap.iter().all(|&v| v == i16::MIN));
        });
    }

    #[test]
    fn test_buffers_are_reused() {
        with_workspace(|ws| {
            i8::buffers(ws).reset(100);
            let cap = i8::buffers(ws).capacity();
            i8::buffers(ws).reset(50);
            assert_eq!(i8::buffers(ws).capacity(), cap);
            assert!(cap >= INITIAL_ROW_CAPACITY);
        });
    }
}
