//! SWIPE driver.
//!
//! `swipe` scores one query against a batch of targets. Targets are grouped
//! by the sweep they need (full matrix, banded, frame-shifted or
//! matrix-provided), packed into lane vectors, and swept at 8-bit width
//! first. Lanes that reach the lane maximum are re-run at the next width
//! until their scores are exact. Surviving targets get a scalar second pass
//! for their begin coordinates (a full traceback on request) and e-values.

pub mod frameshift;
pub mod inter;
pub mod intra;
pub mod matrix;

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::core::alignment::cell_update::LaneCosts;
use crate::core::alignment::extent::{alignment_extent, frameshift_extent, Extent};
use crate::core::alignment::profile::{LetterProfile, SubstitutionProfile};
use crate::core::alignment::traceback::{
    traceback, traceback_frameshift, TracebackCosts, TracebackResult,
};
use crate::core::alignment::types::{
    Band, BestCell, DpFlags, Frame, Hsp, KernelVariant, LaneOutcome, TargetDescriptor,
};
use crate::core::alignment::workspace::WorkspaceScore;
use crate::core::compute::encoding::{Letter, TranslatedQuery};
use crate::core::compute::simd_abstraction::{
    detect_optimal_simd_engine, LaneWidth, NativeI16, NativeI8, PortableI16, PortableI32,
    PortableI8, ScoreLane, SimdEngineType, WideScalar,
};
use crate::core::sequence::Sequence;
use crate::core::stats::evalue::EvalueCalculator;
use crate::core::stats::score_matrix::ScoreMatrix;
use crate::dp_opt::{DpOpt, PackingPolicy};
use crate::error::{Result, SwipeError};

use frameshift::frameshift_sweep;
use inter::{banded_sweep, full_matrix_sweep, BandedTarget};
use intra::intra_target_sweep;
use matrix::matrix_sweep;

/// The query of one `swipe` call.
#[derive(Debug, Clone, Copy)]
pub enum DpQuery<'a> {
    Protein(Sequence<'a>),
    /// Six-frame translation; targets select a frame, or a strand when
    /// frame-shift alignment is on.
    Translated(&'a TranslatedQuery),
}

/// Everything besides the targets that a `swipe` call needs.
#[derive(Debug, Clone, Copy)]
pub struct DpParams<'a> {
    pub query: DpQuery<'a>,
    /// Per-position score correction, one value per query residue. Protein
    /// queries only.
    pub query_bias: Option<&'a [i8]>,
    pub matrix: &'a ScoreMatrix,
    pub flags: DpFlags,
    pub opt: &'a DpOpt,
}

impl<'a> DpParams<'a> {
    pub fn new(query: DpQuery<'a>, matrix: &'a ScoreMatrix, opt: &'a DpOpt) -> Self {
        Self {
            query,
            query_bias: None,
            matrix,
            flags: DpFlags::NONE,
            opt,
        }
    }

    pub fn with_bias(mut self, bias: &'a [i8]) -> Self {
        self.query_bias = Some(bias);
        self
    }

    pub fn with_flags(mut self, flags: DpFlags) -> Self {
        self.flags = flags;
        self
    }

    fn validate(&self, targets: &[TargetDescriptor<'_>]) -> Result<()> {
        self.opt
            .validate()
            .map_err(|errors| SwipeError::InvalidConfig(errors.join("; ")))?;

        match (self.query, self.query_bias) {
            (DpQuery::Protein(seq), Some(bias)) if bias.len() != seq.len() => {
                return Err(SwipeError::InvalidConfig(format!(
                    "query bias has {} values for a query of length {}",
                    bias.len(),
                    seq.len()
                )));
            }
            (DpQuery::Translated(_), Some(_)) => {
                return Err(SwipeError::InvalidConfig(
                    "query bias is only supported for protein queries".into(),
                ));
            }
            _ => {}
        }
        if self.flags.contains(DpFlags::FRAME_SHIFT) && matches!(self.query, DpQuery::Protein(_)) {
            return Err(SwipeError::InvalidConfig(
                "frame-shift alignment requires a translated query".into(),
            ));
        }

        for t in targets {
            if t.declared_len != t.seq.len() {
                return Err(SwipeError::LengthMismatch {
                    target: t.id,
                    declared: t.declared_len,
                    available: t.seq.len(),
                });
            }
            let frames = match self.query {
                DpQuery::Protein(_) => 1,
                DpQuery::Translated(_) => 6,
            };
            if t.frame.index() >= frames {
                return Err(SwipeError::InvalidConfig(format!(
                    "target {} asks for frame {} of a query with {} frame(s)",
                    t.id,
                    t.frame.index(),
                    frames
                )));
            }
        }
        Ok(())
    }

    fn frame_letters(&self, frame: Frame) -> &'a [Letter] {
        match self.query {
            DpQuery::Protein(seq) => seq.letters(),
            DpQuery::Translated(q) => q.frame(frame.index()),
        }
    }

    fn strand_letters(&self, strand: usize) -> [&'a [Letter]; 3] {
        match self.query {
            DpQuery::Protein(seq) => [seq.letters(), &[], &[]],
            DpQuery::Translated(q) => q.strand(strand),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GroupKind {
    Full,
    Banded,
    FrameShift,
    Matrix,
}

/// A target scheduled in a group: its position in the input and the band
/// (clipped; the whole matrix for full and frame-shift groups).
#[derive(Debug, Clone, Copy)]
struct Job {
    slot: usize,
    band: Band,
}

/// Frame (or strand, for frame-shift groups) and sweep kind.
type GroupKey = (u8, GroupKind);

fn group_targets(
    targets: &[TargetDescriptor<'_>],
    params: &DpParams<'_>,
) -> BTreeMap<GroupKey, Vec<Job>> {
    let mut groups: BTreeMap<GroupKey, Vec<Job>> = BTreeMap::new();
    let flags = params.flags;

    for (slot, t) in targets.iter().enumerate() {
        let tlen = t.seq.len();
        if flags.contains(DpFlags::FRAME_SHIFT) {
            let strand = t.frame.strand();
            let rows = frameshift::frameshift_rows(params.strand_letters(strand));
            if rows == 0 {
                continue;
            }
            groups
                .entry((strand as u8, GroupKind::FrameShift))
                .or_default()
                .push(Job {
                    slot,
                    band: Band::full(rows, tlen),
                });
            continue;
        }

        let qlen = params.frame_letters(t.frame).len();
        if qlen == 0 {
            continue;
        }
        let full = Band::full(qlen, tlen);
        let band = match t.band {
            Some(b) if !flags.contains(DpFlags::FULL_MATRIX) => match b.clip(qlen, tlen) {
                Some(clipped) => clipped,
                None => continue,
            },
            _ => full,
        };
        let kind = if flags.contains(DpFlags::COMPOSITION_ADJUSTED) && t.matrix.is_some() {
            GroupKind::Matrix
        } else if band.covers(qlen, tlen) {
            GroupKind::Full
        } else {
            GroupKind::Banded
        };
        groups
            .entry((t.frame.0, kind))
            .or_default()
            .push(Job { slot, band });
    }
    groups
}

/// Shared inputs of the sweeps of one group.
struct GroupContext<'p, 'a> {
    kind: GroupKind,
    key: u8,
    params: &'p DpParams<'a>,
    targets: &'p [TargetDescriptor<'a>],
}

impl GroupContext<'_, '_> {
    fn target(&self, job: &Job) -> &[Letter] {
        self.targets[job.slot].seq.letters()
    }

    fn query(&self) -> &[Letter] {
        self.params.frame_letters(Frame(self.key))
    }

    fn frames(&self) -> [&[Letter]; 3] {
        self.params.strand_letters(self.key as usize)
    }

    fn use_intra_target<L: ScoreLane>(&self, jobs: &[Job]) -> bool {
        let opt = self.params.opt;
        match opt.packing {
            PackingPolicy::InterTarget => false,
            PackingPolicy::IntraTarget => true,
            PackingPolicy::Auto => {
                jobs.len() * 2 <= L::LANES
                    && jobs
                        .iter()
                        .all(|j| j.band.width() >= L::LANES * opt.intra_target_min_band_lanes)
            }
        }
    }
}

/// Positions of `jobs` sorted by decreasing `key`, so that lanes of one batch
/// finish at about the same time.
fn batch_order(jobs: &[Job], key: impl Fn(&Job) -> usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..jobs.len()).collect();
    order.sort_by_key(|&p| std::cmp::Reverse(key(&jobs[p])));
    order
}

fn run_lanes<L>(ctx: &GroupContext<'_, '_>, jobs: &[Job]) -> Vec<LaneOutcome>
where
    L: ScoreLane,
    L::Score: WorkspaceScore,
{
    let opt = ctx.params.opt;
    let costs = LaneCosts::<L>::new(opt.gap_first_residue(), opt.gap_extend, opt.frame_shift);
    let letters = LetterProfile::<L::Score>::new(ctx.params.matrix);
    let bias = ctx.params.query_bias;
    let mut out = vec![LaneOutcome::default(); jobs.len()];

    match ctx.kind {
        GroupKind::FrameShift => {
            let frames = ctx.frames();
            let order = batch_order(jobs, |j| ctx.target(j).len());
            for batch in order.chunks(L::LANES) {
                let seqs: Vec<&[Letter]> = batch.iter().map(|&p| ctx.target(&jobs[p])).collect();
                let results = frameshift_sweep::<L>(frames, &seqs, &letters, &costs);
                for (&p, r) in batch.iter().zip(results) {
                    out[p] = r;
                }
            }
        }
        GroupKind::Full | GroupKind::Banded if ctx.use_intra_target::<L>(jobs) => {
            log::trace!("intra-target packing for {} target(s)", jobs.len());
            let query = ctx.query();
            let profile = SubstitutionProfile::from_letters(query, &letters);
            for (p, job) in jobs.iter().enumerate() {
                out[p] = intra_target_sweep::<L>(
                    query,
                    bias,
                    ctx.target(job),
                    job.band,
                    &profile,
                    &costs,
                );
            }
        }
        GroupKind::Full => {
            let query = ctx.query();
            let order = batch_order(jobs, |j| ctx.target(j).len());
            for batch in order.chunks(L::LANES) {
                let seqs: Vec<&[Letter]> = batch.iter().map(|&p| ctx.target(&jobs[p])).collect();
                let results = full_matrix_sweep::<L>(query, bias, &seqs, &letters, &costs);
                for (&p, r) in batch.iter().zip(results) {
                    out[p] = r;
                }
            }
        }
        GroupKind::Banded => {
            let query = ctx.query();
            let profile = SubstitutionProfile::from_letters(query, &letters);
            let order = batch_order(jobs, |j| j.band.width());
            for batch in order.chunks(L::LANES) {
                let lanes: Vec<BandedTarget<'_>> = batch
                    .iter()
                    .map(|&p| BandedTarget {
                        letters: ctx.target(&jobs[p]),
                        band: jobs[p].band,
                    })
                    .collect();
                let results = banded_sweep::<L>(query, bias, &lanes, &profile, &costs);
                for (&p, r) in batch.iter().zip(results) {
                    out[p] = r;
                }
            }
        }
        GroupKind::Matrix => {
            for (p, job) in jobs.iter().enumerate() {
                out[p] = run_matrix(ctx, job);
            }
        }
    }
    out
}

fn run_matrix(ctx: &GroupContext<'_, '_>, job: &Job) -> LaneOutcome {
    let opt = ctx.params.opt;
    let costs =
        LaneCosts::<WideScalar>::new(opt.gap_first_residue(), opt.gap_extend, opt.frame_shift);
    match ctx.targets[job.slot].matrix {
        Some(adjusted) => matrix_sweep(ctx.query(), ctx.target(job), job.band, adjusted, &costs),
        None => matrix_sweep(
            ctx.query(),
            ctx.target(job),
            job.band,
            ctx.params.matrix,
            &costs,
        ),
    }
}

fn dispatch(
    width: LaneWidth,
    engine: SimdEngineType,
    ctx: &GroupContext<'_, '_>,
    jobs: &[Job],
) -> Vec<LaneOutcome> {
    match (width, engine) {
        (LaneWidth::W8, SimdEngineType::Engine128) => run_lanes::<NativeI8>(ctx, jobs),
        (LaneWidth::W8, SimdEngineType::Portable) => run_lanes::<PortableI8>(ctx, jobs),
        (LaneWidth::W16, SimdEngineType::Engine128) => run_lanes::<NativeI16>(ctx, jobs),
        (LaneWidth::W16, SimdEngineType::Portable) => run_lanes::<PortableI16>(ctx, jobs),
        (LaneWidth::W32, _) => run_lanes::<PortableI32>(ctx, jobs),
    }
}

/// Sweeps a group, re-running saturated lanes one width up until every score
/// is exact.
fn run_with_promotion(
    ctx: &GroupContext<'_, '_>,
    jobs: Vec<Job>,
    engine: SimdEngineType,
) -> Vec<(Job, BestCell, LaneWidth)> {
    if ctx.kind == GroupKind::Matrix {
        return jobs
            .into_iter()
            .map(|job| (job, run_matrix(ctx, &job).best, LaneWidth::W32))
            .collect();
    }

    let mut done = Vec::with_capacity(jobs.len());
    let mut pending = jobs;
    let mut width = ctx.params.opt.initial_width;
    while !pending.is_empty() {
        let outcomes = dispatch(width, engine, ctx, &pending);
        let next = width.promote();
        let mut saturated = Vec::new();
        for (job, outcome) in pending.into_iter().zip(outcomes) {
            if outcome.overflow && next.is_some() {
                saturated.push(job);
            } else {
                done.push((job, outcome.best, width));
            }
        }
        if let Some(next) = next {
            if !saturated.is_empty() {
                log::debug!(
                    "{} target(s) saturated {}-bit lanes, re-running at {} bits",
                    saturated.len(),
                    width.bits(),
                    next.bits()
                );
            }
            width = next;
        }
        pending = saturated;
    }
    done
}

fn variant(kind: GroupKind, biased: bool) -> KernelVariant {
    match kind {
        GroupKind::FrameShift => KernelVariant::FrameShifted,
        GroupKind::Matrix => KernelVariant::MatrixProvided,
        GroupKind::Full | GroupKind::Banded if biased => KernelVariant::Biased,
        GroupKind::Full | GroupKind::Banded => KernelVariant::Plain,
    }
}

fn traceback_costs(opt: &DpOpt) -> TracebackCosts {
    TracebackCosts {
        gap_open: opt.gap_first_residue(),
        gap_extend: opt.gap_extend,
        frame_shift: opt.frame_shift,
    }
}

fn run_traceback(ctx: &GroupContext<'_, '_>, job: &Job) -> Option<TracebackResult> {
    let costs = traceback_costs(ctx.params.opt);
    let target = ctx.target(job);
    match ctx.kind {
        GroupKind::FrameShift => traceback_frameshift(ctx.frames(), target, ctx.params.matrix, &costs),
        GroupKind::Matrix => match ctx.targets[job.slot].matrix {
            Some(adjusted) => traceback(ctx.query(), target, job.band, adjusted, None, &costs),
            None => traceback(ctx.query(), target, job.band, ctx.params.matrix, None, &costs),
        },
        GroupKind::Full | GroupKind::Banded => traceback(
            ctx.query(),
            target,
            job.band,
            ctx.params.matrix,
            ctx.params.query_bias,
            &costs,
        ),
    }
}

/// Score-only counterpart of `run_traceback`: end and begin cells, no path.
fn run_extent(ctx: &GroupContext<'_, '_>, job: &Job) -> Option<Extent> {
    let costs = traceback_costs(ctx.params.opt);
    let target = ctx.target(job);
    match ctx.kind {
        GroupKind::FrameShift => frameshift_extent(ctx.frames(), target, ctx.params.matrix, &costs),
        GroupKind::Matrix => match ctx.targets[job.slot].matrix {
            Some(adjusted) => alignment_extent(ctx.query(), target, job.band, adjusted, None, &costs),
            None => alignment_extent(ctx.query(), target, job.band, ctx.params.matrix, None, &costs),
        },
        GroupKind::Full | GroupKind::Banded => alignment_extent(
            ctx.query(),
            target,
            job.band,
            ctx.params.matrix,
            ctx.params.query_bias,
            &costs,
        ),
    }
}

fn build_hsp(
    ctx: &GroupContext<'_, '_>,
    job: &Job,
    best: BestCell,
    width: LaneWidth,
    calculator: &EvalueCalculator,
) -> Option<Hsp> {
    let params = ctx.params;
    if best.score < params.opt.min_score {
        return None;
    }
    let descriptor = &ctx.targets[job.slot];

    // second pass: begin cell, and the path when asked for
    let (extent, transcript) = if params.flags.contains(DpFlags::TRACEBACK) {
        match run_traceback(ctx, job) {
            Some(tb) => (
                Some(Extent {
                    best: tb.best,
                    query_begin: tb.transcript.query_begin,
                    target_begin: tb.transcript.target_begin,
                }),
                Some(tb.transcript),
            ),
            None => (None, None),
        }
    } else {
        (run_extent(ctx, job), None)
    };
    let (best, begin) = match extent {
        Some(e) => {
            if e.best != best {
                log::warn!(
                    "Second pass of target {} ended at {:?}, sweep reported {:?}",
                    descriptor.id,
                    e.best,
                    best
                );
            }
            (e.best, (e.query_begin, e.target_begin))
        }
        None => {
            log::warn!("Second pass of target {} found no alignment", descriptor.id);
            (best, (best.row, best.col))
        }
    };

    let (frame, query_end, query_len) = match ctx.kind {
        GroupKind::FrameShift => {
            let strand = Frame(ctx.key * 3);
            let dna_len = match params.query {
                DpQuery::Translated(q) => q.dna_len(),
                DpQuery::Protein(seq) => seq.len() * 3,
            };
            (strand.on_strand(best.row), best.row + 3, dna_len / 3)
        }
        _ => (Frame(ctx.key), best.row + 1, ctx.query().len()),
    };

    Some(Hsp {
        target: descriptor.id,
        score: best.score,
        frame,
        query_begin: begin.0,
        query_end,
        target_begin: begin.1,
        target_end: best.col + 1,
        bit_score: calculator.bit_score(best.score),
        evalue: calculator.evalue(best.score, query_len, descriptor.seq.len()),
        variant: variant(ctx.kind, params.query_bias.is_some()),
        lane_width: width,
        transcript,
    })
}

/// Scores `targets` against the query of `params`.
///
/// Returns one `Hsp` per target whose best local score reaches
/// `opt.min_score`, in input order.
pub fn swipe(targets: &[TargetDescriptor<'_>], params: &DpParams<'_>) -> Result<Vec<Hsp>> {
    params.validate(targets)?;
    let opt = params.opt;
    let engine = opt.engine.unwrap_or_else(detect_optimal_simd_engine);
    let calculator = EvalueCalculator {
        gapped: params.matrix.gumbel(opt.gap_open, opt.gap_extend),
        ungapped: params.matrix.ungapped_gumbel(),
        gap_open: opt.gap_open,
        gap_extend: opt.gap_extend,
        db_letters: opt.db_letters,
        db_sequences: opt.db_sequences,
        mode: opt.evalue_mode,
    };

    let groups = group_targets(targets, params);
    log::debug!(
        "swipe: {} target(s) in {} group(s), flags {:?}, engine {:?}",
        targets.len(),
        groups.len(),
        params.flags,
        engine
    );

    let mut hits: Vec<(usize, Hsp)> = Vec::new();
    for ((key, kind), jobs) in groups {
        let ctx = GroupContext {
            kind,
            key,
            params,
            targets,
        };
        log::debug!(
            "group {:?} key {}: {} target(s), variant {:?}",
            kind,
            key,
            jobs.len(),
            variant(kind, params.query_bias.is_some())
        );
        for (job, best, width) in run_with_promotion(&ctx, jobs, engine) {
            if let Some(hsp) = build_hsp(&ctx, &job, best, width, &calculator) {
                hits.push((job.slot, hsp));
            }
        }
    }
    hits.sort_by_key(|(slot, _)| *slot);
    Ok(hits.into_iter().map(|(_, hsp)| hsp).collect())
}

/// `swipe` over chunks of `chunk_size` targets on the rayon thread pool.
/// Output is identical to the sequential call.
pub fn swipe_par(
    targets: &[TargetDescriptor<'_>],
    params: &DpParams<'_>,
    chunk_size: usize,
) -> Result<Vec<Hsp>> {
    params.validate(targets)?;
    let chunks: Vec<Vec<Hsp>> = targets
        .par_chunks(chunk_size.max(1))
        .map(|chunk| swipe(chunk, params))
        .collect::<Result<_>>()?;
    Ok(chunks.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::encoding::encode_protein;

    fn opt() -> DpOpt {
        DpOpt {
            gap_open: 11,
            gap_extend: 1,
            ..DpOpt::default()
        }
    }

    #[test]
    fn test_grouping_by_band() {
        let q = encode_protein(b"MKVLAAGIVG").unwrap();
        let t = encode_protein(b"MKVLAAGIVGLL").unwrap();
        let m = ScoreMatrix::blosum62();
        let opt = opt();
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&q).unwrap()), &m, &opt);
        let seq = Sequence::new(&t).unwrap();
        let targets = vec![
            TargetDescriptor::new(0, seq),
            TargetDescriptor::new(1, seq).with_band(Band::new(-2, 2).unwrap()),
            TargetDescriptor::new(2, seq).with_band(Band::new(-100, 100).unwrap()),
            TargetDescriptor::new(3, seq).with_band(Band::new(50, 60).unwrap()),
        ];
        let groups = group_targets(&targets, &params);
        let full: Vec<usize> = groups[&(0, GroupKind::Full)].iter().map(|j| j.slot).collect();
        let banded: Vec<usize> = groups[&(0, GroupKind::Banded)].iter().map(|j| j.slot).collect();
        assert_eq!(full, vec![0, 2]);
        assert_eq!(banded, vec![1]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_promotion_reaches_exact_score() {
        let q = vec![17u8; 60]; // W, scores 11 against itself
        let m = ScoreMatrix::blosum62();
        let opt = opt();
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&q).unwrap()), &m, &opt);
        let targets = [TargetDescriptor::new(7, Sequence::new(&q).unwrap())];
        let hsps = swipe(&targets, &params).unwrap();
        assert_eq!(hsps.len(), 1);
        assert_eq!(hsps[0].score, 660);
        assert_eq!(hsps[0].lane_width, LaneWidth::W16);
        assert_eq!(hsps[0].target, 7);
    }

    #[test]
    fn test_bias_length_is_checked() {
        let q = encode_protein(b"MKV").unwrap();
        let m = ScoreMatrix::blosum62();
        let opt = opt();
        let bias = [0i8; 2];
        let params =
            DpParams::new(DpQuery::Protein(Sequence::new(&q).unwrap()), &m, &opt).with_bias(&bias);
        let err = swipe(&[], &params).unwrap_err();
        assert!(matches!(err, SwipeError::InvalidConfig(_)));
    }
}
