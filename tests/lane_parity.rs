// tests/lane_parity.rs
// Every engine, starting width and packing policy must reproduce the scalar
// reference, score and end cell.

mod common;

use common::{mutate, random_protein, reference_frameshift, reference_sw, seeded};
use ferrous_swipe::core::compute::simd_abstraction::{LaneWidth, SimdEngineType};
use ferrous_swipe::{
    swipe, Band, DpFlags, DpOpt, DpParams, DpQuery, PackingPolicy, ScoreMatrix, Sequence,
    TargetDescriptor, TranslatedQuery,
};
use proptest::prelude::*;

const ENGINES: [SimdEngineType; 2] = [SimdEngineType::Engine128, SimdEngineType::Portable];
const WIDTHS: [LaneWidth; 3] = [LaneWidth::W8, LaneWidth::W16, LaneWidth::W32];
const PACKINGS: [PackingPolicy; 3] = [
    PackingPolicy::Auto,
    PackingPolicy::InterTarget,
    PackingPolicy::IntraTarget,
];

fn configurations() -> Vec<DpOpt> {
    let mut out = Vec::new();
    for engine in ENGINES {
        for width in WIDTHS {
            for packing in PACKINGS {
                out.push(DpOpt {
                    engine: Some(engine),
                    initial_width: width,
                    packing,
                    ..DpOpt::default()
                });
            }
        }
    }
    out
}

/// 20 related and unrelated targets of varying length.
fn target_set(seed: u64, query: &[u8]) -> Vec<Vec<u8>> {
    let mut rng = seeded(seed);
    (0..20)
        .map(|i| match i % 3 {
            0 => mutate(&mut rng, query, 0.15),
            1 => random_protein(&mut rng, 10 + 7 * i),
            _ => {
                let mut t = random_protein(&mut rng, 5);
                t.extend(mutate(&mut rng, &query[query.len() / 3..], 0.3));
                t
            }
        })
        .collect()
}

#[test]
fn full_matrix_matches_reference_everywhere() {
    let m = ScoreMatrix::blosum62();
    let mut rng = seeded(2024);
    let q = random_protein(&mut rng, 70);
    let targets = target_set(7, &q);
    let descriptors: Vec<TargetDescriptor> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| TargetDescriptor::new(i, Sequence::new(t).unwrap()))
        .collect();

    for opt in configurations() {
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&q).unwrap()), &m, &opt);
        let hsps = swipe(&descriptors, &params).unwrap();
        for (i, t) in targets.iter().enumerate() {
            let r = reference_sw(&q, t, &m, None, opt.gap_first_residue(), opt.gap_extend, None);
            let hit = hsps.iter().find(|h| h.target == i);
            match hit {
                Some(h) => {
                    assert_eq!(
                        (h.score, h.query_end - 1, h.target_end - 1),
                        (r.score, r.row, r.col),
                        "target {i} with {:?}/{:?}/{:?}",
                        opt.engine,
                        opt.initial_width,
                        opt.packing
                    );
                }
                None => assert!(r.score < opt.min_score, "target {i} missing"),
            }
        }
    }
}

#[test]
fn banded_matches_banded_reference_everywhere() {
    let m = ScoreMatrix::blosum62();
    let mut rng = seeded(31337);
    let q = random_protein(&mut rng, 60);
    let targets = target_set(8, &q);
    let bands: Vec<Band> = (0..targets.len())
        .map(|i| {
            let center = (i as i32 % 7) - 3;
            Band::new(center - 4 - i as i32 % 5, center + 6).unwrap()
        })
        .collect();
    let descriptors: Vec<TargetDescriptor> = targets
        .iter()
        .zip(&bands)
        .enumerate()
        .map(|(i, (t, &b))| TargetDescriptor::new(i, Sequence::new(t).unwrap()).with_band(b))
        .collect();

    for opt in configurations() {
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&q).unwrap()), &m, &opt);
        let hsps = swipe(&descriptors, &params).unwrap();
        for (i, t) in targets.iter().enumerate() {
            let band = Some((bands[i].begin, bands[i].end));
            let r = reference_sw(&q, t, &m, None, opt.gap_first_residue(), opt.gap_extend, band);
            let got = hsps
                .iter()
                .find(|h| h.target == i)
                .map(|h| (h.score, h.query_end - 1, h.target_end - 1));
            let want = (r.score >= opt.min_score).then_some((r.score, r.row, r.col));
            assert_eq!(got, want, "target {i} with {:?}/{:?}/{:?}", opt.engine, opt.initial_width, opt.packing);
        }
    }
}

/// Per-position corrections in -3..=2, as a composition bias would produce.
fn random_bias(seed: u64, len: usize) -> Vec<i8> {
    use rand::Rng;
    let mut rng = seeded(seed);
    (0..len).map(|_| rng.gen_range(-3i8..=2)).collect()
}

#[test]
fn biased_matches_biased_reference_everywhere() {
    let m = ScoreMatrix::blosum62();
    let mut rng = seeded(4242);
    let q = random_protein(&mut rng, 64);
    let bias = random_bias(5, q.len());
    let targets = target_set(9, &q);
    let bands: Vec<Option<Band>> = (0..targets.len())
        .map(|i| (i % 2 == 1).then(|| Band::new(-5 - (i as i32 % 4), 7).unwrap()))
        .collect();
    let descriptors: Vec<TargetDescriptor> = targets
        .iter()
        .zip(&bands)
        .enumerate()
        .map(|(i, (t, band))| {
            let d = TargetDescriptor::new(i, Sequence::new(t).unwrap());
            match band {
                Some(b) => d.with_band(*b),
                None => d,
            }
        })
        .collect();

    for opt in configurations() {
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&q).unwrap()), &m, &opt)
            .with_bias(&bias);
        let hsps = swipe(&descriptors, &params).unwrap();
        for (i, t) in targets.iter().enumerate() {
            let band = bands[i].map(|b| (b.begin, b.end));
            let r = reference_sw(&q, t, &m, Some(&bias), opt.gap_first_residue(), opt.gap_extend, band);
            let got = hsps
                .iter()
                .find(|h| h.target == i)
                .map(|h| (h.score, h.query_end - 1, h.target_end - 1, h.variant));
            let want = (r.score >= opt.min_score)
                .then_some((r.score, r.row, r.col, ferrous_swipe::KernelVariant::Biased));
            assert_eq!(got, want, "target {i} with {:?}/{:?}/{:?}", opt.engine, opt.initial_width, opt.packing);
        }
    }
}

#[test]
fn frame_shift_matches_reference_on_both_strands() {
    let m = ScoreMatrix::blosum62();
    let mut rng = seeded(77);
    let dna = common::random_dna(&mut rng, 120);
    let q = TranslatedQuery::from_dna(&dna).unwrap();
    let mut target = q.frame(0)[..15].to_vec();
    target.extend_from_slice(&q.frame(2)[16..35]);
    let reverse = q.frame(4).to_vec();

    for engine in ENGINES {
        for width in WIDTHS {
            let opt = DpOpt {
                engine: Some(engine),
                initial_width: width,
                ..DpOpt::default()
            };
            let params =
                DpParams::new(DpQuery::Translated(&q), &m, &opt).with_flags(DpFlags::FRAME_SHIFT);
            let descriptors = [
                TargetDescriptor::new(0, Sequence::new(&target).unwrap()),
                TargetDescriptor::new(1, Sequence::new(&reverse).unwrap())
                    .with_frame(ferrous_swipe::Frame(3)),
            ];
            let hsps = swipe(&descriptors, &params).unwrap();
            for (hsp, strand, t) in [(&hsps[0], 0, &target), (&hsps[1], 1, &reverse)] {
                let r = reference_frameshift(
                    q.strand(strand),
                    t,
                    &m,
                    opt.gap_first_residue(),
                    opt.gap_extend,
                    opt.frame_shift,
                );
                assert_eq!(hsp.score, r.score);
                assert_eq!((hsp.query_end - 3, hsp.target_end - 1), (r.row, r.col));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn swipe_equals_scalar_reference(
        query in proptest::collection::vec(0u8..20, 1..60),
        target in proptest::collection::vec(0u8..20, 1..60),
        gap_open in 5i32..15,
        gap_extend in 1i32..3,
        packing in prop_oneof![
            Just(PackingPolicy::InterTarget),
            Just(PackingPolicy::IntraTarget),
        ],
    ) {
        let m = ScoreMatrix::blosum62();
        let opt = DpOpt {
            gap_open,
            gap_extend,
            packing,
            ..DpOpt::default()
        };
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&query).unwrap()), &m, &opt);
        let descriptors = [TargetDescriptor::new(0, Sequence::new(&target).unwrap())];
        let hsps = swipe(&descriptors, &params).unwrap();
        let r = reference_sw(&query, &target, &m, None, gap_open + gap_extend, gap_extend, None);
        let got = hsps.first().map_or(0, |h| h.score);
        prop_assert_eq!(got, r.score);
    }

    #[test]
    fn biased_swipe_equals_scalar_reference(
        (query, bias) in proptest::collection::vec((0u8..20, -4i8..=3), 1..60)
            .prop_map(|pairs| pairs.into_iter().unzip::<u8, i8, Vec<u8>, Vec<i8>>()),
        target in proptest::collection::vec(0u8..20, 1..60),
        band in proptest::option::of((-30i32..10, 0i32..25)),
        engine in prop_oneof![Just(SimdEngineType::Engine128), Just(SimdEngineType::Portable)],
        packing in prop_oneof![
            Just(PackingPolicy::InterTarget),
            Just(PackingPolicy::IntraTarget),
        ],
    ) {
        let m = ScoreMatrix::blosum62();
        let opt = DpOpt {
            engine: Some(engine),
            packing,
            ..DpOpt::default()
        };
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&query).unwrap()), &m, &opt)
            .with_bias(&bias);
        let band = band.map(|(begin, width)| Band::new(begin, begin + width).unwrap());
        let mut descriptor = TargetDescriptor::new(0, Sequence::new(&target).unwrap());
        if let Some(b) = band {
            descriptor = descriptor.with_band(b);
        }
        let hsps = swipe(&[descriptor], &params).unwrap();
        let r = reference_sw(
            &query,
            &target,
            &m,
            Some(&bias),
            opt.gap_first_residue(),
            opt.gap_extend,
            band.map(|b| (b.begin, b.end)),
        );
        let got = hsps.first().map(|h| (h.score, h.query_end - 1, h.target_end - 1));
        let want = (r.score >= opt.min_score).then_some((r.score, r.row, r.col));
        prop_assert_eq!(got, want);
    }

    #[test]
    fn narrowing_the_band_never_raises_the_score(
        query in proptest::collection::vec(0u8..20, 5..50),
        target in proptest::collection::vec(0u8..20, 5..50),
        begin in -20i32..5,
        width in 1i32..15,
    ) {
        let m = ScoreMatrix::blosum62();
        let opt = DpOpt::default();
        let params = DpParams::new(DpQuery::Protein(Sequence::new(&query).unwrap()), &m, &opt);
        let seq = Sequence::new(&target).unwrap();
        let full = swipe(&[TargetDescriptor::new(0, seq)], &params).unwrap();
        let banded = swipe(
            &[TargetDescriptor::new(0, seq).with_band(Band::new(begin, begin + width).unwrap())],
            &params,
        )
        .unwrap();
        let full_score = full.first().map_or(0, |h| h.score);
        let band_score = banded.first().map_or(0, |h| h.score);
        prop_assert!(band_score <= full_score);
    }
}
