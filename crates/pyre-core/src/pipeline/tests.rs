//! Pipeline-level property tests.

use super::*;
use crate::generators;
use crate::models::{Variation, XForm};
use crate::palette::Palette;

fn small_options(width: u32, height: u32) -> crate::models::IterationOptions {
    let mut options = crate::models::IterationOptions::with_palette(Palette::rainbow());
    options.width = width;
    options.height = height;
    options.supersample = 1;
    options.batch_size = 1000;
    options.parallelism = 16;
    options.batch_limit = 10;
    options.seed = 1;
    options
}

// ============================================================================
// Transform selection
// ============================================================================

#[test]
fn test_selector_respects_cumulative_edges() {
    let xforms: Vec<XForm> = [0.2f32, 0.3, 0.5]
        .iter()
        .map(|&weight| XForm {
            variation: Variation::Linear,
            affine: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            color: 0.0,
            speed: 0.0,
            weight,
        })
        .collect();

    assert_eq!(select_xform(&xforms, 0.0), 0);
    assert_eq!(select_xform(&xforms, 0.19), 0);
    assert_eq!(select_xform(&xforms, 0.2), 1);
    assert_eq!(select_xform(&xforms, 0.49), 1);
    assert_eq!(select_xform(&xforms, 0.5), 2);
    assert_eq!(select_xform(&xforms, 0.999), 2);
    // Rounding past the final edge falls back to the last transform
    assert_eq!(select_xform(&xforms, 1.0), 2);
}

#[test]
fn test_selector_distribution_matches_weights() {
    // Chi-squared test over 100k draws against the normalized weights
    let weights = [0.1f32, 0.4, 0.25, 0.25];
    let xforms: Vec<XForm> = weights
        .iter()
        .map(|&weight| XForm {
            variation: Variation::Linear,
            affine: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            color: 0.0,
            speed: 0.0,
            weight,
        })
        .collect();

    let draws = 100_000u32;
    let mut rng = ChainRng::for_chain(99, 0, 0);
    let mut observed = [0u32; 4];
    for _ in 0..draws {
        observed[select_xform(&xforms, rng.next_f32())] += 1;
    }

    let mut chi_squared = 0.0f64;
    for (count, weight) in observed.iter().zip(weights.iter()) {
        let expected = f64::from(draws) * f64::from(*weight);
        let diff = f64::from(*count) - expected;
        chi_squared += diff * diff / expected;
    }

    // 3 degrees of freedom; 16.27 is the 0.1% critical value
    assert!(
        chi_squared < 16.27,
        "selected index distribution diverges from weights (chi2 = {})",
        chi_squared
    );
}

// ============================================================================
// End-to-end accumulation
// ============================================================================

#[test]
fn test_barnsley_fern_accumulates_bounded_counts() {
    let flame = generators::barnsley_fern();
    let mut options = small_options(100, 100);
    options.batch_size = 10_000;
    options.parallelism = 64;
    options.camera_y = 5.0;
    options.camera_zoom = 0.18;

    let batches = 50u32;
    let renderer = CpuRenderer::new(&flame, &options);
    for batch in 0..batches {
        renderer.generate_points(batch);
    }

    let total = renderer.total_count();
    let theoretical =
        u64::from(batches) * u64::from(options.batch_size) * u64::from(options.parallelism);
    let warmup_discard =
        u64::from(batches) * u64::from(WARMUP_ITERATIONS) * u64::from(options.parallelism);

    assert!(total > 0, "no points landed in the histogram");
    assert!(
        total <= theoretical - warmup_discard,
        "histogram counts {} exceed the iteration budget {}",
        total,
        theoretical - warmup_discard
    );
}

#[test]
fn test_histogram_conserved_through_downsampling() {
    let flame = generators::spherical_test();
    for supersample in [1u32, 2, 3] {
        let mut options = small_options(40, 30);
        options.supersample = supersample;

        let renderer = CpuRenderer::new(&flame, &options);
        renderer.generate_points(0);

        let full: u64 = renderer
            .snapshot()
            .chunks_exact(4)
            .map(|bucket| u64::from(bucket[0]))
            .sum();
        let reduced: u64 = renderer
            .downsampled()
            .chunks_exact(4)
            .map(|bucket| u64::from(bucket[0]))
            .sum();

        assert_eq!(full, reduced, "supersample {} lost counts", supersample);
    }
}

#[test]
fn test_pinned_seed_runs_are_bit_identical() {
    let flame = generators::example();
    let options = small_options(64, 64);

    let run = |batches: u32| {
        let renderer = CpuRenderer::new(&flame, &options);
        for batch in 0..batches {
            renderer.generate_points(batch);
        }
        renderer.snapshot()
    };

    assert_eq!(run(3), run(3), "same seed must reproduce the histogram");
}

#[test]
fn test_distinct_seeds_differ() {
    let flame = generators::example();
    let options = small_options(64, 64);

    let renderer_a = CpuRenderer::new(&flame, &options);
    renderer_a.generate_points(0);

    let mut other = options.clone();
    other.seed = 2;
    let renderer_b = CpuRenderer::new(&flame, &other);
    renderer_b.generate_points(0);

    assert_ne!(renderer_a.snapshot(), renderer_b.snapshot());
}

#[test]
fn test_clear_resets_accumulation() {
    let flame = generators::example();
    let options = small_options(32, 32);

    let mut renderer = CpuRenderer::new(&flame, &options);
    renderer.generate_points(0);
    assert!(renderer.total_count() > 0);

    renderer.clear();
    assert_eq!(renderer.total_count(), 0);
}

#[test]
fn test_render_frame_shape_and_range() {
    let flame = generators::example();
    let options = small_options(32, 24);

    let renderer = CpuRenderer::new(&flame, &options);
    renderer.generate_points(0);

    let frame = renderer.render_frame(4.0);
    assert_eq!(frame.len(), 32 * 24 * 4);
    for component in frame {
        assert!((0.0..=1.0).contains(&component));
    }
}

#[test]
fn test_divergent_flame_keeps_histogram_finite() {
    // An expanding affine quickly pushes chains to infinity; the point
    // generator must reset them instead of poisoning the histogram
    let flame = crate::models::Flame::new(vec![XForm {
        variation: Variation::Exponential,
        affine: [40.0, 0.0, 30.0, 0.0, 40.0, 0.0],
        color: 0.5,
        speed: 0.5,
        weight: 1.0,
    }]);

    let options = small_options(16, 16);
    let renderer = CpuRenderer::new(&flame, &options);
    renderer.generate_points(0);

    // All counts stay bounded by the iteration budget
    let budget = u64::from(options.batch_size) * u64::from(options.parallelism);
    assert!(renderer.total_count() <= budget);
}
