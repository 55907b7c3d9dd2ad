//! Point generation: weighted transform selection and chaos-game chains.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::camera::project;
use crate::models::XForm;
use crate::palette::Palette;
use crate::pipeline::rng::ChainRng;
use crate::pipeline::variations::apply_xform;
use crate::pipeline::{COLOR_SCALE, WARMUP_ITERATIONS};

/// Pick a transform index by cumulative weight.
///
/// Weights must be pre-normalized to sum to 1; `u` is a uniform draw in
/// [0, 1). Accumulated rounding can leave `u` past the final edge, in which
/// case the last transform is selected.
pub fn select_xform(xforms: &[XForm], u: f32) -> usize {
    let mut cumulative = 0.0f32;
    for (i, xform) in xforms.iter().enumerate() {
        cumulative += xform.weight;
        if u < cumulative {
            return i;
        }
    }
    xforms.len() - 1
}

/// Run one chain for `batch_size` iterations, splatting surviving points
/// into the shared histogram.
///
/// The chain is seeded from `(seed, batch_index, chain_index)` and owns its
/// point, color, and RNG stream. The first [`WARMUP_ITERATIONS`] iterations
/// are discarded while the chain settles onto the attractor; a non-finite
/// point resets the chain to the origin and re-enters warm-up.
#[allow(clippy::too_many_arguments)]
pub fn run_chain(
    xforms: &[XForm],
    palette: &Palette,
    camera: &[[f32; 3]; 3],
    grid_width: u32,
    grid_height: u32,
    batch_size: u32,
    seed: u64,
    batch_index: u32,
    chain_index: u32,
    histogram: &[AtomicU32],
) {
    let mut rng = ChainRng::for_chain(seed, batch_index, chain_index);

    let mut x = rng.next_f32() * 2.0 - 1.0;
    let mut y = rng.next_f32() * 2.0 - 1.0;
    let mut color = rng.next_f32();
    let mut settled = 0u32;

    for _ in 0..batch_size {
        let u = rng.next_f32();
        let xform = &xforms[select_xform(xforms, u)];

        let julia_bit = match xform.variation {
            crate::models::Variation::Julia => rng.next_u32() & 1 == 1,
            _ => false,
        };

        let (nx, ny) = apply_xform(xform, x, y, julia_bit);

        if !nx.is_finite() || !ny.is_finite() {
            // Chain diverged: restart from a safe default, discard the
            // transient again
            x = 0.0;
            y = 0.0;
            settled = 0;
            continue;
        }

        x = nx;
        y = ny;
        color = color * (1.0 - xform.speed) + xform.color * xform.speed;

        if settled < WARMUP_ITERATIONS {
            settled += 1;
            continue;
        }

        let (px, py) = project(camera, x, y);
        if px < 0.0 || py < 0.0 {
            continue;
        }
        let (col, row) = (px as u32, py as u32);
        if col >= grid_width || row >= grid_height {
            continue;
        }

        let bucket = ((row * grid_width + col) * 4) as usize;
        let [r, g, b] = palette.sample(color);

        histogram[bucket].fetch_add(1, Ordering::Relaxed);
        histogram[bucket + 1].fetch_add((r * COLOR_SCALE as f32) as u32, Ordering::Relaxed);
        histogram[bucket + 2].fetch_add((g * COLOR_SCALE as f32) as u32, Ordering::Relaxed);
        histogram[bucket + 3].fetch_add((b * COLOR_SCALE as f32) as u32, Ordering::Relaxed);
    }
}
