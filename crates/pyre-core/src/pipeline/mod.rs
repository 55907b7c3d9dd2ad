//! CPU rendering pipeline.
//!
//! The reference implementation of the flame pipeline: the same stage graph
//! as the GPU backend (point generation -> histogram -> downsample -> max ->
//! tone map) executed with rayon over atomic buckets. It renders standalone
//! and doubles as the parity baseline for the GPU path.
//!
//! This module is organized into submodules:
//! - `rng`: counter-based per-chain RNG shared with the WGSL shaders
//! - `variations`: the nonlinear variation catalog
//! - `points`: transform selection and chaos-game chains
//! - `downsample`: supersampled histogram reduction
//! - `tonemap`: max reduction and log-density tone mapping

mod downsample;
mod points;
mod rng;
mod tonemap;
mod variations;

#[cfg(test)]
mod tests;

pub use downsample::downsample;
pub use points::{run_chain, select_xform};
pub use rng::{pcg_hash, ChainRng};
pub use tonemap::{max_count, tone_map};
pub use variations::{apply_variation, apply_xform};

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

use crate::camera::camera_matrix;
use crate::models::{normalize_xforms, Flame, IterationOptions, XForm};
use crate::palette::Palette;

/// Iterations discarded at the start of each chain while it converges onto
/// the attractor.
pub const WARMUP_ITERATIONS: u32 = 20;

/// Fixed-point units per unit of palette color in the histogram's color
/// accumulator (u32 atomics cannot accumulate floats).
pub const COLOR_SCALE: u32 = 256;

/// CPU renderer for one run: owns the histogram buckets and re-derives the
/// output frame on demand.
///
/// Inputs are assumed validated (see [`crate::render::RenderLoop`], which
/// validates before constructing a backend). Transform weights are
/// normalized internally so the selector always sees weights summing to 1.
pub struct CpuRenderer {
    xforms: Vec<XForm>,
    palette: Palette,
    camera: [[f32; 3]; 3],
    width: u32,
    height: u32,
    supersample: u32,
    batch_size: u32,
    parallelism: u32,
    seed: u64,
    histogram: Vec<AtomicU32>,
}

impl CpuRenderer {
    pub fn new(flame: &Flame, options: &IterationOptions) -> Self {
        let grid_width = options.grid_width();
        let grid_height = options.grid_height();

        let camera = camera_matrix(
            [grid_width, grid_height],
            [options.camera_x, options.camera_y, options.camera_zoom],
        );

        let buckets = (grid_width * grid_height) as usize * 4;
        let mut histogram = Vec::with_capacity(buckets);
        histogram.resize_with(buckets, || AtomicU32::new(0));

        Self {
            xforms: normalize_xforms(&flame.xforms),
            palette: options.palette.clone(),
            camera,
            width: options.width,
            height: options.height,
            supersample: options.supersample,
            batch_size: options.batch_size,
            parallelism: options.parallelism,
            seed: options.seed,
            histogram,
        }
    }

    /// Zero all histogram buckets.
    pub fn clear(&mut self) {
        for bucket in &mut self.histogram {
            *bucket.get_mut() = 0;
        }
    }

    /// Run one batch: every chain iterates `batch_size` times and splats
    /// into the shared histogram.
    pub fn generate_points(&self, batch_index: u32) {
        let grid_width = self.width * self.supersample;
        let grid_height = self.height * self.supersample;

        (0..self.parallelism).into_par_iter().for_each(|chain| {
            run_chain(
                &self.xforms,
                &self.palette,
                &self.camera,
                grid_width,
                grid_height,
                self.batch_size,
                self.seed,
                batch_index,
                chain,
                &self.histogram,
            );
        });
    }

    /// Copy the current histogram out of the atomics.
    pub fn snapshot(&self) -> Vec<u32> {
        self.histogram
            .iter()
            .map(|word| word.load(Ordering::Relaxed))
            .collect()
    }

    /// The histogram reduced to output resolution.
    pub fn downsampled(&self) -> Vec<u32> {
        downsample(&self.snapshot(), self.width, self.height, self.supersample)
    }

    /// Sum of all hit counts currently accumulated.
    pub fn total_count(&self) -> u64 {
        self.histogram
            .chunks(4)
            .map(|bucket| u64::from(bucket[0].load(Ordering::Relaxed)))
            .sum()
    }

    /// Re-derive the output frame from the accumulated histogram:
    /// downsample, find the global max, tone map.
    pub fn render_frame(&self, gamma: f32) -> Vec<f32> {
        let downsampled = self.downsampled();
        let max = max_count(&downsampled);
        tone_map(&downsampled, max, gamma)
    }
}
