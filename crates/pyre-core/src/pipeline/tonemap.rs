//! Max reduction and log-density tone mapping.

use rayon::prelude::*;

use crate::pipeline::COLOR_SCALE;

/// Maximum bucket count over a downsampled histogram.
///
/// An all-zero histogram reports 1 so the tone mapper's normalization never
/// divides by zero on the first batches.
pub fn max_count(downsampled: &[u32]) -> u32 {
    downsampled
        .par_chunks(4)
        .map(|bucket| bucket[0])
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Tone map a downsampled histogram into RGBA f32 pixels.
///
/// Per cell: the average palette color is scaled by
/// `alpha = (log(count + 1) / log(max + 1)) ^ (1/gamma)`, the classical
/// log-density mapping. Zero-count cells are transparent black.
pub fn tone_map(downsampled: &[u32], max: u32, gamma: f32) -> Vec<f32> {
    let max = max.max(1);
    let log_max = (max as f32 + 1.0).ln();
    let inv_gamma = 1.0 / gamma;

    let mut pixels = vec![0.0f32; downsampled.len()];

    pixels
        .par_chunks_mut(4)
        .zip(downsampled.par_chunks(4))
        .for_each(|(pixel, bucket)| {
            let count = bucket[0];
            if count == 0 {
                return;
            }

            let alpha = ((count as f32 + 1.0).ln() / log_max)
                .powf(inv_gamma)
                .clamp(0.0, 1.0);

            let color_norm = COLOR_SCALE as f32 * count as f32;
            pixel[0] = bucket[1] as f32 / color_norm * alpha;
            pixel[1] = bucket[2] as f32 / color_norm * alpha;
            pixel[2] = bucket[3] as f32 / color_norm * alpha;
            pixel[3] = alpha;
        });

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_of_empty_histogram_is_one() {
        let downsampled = vec![0u32; 4 * 16];
        assert_eq!(max_count(&downsampled), 1);
    }

    #[test]
    fn test_max_finds_largest_count() {
        let mut downsampled = vec![0u32; 4 * 16];
        downsampled[4 * 7] = 42;
        downsampled[4 * 3] = 9;
        assert_eq!(max_count(&downsampled), 42);
    }

    #[test]
    fn test_zero_count_cell_is_transparent() {
        let downsampled = vec![0u32; 4];
        let pixels = tone_map(&downsampled, 100, 2.0);
        assert_eq!(pixels, vec![0.0; 4]);
    }

    #[test]
    fn test_brightest_cell_has_unit_alpha_at_gamma_one() {
        let max = 500u32;
        let downsampled = vec![max, 0, 0, 0];
        let pixels = tone_map(&downsampled, max, 1.0);
        assert!((pixels[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_monotonic_in_count() {
        let max = 1000u32;
        let mut previous = 0.0f32;
        for count in [1u32, 10, 100, 1000] {
            let downsampled = vec![count, 0, 0, 0];
            let alpha = tone_map(&downsampled, max, 4.0)[3];
            assert!(alpha > previous);
            previous = alpha;
        }
    }

    #[test]
    fn test_average_color_recovered() {
        // 8 hits, all of pure red at full palette intensity
        let count = 8u32;
        let accum = count * COLOR_SCALE;
        let downsampled = vec![count, accum, 0, 0];
        let pixels = tone_map(&downsampled, count, 1.0);

        // alpha == 1, so the pixel carries the unscaled average color
        assert!((pixels[0] - 1.0).abs() < 1e-5);
        assert_eq!(pixels[1], 0.0);
        assert_eq!(pixels[2], 0.0);
    }
}
