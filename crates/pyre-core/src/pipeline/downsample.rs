//! Histogram downsampling from the supersampled grid to output resolution.

use rayon::prelude::*;

/// Reduce a supersampled histogram to output resolution.
///
/// Each output cell is the sum (count and color accumulator alike) of the
/// `supersample x supersample` block of full-resolution cells covering it.
/// Buckets are flat `[count, r, g, b]` quads; the input grid is
/// `width * supersample` by `height * supersample`.
pub fn downsample(
    histogram: &[u32],
    width: u32,
    height: u32,
    supersample: u32,
) -> Vec<u32> {
    let grid_width = (width * supersample) as usize;
    let ss = supersample as usize;

    let mut output = vec![0u32; (width * height) as usize * 4];

    output
        .par_chunks_mut(4)
        .enumerate()
        .for_each(|(cell, bucket)| {
            let out_x = cell % width as usize;
            let out_y = cell / width as usize;

            let mut sums = [0u32; 4];
            for sub_y in 0..ss {
                let row = out_y * ss + sub_y;
                for sub_x in 0..ss {
                    let col = out_x * ss + sub_x;
                    let src = (row * grid_width + col) * 4;
                    for (sum, word) in sums.iter_mut().zip(&histogram[src..src + 4]) {
                        *sum = sum.wrapping_add(*word);
                    }
                }
            }
            bucket.copy_from_slice(&sums);
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total_counts(buckets: &[u32]) -> u64 {
        buckets.chunks_exact(4).map(|b| u64::from(b[0])).sum()
    }

    #[test]
    fn test_supersample_one_is_identity() {
        let histogram: Vec<u32> = (0..4 * 6).collect();
        let output = downsample(&histogram, 3, 2, 1);
        assert_eq!(output, histogram);
    }

    #[test]
    fn test_block_sums() {
        // 2x2 output, supersample 2 -> 4x4 grid; count = 1 everywhere
        let mut histogram = vec![0u32; 4 * 16];
        for bucket in histogram.chunks_exact_mut(4) {
            bucket[0] = 1;
            bucket[1] = 10;
        }

        let output = downsample(&histogram, 2, 2, 2);
        assert_eq!(output.len(), 4 * 4);
        for bucket in output.chunks_exact(4) {
            assert_eq!(bucket[0], 4);
            assert_eq!(bucket[1], 40);
        }
    }

    #[test]
    fn test_count_conservation_across_factors() {
        let width = 5;
        let height = 4;
        for supersample in 1..=4u32 {
            let grid = (width * supersample) as usize * (height * supersample) as usize;
            let histogram: Vec<u32> = (0..grid * 4).map(|i| (i % 7) as u32).collect();

            let output = downsample(&histogram, width, height, supersample);
            assert_eq!(
                total_counts(&histogram),
                total_counts(&output),
                "counts not conserved at supersample {}",
                supersample
            );
        }
    }
}
