//! Iteration and post-processing options.

use serde::{Deserialize, Serialize};

use crate::palette::Palette;

/// Options controlling iteration, accumulation, and the camera.
///
/// Any change to these invalidates the accumulated histogram: the render
/// loop clears its buckets and resets the batch counter. Tone-mapping-only
/// parameters live in [`PostProcessingOptions`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationOptions {
    /// Output image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Output image height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Histogram bins per output pixel axis
    #[serde(default = "default_supersample")]
    pub supersample: u32,

    /// Image center in fractal coordinate space
    #[serde(default)]
    pub camera_x: f32,
    #[serde(default)]
    pub camera_y: f32,
    /// Scale factor; 1 corresponds to an x range of (-1, 1) with the y range
    /// scaled to the aspect ratio
    #[serde(default = "default_zoom")]
    pub camera_zoom: f32,

    /// Color palette sampled by each chain's running color value
    pub palette: Palette,

    /// Iterations per chain per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Number of independent chains
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    /// Maximum number of batches before the run stops
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,

    /// Seed for the per-chain counter-based RNG; pinning it makes runs
    /// reproducible
    #[serde(default)]
    pub seed: u64,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    600
}

fn default_supersample() -> u32 {
    1
}

fn default_zoom() -> f32 {
    1.0
}

fn default_batch_size() -> u32 {
    1000
}

fn default_parallelism() -> u32 {
    64
}

fn default_batch_limit() -> u32 {
    100
}

impl IterationOptions {
    /// Options with the schema defaults and the given palette.
    pub fn with_palette(palette: Palette) -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            supersample: default_supersample(),
            camera_x: 0.0,
            camera_y: 0.0,
            camera_zoom: default_zoom(),
            palette,
            batch_size: default_batch_size(),
            parallelism: default_parallelism(),
            batch_limit: default_batch_limit(),
            seed: 0,
        }
    }

    /// Histogram grid width (supersampled).
    pub fn grid_width(&self) -> u32 {
        self.width * self.supersample
    }

    /// Histogram grid height (supersampled).
    pub fn grid_height(&self) -> u32 {
        self.height * self.supersample
    }

    /// Check the options describe a renderable configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "width and height must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        if self.supersample == 0 {
            return Err("supersample must be positive".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be positive".to_string());
        }
        if self.parallelism == 0 {
            return Err("parallelism must be positive".to_string());
        }
        if self.batch_limit == 0 {
            return Err("batch_limit must be positive".to_string());
        }
        if !self.camera_zoom.is_finite() || self.camera_zoom <= 0.0 {
            return Err(format!(
                "camera_zoom must be finite and positive, got {}",
                self.camera_zoom
            ));
        }
        if !self.camera_x.is_finite() || !self.camera_y.is_finite() {
            return Err("camera center must be finite".to_string());
        }
        self.palette.validate()
    }
}

/// Options that only affect tone mapping of the accumulated histogram.
///
/// Changing these re-derives the output image without clearing the
/// histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProcessingOptions {
    /// Gamma correction exponent applied to the log-density scale.
    /// Low gamma gives high contrast, high gamma a brighter, denser look.
    pub gamma: f32,
}

impl Default for PostProcessingOptions {
    fn default() -> Self {
        Self { gamma: 4.0 }
    }
}

impl PostProcessingOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(format!(
                "gamma must be finite and positive, got {}",
                self.gamma
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    fn options() -> IterationOptions {
        IterationOptions::with_palette(Palette::rainbow())
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(options().validate().is_ok());
        assert!(PostProcessingOptions::default().validate().is_ok());
    }

    #[test]
    fn test_grid_size_scales_with_supersample() {
        let mut opts = options();
        opts.width = 100;
        opts.height = 50;
        opts.supersample = 3;
        assert_eq!(opts.grid_width(), 300);
        assert_eq!(opts.grid_height(), 150);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let mut opts = options();
        opts.width = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_batch_parameters() {
        for field in ["supersample", "batch_size", "parallelism", "batch_limit"] {
            let mut opts = options();
            match field {
                "supersample" => opts.supersample = 0,
                "batch_size" => opts.batch_size = 0,
                "parallelism" => opts.parallelism = 0,
                _ => opts.batch_limit = 0,
            }
            assert!(opts.validate().is_err(), "{} = 0 should fail", field);
        }
    }

    #[test]
    fn test_rejects_non_positive_zoom() {
        let mut opts = options();
        opts.camera_zoom = 0.0;
        assert!(opts.validate().is_err());

        opts.camera_zoom = -2.0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_gamma() {
        let post = PostProcessingOptions { gamma: 0.0 };
        assert!(post.validate().is_err());

        let post = PostProcessingOptions { gamma: f32::NAN };
        assert!(post.validate().is_err());
    }
}
