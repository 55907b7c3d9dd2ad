//! Pyre Core Library
//!
//! Core functionality for flame fractal rendering: weighted mixtures of
//! nonlinear transforms are iterated as independent Markov chains, surviving
//! points are accumulated into a supersampled density histogram, and the
//! histogram is log-density tone mapped into an RGBA image.

pub mod camera;
pub mod config;
pub mod generators;
pub mod models;
pub mod palette;
pub mod pipeline;
pub mod render;

// GPU acceleration module (optional, enabled with "gpu" feature)
#[cfg(feature = "gpu")]
pub mod gpu;

// Re-export commonly used types
pub use models::{Flame, IterationOptions, PostProcessingOptions, Variation, XForm};
pub use palette::Palette;
pub use render::{RenderBackend, RenderError, RenderLoop, RenderState};

// Re-export GPU functions when available
#[cfg(feature = "gpu")]
pub use gpu::{gpu_info, is_gpu_available};
