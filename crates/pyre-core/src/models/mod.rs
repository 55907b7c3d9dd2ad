//! Data models for Pyre
//!
//! Core data structures for transforms, flames, and iteration options.

mod options;
mod xform;

// Re-export all public types to maintain a flat public API
pub use options::{IterationOptions, PostProcessingOptions};
pub use xform::{normalize_xforms, Flame, Variation, XForm};
