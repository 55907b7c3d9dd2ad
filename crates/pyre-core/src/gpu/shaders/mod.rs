//! WGSL shader sources embedded at compile time.

/// Container for all shader source code.
pub struct Shaders;

impl Shaders {
    /// Chaos-game point generation with atomic histogram splatting.
    pub const GENERATE_POINTS: &'static str = include_str!("generate_points.wgsl");

    /// Supersampled histogram reduction to output resolution.
    pub const HISTOGRAM_DOWNSAMPLE: &'static str = include_str!("histogram_downsample.wgsl");

    /// Global max bucket count via atomicMax.
    pub const HISTOGRAM_MAX: &'static str = include_str!("histogram_max.wgsl");

    /// Log-density tone mapping into the RGBA frame buffer.
    pub const HISTOGRAM_RENDER: &'static str = include_str!("histogram_render.wgsl");
}
