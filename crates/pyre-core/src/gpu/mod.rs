//! GPU compute backend for the flame pipeline.
//!
//! This module provides the GPU implementation of the pipeline stages using
//! wgpu (WebGPU): point generation, histogram downsampling, max reduction,
//! and tone mapping run as compute shaders against storage buffers. It
//! supports Metal on macOS, Vulkan on Linux/Windows, and DX12 on Windows.
//!
//! # Usage
//!
//! The GPU backend is enabled via the `gpu` feature flag:
//!
//! ```toml
//! [dependencies]
//! pyre-core = { version = "0.1", features = ["gpu"] }
//! ```

mod buffers;
mod context;
mod pipeline;
mod renderer;
mod shaders;

pub use buffers::FlameBuffers;
pub use context::{GpuContext, GpuError};
pub use renderer::GpuRenderer;

/// Check if GPU acceleration is available on this system.
pub fn is_gpu_available() -> bool {
    GpuContext::is_available()
}

/// Get information about the available GPU device.
pub fn gpu_info() -> Option<String> {
    GpuContext::device_info()
}
