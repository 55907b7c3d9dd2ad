//! GPU buffer management for flame data, histograms, and parameters.

use bytemuck::{Pod, Zeroable};
use std::sync::Arc;
use wgpu::{self, util::DeviceExt};

use super::context::{GpuContext, GpuError};
use crate::models::{normalize_xforms, Flame, IterationOptions, XForm};

/// Bytes per histogram bucket: `[count, r, g, b]` as u32.
const BUCKET_SIZE: u64 = 16;

/// GPU-side transform record; layout must match the WGSL `XForm` struct.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct GpuXForm {
    pub variation: u32,
    pub weight: f32,
    pub color: f32,
    pub speed: f32,
    pub affine: [f32; 6],
}

impl From<&XForm> for GpuXForm {
    fn from(xform: &XForm) -> Self {
        Self {
            variation: xform.variation.index(),
            weight: xform.weight,
            color: xform.color,
            speed: xform.speed,
            affine: xform.affine,
        }
    }
}

/// Point generator parameters; must match the WGSL struct layout exactly.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PointsParams {
    pub batch_index: u32,
    pub parallelism: u32,
    pub grid_width: u32,
    pub grid_height: u32,
    pub batch_size: u32,
    pub seed_lo: u32,
    pub seed_hi: u32,
    pub xform_count: u32,
    pub palette_count: u32,
    pub _padding: [u32; 3],
    // Row-major camera matrix, one row per vec4 for WGSL alignment
    pub camera0: [f32; 4],
    pub camera1: [f32; 4],
    pub camera2: [f32; 4],
}

/// Downsampler parameters.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct DownsampleParams {
    pub out_width: u32,
    pub out_height: u32,
    pub supersample: u32,
    pub _padding: u32,
}

/// Max-reduction parameters.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MaxParams {
    pub cell_count: u32,
    pub _padding: [u32; 3],
}

/// Tone mapper parameters.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct RenderParams {
    pub cell_count: u32,
    pub gamma: f32,
    pub color_scale: f32,
    pub _padding: u32,
}

/// Create a uniform buffer from parameter data.
pub fn create_uniform_buffer<T: Pod>(device: &wgpu::Device, data: &T, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(data),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// All device buffers for one render run.
///
/// The histogram and max buffers are exclusively owned by the run; external
/// parameter changes go through rebuild-and-clear, never concurrent writes.
pub struct FlameBuffers {
    pub(crate) xforms: wgpu::Buffer,
    pub(crate) palette: wgpu::Buffer,
    pub(crate) histogram: wgpu::Buffer,
    pub(crate) downsampled: wgpu::Buffer,
    pub(crate) max: wgpu::Buffer,
    pub(crate) frame: wgpu::Buffer,

    pub(crate) xform_count: u32,
    pub(crate) palette_count: u32,

    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl FlameBuffers {
    /// Allocate the run's buffers and upload the normalized transforms and
    /// palette.
    ///
    /// Fails with [`GpuError::ResourceExhaustion`] if the supersampled
    /// histogram would exceed the device's buffer limits; no buffer is
    /// created in that case.
    pub fn new(
        ctx: &GpuContext,
        flame: &Flame,
        options: &IterationOptions,
    ) -> Result<Self, GpuError> {
        let grid_cells = u64::from(options.grid_width()) * u64::from(options.grid_height());
        let histogram_size = grid_cells * BUCKET_SIZE;

        let max_binding = u64::from(ctx.limits.max_storage_buffer_binding_size);
        if histogram_size > max_binding || histogram_size > ctx.limits.max_buffer_size {
            return Err(GpuError::ResourceExhaustion(format!(
                "histogram of {}x{} cells needs {} bytes, device limit is {}",
                options.grid_width(),
                options.grid_height(),
                histogram_size,
                max_binding.min(ctx.limits.max_buffer_size),
            )));
        }

        let gpu_xforms: Vec<GpuXForm> = normalize_xforms(&flame.xforms)
            .iter()
            .map(GpuXForm::from)
            .collect();

        let xforms = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("xforms"),
                contents: bytemuck::cast_slice(&gpu_xforms),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let palette = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("palette"),
                contents: bytemuck::cast_slice(&options.palette.colors),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let histogram = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("histogram"),
            size: histogram_size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let output_cells = u64::from(options.width) * u64::from(options.height);
        let downsampled = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("downsampled_histogram"),
            size: output_cells * BUCKET_SIZE,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let max = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("histogram_max"),
            size: std::mem::size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // RGBA f32 output image
        let frame = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame"),
            size: output_cells * 4 * std::mem::size_of::<f32>() as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            xforms,
            palette,
            histogram,
            downsampled,
            max,
            frame,
            xform_count: gpu_xforms.len() as u32,
            palette_count: options.palette.color_count() as u32,
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        })
    }

    /// Download the RGBA f32 frame buffer.
    pub fn download_frame(&self) -> Result<Vec<f32>, GpuError> {
        self.download_buffer(&self.frame, self.frame.size())
    }

    /// Download the downsampled histogram as flat `[count, r, g, b]` quads.
    pub fn download_downsampled(&self) -> Result<Vec<u32>, GpuError> {
        self.download_buffer(&self.downsampled, self.downsampled.size())
    }

    /// Download the full supersampled histogram.
    pub fn download_histogram(&self) -> Result<Vec<u32>, GpuError> {
        self.download_buffer(&self.histogram, self.histogram.size())
    }

    /// Copy a GPU buffer into host memory via a staging buffer.
    fn download_buffer<T: Pod>(&self, buffer: &wgpu::Buffer, size: u64) -> Result<Vec<T>, GpuError> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("download_encoder"),
            });
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Map the staging buffer and read data
        let buffer_slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();

        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // Ignore send error - if the receiver is dropped, recv() fails
            let _ = tx.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|e| GpuError::BufferError(e.to_string()))?
            .map_err(|e| GpuError::BufferError(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let result: Vec<T> = bytemuck::cast_slice(&data).to_vec();

        drop(data);
        staging.unmap();

        Ok(result)
    }
}
