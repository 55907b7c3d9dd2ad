//! GPU renderer for one run: owns the device buffers and dispatches the
//! pipeline stages.

use std::sync::Arc;

use crate::camera::camera_matrix;
use crate::models::{Flame, IterationOptions};

use super::buffers::{
    create_uniform_buffer, DownsampleParams, FlameBuffers, MaxParams, PointsParams, RenderParams,
};
use super::context::{GpuContext, GpuError};
use super::pipeline::{workgroup_grid, CommandBatch, POINTS_WORKGROUP_SIZE};
use crate::pipeline::COLOR_SCALE;

/// GPU implementation of the flame pipeline.
///
/// Mirrors [`crate::pipeline::CpuRenderer`]: `generate_points` accumulates
/// one batch into the persistent histogram, `render_frame` re-derives the
/// output image. Every dispatch is fully synchronized before the method
/// returns, so batch N+1 never observes partial writes from batch N.
pub struct GpuRenderer {
    context: Arc<GpuContext>,
    buffers: FlameBuffers,
    camera: [[f32; 3]; 3],
    width: u32,
    height: u32,
    supersample: u32,
    batch_size: u32,
    parallelism: u32,
    seed: u64,
}

impl GpuRenderer {
    /// Allocate buffers for a run. Inputs are assumed validated.
    pub fn new(
        context: Arc<GpuContext>,
        flame: &Flame,
        options: &IterationOptions,
    ) -> Result<Self, GpuError> {
        let buffers = FlameBuffers::new(&context, flame, options)?;

        let camera = camera_matrix(
            [options.grid_width(), options.grid_height()],
            [options.camera_x, options.camera_y, options.camera_zoom],
        );

        Ok(Self {
            context,
            buffers,
            camera,
            width: options.width,
            height: options.height,
            supersample: options.supersample,
            batch_size: options.batch_size,
            parallelism: options.parallelism,
            seed: options.seed,
        })
    }

    /// Handle to the shared context, for rebuilding a renderer with new
    /// options.
    pub fn context(&self) -> Arc<GpuContext> {
        self.context.clone()
    }

    /// Zero the histogram.
    pub fn clear(&mut self) -> Result<(), GpuError> {
        let mut batch = CommandBatch::new(&self.context, "clear_histogram");
        batch.clear_buffer(&self.buffers.histogram);
        batch.finish();
        Ok(())
    }

    /// Dispatch one point-generation batch and wait for its writes to land.
    pub fn generate_points(&self, batch_index: u32) -> Result<(), GpuError> {
        let params = PointsParams {
            batch_index,
            parallelism: self.parallelism,
            grid_width: self.width * self.supersample,
            grid_height: self.height * self.supersample,
            batch_size: self.batch_size,
            seed_lo: self.seed as u32,
            seed_hi: (self.seed >> 32) as u32,
            xform_count: self.buffers.xform_count,
            palette_count: self.buffers.palette_count,
            _padding: [0; 3],
            camera0: row_to_vec4(self.camera[0]),
            camera1: row_to_vec4(self.camera[1]),
            camera2: row_to_vec4(self.camera[2]),
        };
        let uniform = create_uniform_buffer(&self.context.device, &params, "points_params");

        let bind_group = self
            .context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("points_bind_group"),
                layout: &self.context.pipelines.points_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.buffers.xforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.buffers.palette.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: self.buffers.histogram.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: uniform.as_entire_binding(),
                    },
                ],
            });

        let grid = workgroup_grid(self.parallelism, POINTS_WORKGROUP_SIZE)?;

        let mut batch = CommandBatch::new(&self.context, "generate_points");
        batch.dispatch(
            &self.context.pipelines.generate_points,
            &bind_group,
            grid,
            "generate_points_pass",
        );
        batch.finish();
        Ok(())
    }

    /// Re-derive the output frame: downsample, reduce the max, tone map,
    /// read back.
    pub fn render_frame(&self, gamma: f32) -> Result<Vec<f32>, GpuError> {
        let cell_count = self.width * self.height;

        let downsample_params = DownsampleParams {
            out_width: self.width,
            out_height: self.height,
            supersample: self.supersample,
            _padding: 0,
        };
        let downsample_uniform = create_uniform_buffer(
            &self.context.device,
            &downsample_params,
            "downsample_params",
        );

        let max_params = MaxParams {
            cell_count,
            _padding: [0; 3],
        };
        let max_uniform = create_uniform_buffer(&self.context.device, &max_params, "max_params");

        let render_params = RenderParams {
            cell_count,
            gamma,
            color_scale: COLOR_SCALE as f32,
            _padding: 0,
        };
        let render_uniform =
            create_uniform_buffer(&self.context.device, &render_params, "render_params");

        let device = &self.context.device;
        let pipelines = &self.context.pipelines;

        let downsample_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("downsample_bind_group"),
            layout: &pipelines.downsample_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.buffers.histogram.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.buffers.downsampled.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: downsample_uniform.as_entire_binding(),
                },
            ],
        });

        let max_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("max_bind_group"),
            layout: &pipelines.max_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.buffers.downsampled.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.buffers.max.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: max_uniform.as_entire_binding(),
                },
            ],
        });

        let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("render_bind_group"),
            layout: &pipelines.render_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.buffers.downsampled.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.buffers.max.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.buffers.frame.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: render_uniform.as_entire_binding(),
                },
            ],
        });

        // One submission; compute passes within an encoder execute in order,
        // so each stage sees the previous stage's writes
        let mut batch = CommandBatch::new(&self.context, "render_frame");
        batch.dispatch_cells(
            &pipelines.downsample,
            &downsample_bind_group,
            cell_count,
            "downsample_pass",
        )?;
        batch.clear_buffer(&self.buffers.max);
        batch.dispatch_cells(
            &pipelines.histogram_max,
            &max_bind_group,
            cell_count,
            "max_pass",
        )?;
        batch.dispatch_cells(
            &pipelines.render,
            &render_bind_group,
            cell_count,
            "render_pass",
        )?;
        batch.finish();

        self.buffers.download_frame()
    }

    /// Download the downsampled histogram (for diagnostics and parity
    /// checks).
    pub fn downsampled(&self) -> Result<Vec<u32>, GpuError> {
        self.buffers.download_downsampled()
    }

    /// Download the supersampled histogram.
    pub fn histogram(&self) -> Result<Vec<u32>, GpuError> {
        self.buffers.download_histogram()
    }
}

fn row_to_vec4(row: [f32; 3]) -> [f32; 4] {
    [row[0], row[1], row[2], 0.0]
}
