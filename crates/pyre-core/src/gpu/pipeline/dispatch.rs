//! Compute-pass recording and dispatch-size calculation.

use super::{MAX_WORKGROUPS_PER_DIM, WORKGROUP_SIZE};
use crate::gpu::context::{GpuContext, GpuError};

/// Split a flat invocation count into a dispatch grid.
///
/// Grids beyond 65535 workgroups are folded into two dimensions, giving up
/// to 65535^2 workgroups; the shader recovers the flat index from the grid.
pub(crate) fn workgroup_grid(total_invocations: u32, workgroup_size: u32) -> Result<(u32, u32), GpuError> {
    let total_workgroups = total_invocations.div_ceil(workgroup_size);

    if total_workgroups <= MAX_WORKGROUPS_PER_DIM {
        return Ok((total_workgroups.max(1), 1));
    }

    let side = ((total_workgroups as f64).sqrt().ceil() as u32).min(MAX_WORKGROUPS_PER_DIM);
    let workgroups_y = total_workgroups.div_ceil(side);

    if workgroups_y > MAX_WORKGROUPS_PER_DIM {
        return Err(GpuError::ExecutionError(format!(
            "grid too large: {} invocations need {} workgroups, max supported is {}",
            total_invocations,
            total_workgroups,
            MAX_WORKGROUPS_PER_DIM as u64 * MAX_WORKGROUPS_PER_DIM as u64
        )));
    }

    Ok((side, workgroups_y))
}

/// A batch of GPU commands accumulated into one command encoder.
///
/// Stages of a single pipeline run are recorded back to back and submitted
/// together; `finish` submits and blocks until the device signals
/// completion, which is the synchronization point between batches.
pub struct CommandBatch<'a> {
    ctx: &'a GpuContext,
    encoder: Option<wgpu::CommandEncoder>,
}

impl<'a> CommandBatch<'a> {
    /// Create a new command batch.
    pub fn new(ctx: &'a GpuContext, label: &'static str) -> Self {
        Self {
            ctx,
            encoder: Some(
                ctx.device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) }),
            ),
        }
    }

    /// Get mutable access to the encoder for recording commands.
    /// Panics if the batch has already been finished.
    pub(crate) fn encoder_mut(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder
            .as_mut()
            .expect("CommandBatch already finished")
    }

    /// Zero a buffer as part of the batch.
    pub fn clear_buffer(&mut self, buffer: &wgpu::Buffer) {
        self.encoder_mut().clear_buffer(buffer, 0, None);
    }

    /// Record a compute dispatch into the batch without submitting.
    pub fn dispatch(
        &mut self,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        workgroups: (u32, u32),
        label: &'static str,
    ) {
        let encoder = self.encoder_mut();
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(label),
            timestamp_writes: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
    }

    /// Record a dispatch over `total_invocations` flat invocations.
    pub fn dispatch_cells(
        &mut self,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        total_invocations: u32,
        label: &'static str,
    ) -> Result<(), GpuError> {
        let grid = workgroup_grid(total_invocations, WORKGROUP_SIZE)?;
        self.dispatch(pipeline, bind_group, grid, label);
        Ok(())
    }

    /// Submit all accumulated commands and wait for completion.
    /// This consumes the batch - no more commands can be added.
    pub fn finish(mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.ctx.queue.submit(std::iter::once(encoder.finish()));
            self.ctx.device.poll(wgpu::Maintain::Wait);
        }
    }
}
