//! Batch loop controller.
//!
//! Owns the render state machine and the per-run histogram buffers (through
//! the backend renderer). Batches are dispatched back to back, each one
//! fully completed before the next is scheduled, so the accumulated
//! histogram is always consistent when the frame is re-derived. Any change
//! to the effective render configuration (transforms, camera, resolution,
//! palette, iteration budget, seed) clears the histogram and resets the
//! batch counter; tone-mapping parameters re-derive the frame without
//! touching accumulated state.

#[cfg(test)]
mod tests;

use std::fmt;

use crate::models::{Flame, IterationOptions, PostProcessingOptions};
use crate::pipeline::CpuRenderer;

#[cfg(feature = "gpu")]
use crate::gpu::{GpuContext, GpuError, GpuRenderer};
#[cfg(feature = "gpu")]
use std::sync::Arc;

/// Errors surfaced by the render loop.
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Rejected before any dispatch: the flame, options, or gamma are not
    /// renderable
    InvalidParameters(String),
    /// The compute device could not allocate buffers at the requested
    /// resolution; terminal for this run, the caller may retry smaller
    ResourceExhaustion(String),
    /// The compute device failed or went away mid-run; terminal
    DeviceLost(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidParameters(e) => write!(f, "invalid parameters: {}", e),
            RenderError::ResourceExhaustion(e) => write!(f, "resource exhaustion: {}", e),
            RenderError::DeviceLost(e) => write!(f, "device lost: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(feature = "gpu")]
impl From<GpuError> for RenderError {
    fn from(error: GpuError) -> Self {
        match error {
            GpuError::ResourceExhaustion(e) => RenderError::ResourceExhaustion(e),
            other => RenderError::DeviceLost(other.to_string()),
        }
    }
}

/// State of the batch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// No render requested
    Idle,
    /// Dispatching batches
    Running,
    /// Stopped without resetting accumulated state
    Paused,
    /// `batch_limit` reached; terminal until parameters change or `reset`
    LimitReached,
}

/// Compute backend executing the pipeline stages.
pub enum RenderBackend {
    Cpu(CpuRenderer),
    #[cfg(feature = "gpu")]
    Gpu(GpuRenderer),
}

impl RenderBackend {
    fn clear(&mut self) -> Result<(), RenderError> {
        match self {
            RenderBackend::Cpu(renderer) => {
                renderer.clear();
                Ok(())
            }
            #[cfg(feature = "gpu")]
            RenderBackend::Gpu(renderer) => renderer.clear().map_err(RenderError::from),
        }
    }

    fn generate_points(&self, batch_index: u32) -> Result<(), RenderError> {
        match self {
            RenderBackend::Cpu(renderer) => {
                renderer.generate_points(batch_index);
                Ok(())
            }
            #[cfg(feature = "gpu")]
            RenderBackend::Gpu(renderer) => renderer
                .generate_points(batch_index)
                .map_err(RenderError::from),
        }
    }

    fn render_frame(&self, gamma: f32) -> Result<Vec<f32>, RenderError> {
        match self {
            RenderBackend::Cpu(renderer) => Ok(renderer.render_frame(gamma)),
            #[cfg(feature = "gpu")]
            RenderBackend::Gpu(renderer) => renderer.render_frame(gamma).map_err(RenderError::from),
        }
    }
}

/// Validate the full render configuration; all failures are
/// [`RenderError::InvalidParameters`] and precede any dispatch.
fn validate(
    flame: &Flame,
    options: &IterationOptions,
    post: &PostProcessingOptions,
) -> Result<(), RenderError> {
    flame.validate().map_err(RenderError::InvalidParameters)?;
    options.validate().map_err(RenderError::InvalidParameters)?;
    post.validate().map_err(RenderError::InvalidParameters)?;
    Ok(())
}

/// The batch loop: repeatedly dispatches the point generator against the
/// run's histogram and re-derives the output frame after each batch.
pub struct RenderLoop {
    flame: Flame,
    options: IterationOptions,
    post: PostProcessingOptions,
    backend: RenderBackend,
    state: RenderState,
    batches_completed: u32,
}

impl RenderLoop {
    /// Build a loop over the CPU backend.
    pub fn new(
        flame: Flame,
        options: IterationOptions,
        post: PostProcessingOptions,
    ) -> Result<Self, RenderError> {
        validate(&flame, &options, &post)?;
        let backend = RenderBackend::Cpu(CpuRenderer::new(&flame, &options));
        Ok(Self {
            flame,
            options,
            post,
            backend,
            state: RenderState::Idle,
            batches_completed: 0,
        })
    }

    /// Build a loop over the GPU backend.
    #[cfg(feature = "gpu")]
    pub fn new_gpu(
        context: Arc<GpuContext>,
        flame: Flame,
        options: IterationOptions,
        post: PostProcessingOptions,
    ) -> Result<Self, RenderError> {
        validate(&flame, &options, &post)?;
        let renderer = GpuRenderer::new(context, &flame, &options)?;
        Ok(Self {
            flame,
            options,
            post,
            backend: RenderBackend::Gpu(renderer),
            state: RenderState::Idle,
            batches_completed: 0,
        })
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Number of batches accumulated into the current histogram.
    pub fn batches_completed(&self) -> u32 {
        self.batches_completed
    }

    pub fn options(&self) -> &IterationOptions {
        &self.options
    }

    pub fn flame(&self) -> &Flame {
        &self.flame
    }

    /// Begin (or resume) dispatching batches.
    pub fn start(&mut self) {
        if matches!(self.state, RenderState::Idle | RenderState::Paused) {
            self.state = RenderState::Running;
        }
    }

    /// Stop scheduling further batches without resetting accumulated state.
    /// An in-progress batch is never interrupted; `step` simply stops being
    /// called.
    pub fn pause(&mut self) {
        if self.state == RenderState::Running {
            self.state = RenderState::Paused;
        }
    }

    /// Clear the histogram, reset the batch counter, and return to `Idle`.
    pub fn reset(&mut self) -> Result<(), RenderError> {
        self.backend.clear()?;
        self.batches_completed = 0;
        self.state = RenderState::Idle;
        Ok(())
    }

    /// Dispatch one batch if the loop is running.
    ///
    /// Returns `Ok(true)` when a batch was dispatched and completed; the
    /// batch counter has then advanced and the loop may have transitioned to
    /// `LimitReached`.
    pub fn step(&mut self) -> Result<bool, RenderError> {
        if self.state != RenderState::Running {
            return Ok(false);
        }

        self.backend.generate_points(self.batches_completed)?;
        self.batches_completed += 1;
        crate::verbose_println!(
            "batch {}/{} complete",
            self.batches_completed,
            self.options.batch_limit
        );

        if self.batches_completed >= self.options.batch_limit {
            self.state = RenderState::LimitReached;
        }
        Ok(true)
    }

    /// Run batches until the limit is reached or the loop leaves `Running`,
    /// notifying `on_batch` with the completed-batch count after each one.
    pub fn run_to_limit<F>(&mut self, mut on_batch: F) -> Result<(), RenderError>
    where
        F: FnMut(u32),
    {
        self.start();
        while self.step()? {
            on_batch(self.batches_completed);
        }
        Ok(())
    }

    /// Re-derive the output frame (RGBA f32, `width * height * 4`) from the
    /// accumulated histogram.
    pub fn frame(&self) -> Result<Vec<f32>, RenderError> {
        self.backend.render_frame(self.post.gamma)
    }

    /// Update tone mapping only; the histogram and batch counter are kept.
    pub fn set_post_processing(&mut self, post: PostProcessingOptions) -> Result<(), RenderError> {
        post.validate().map_err(RenderError::InvalidParameters)?;
        self.post = post;
        Ok(())
    }

    /// Replace the flame. A change invalidates the histogram: buckets are
    /// cleared, the counter resets, and the loop re-enters `Running` if it
    /// was running, `Idle` otherwise.
    pub fn set_flame(&mut self, flame: Flame) -> Result<(), RenderError> {
        flame.validate().map_err(RenderError::InvalidParameters)?;
        if flame == self.flame {
            return Ok(());
        }
        self.flame = flame;
        self.rebuild()
    }

    /// Replace the iteration options (camera, resolution, palette, budget,
    /// seed). A change invalidates the histogram like `set_flame`.
    pub fn set_options(&mut self, options: IterationOptions) -> Result<(), RenderError> {
        options.validate().map_err(RenderError::InvalidParameters)?;
        if options == self.options {
            return Ok(());
        }
        self.options = options;
        self.rebuild()
    }

    /// Rebuild the backend for the current configuration and reset run
    /// state, preserving `Running` if the loop was live.
    fn rebuild(&mut self) -> Result<(), RenderError> {
        let was_running = self.state == RenderState::Running;
        let backend = match &self.backend {
            RenderBackend::Cpu(_) => {
                RenderBackend::Cpu(CpuRenderer::new(&self.flame, &self.options))
            }
            #[cfg(feature = "gpu")]
            RenderBackend::Gpu(renderer) => {
                let context = renderer.context();
                RenderBackend::Gpu(GpuRenderer::new(context, &self.flame, &self.options)?)
            }
        };
        self.backend = backend;
        self.batches_completed = 0;
        self.state = if was_running {
            RenderState::Running
        } else {
            RenderState::Idle
        };
        Ok(())
    }
}
