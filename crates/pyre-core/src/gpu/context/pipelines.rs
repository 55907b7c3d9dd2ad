//! Compute pipeline creation for the flame pipeline stages.

use crate::gpu::shaders::Shaders;

/// Pre-compiled compute pipelines and their bind group layouts.
pub struct GpuPipelines {
    /// Chaos-game point generation into the supersampled histogram
    pub generate_points: wgpu::ComputePipeline,
    /// Supersampled histogram -> output-resolution histogram
    pub downsample: wgpu::ComputePipeline,
    /// Global max bucket count over the downsampled histogram
    pub histogram_max: wgpu::ComputePipeline,
    /// Log-density tone mapping into the RGBA frame buffer
    pub render: wgpu::ComputePipeline,

    // Cached bind group layouts, one per stage
    pub points_layout: wgpu::BindGroupLayout,
    pub downsample_layout: wgpu::BindGroupLayout,
    pub max_layout: wgpu::BindGroupLayout,
    pub render_layout: wgpu::BindGroupLayout,
}

/// Create all compute pipelines from shader sources.
pub fn create_pipelines(device: &wgpu::Device) -> GpuPipelines {
    // Load shader modules
    let points_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("generate_points"),
        source: wgpu::ShaderSource::Wgsl(Shaders::GENERATE_POINTS.into()),
    });

    let downsample_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("histogram_downsample"),
        source: wgpu::ShaderSource::Wgsl(Shaders::HISTOGRAM_DOWNSAMPLE.into()),
    });

    let max_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("histogram_max"),
        source: wgpu::ShaderSource::Wgsl(Shaders::HISTOGRAM_MAX.into()),
    });

    let render_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("histogram_render"),
        source: wgpu::ShaderSource::Wgsl(Shaders::HISTOGRAM_RENDER.into()),
    });

    // Bind group layouts per stage
    let points_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("points_layout"),
        entries: &[
            // Transforms (read-only)
            storage_entry(0, true),
            // Palette (read-only)
            storage_entry(1, true),
            // Histogram buckets (atomic read-write)
            storage_entry(2, false),
            // Parameters
            uniform_entry(3),
        ],
    });

    let downsample_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("downsample_layout"),
        entries: &[
            // Supersampled histogram (read-only)
            storage_entry(0, true),
            // Downsampled histogram (read-write)
            storage_entry(1, false),
            // Parameters
            uniform_entry(2),
        ],
    });

    let max_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("max_layout"),
        entries: &[
            // Downsampled histogram (read-only)
            storage_entry(0, true),
            // Max scalar (atomic read-write)
            storage_entry(1, false),
            // Parameters
            uniform_entry(2),
        ],
    });

    let render_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("render_layout"),
        entries: &[
            // Downsampled histogram (read-only)
            storage_entry(0, true),
            // Max scalar (read-only)
            storage_entry(1, true),
            // Output frame (read-write)
            storage_entry(2, false),
            // Parameters
            uniform_entry(3),
        ],
    });

    let generate_points = create_compute_pipeline(
        device,
        "generate_points",
        &points_layout,
        &points_module,
        "main",
    );

    let downsample = create_compute_pipeline(
        device,
        "histogram_downsample",
        &downsample_layout,
        &downsample_module,
        "main",
    );

    let histogram_max = create_compute_pipeline(
        device,
        "histogram_max",
        &max_layout,
        &max_module,
        "main",
    );

    let render = create_compute_pipeline(
        device,
        "histogram_render",
        &render_layout,
        &render_module,
        "main",
    );

    GpuPipelines {
        generate_points,
        downsample,
        histogram_max,
        render,
        points_layout,
        downsample_layout,
        max_layout,
        render_layout,
    }
}

/// Create a compute pipeline with the given parameters.
fn create_compute_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    module: &wgpu::ShaderModule,
    entry_point: &str,
) -> wgpu::ComputePipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        cache: None,
    })
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
