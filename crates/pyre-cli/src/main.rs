use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use pyre_cli::{frame_to_rgba8, load_flame, load_palette};
use pyre_core::palette::preset_palette_names;
use pyre_core::{IterationOptions, PostProcessingOptions, RenderLoop};

#[derive(Parser)]
#[command(name = "pyre")]
#[command(version, about = "Flame fractal renderer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a flame to a PNG image
    Render {
        /// Built-in flame generator (e.g. barnsley-fern)
        #[arg(short, long, value_name = "NAME")]
        generator: Option<String>,

        /// Flame definition file (JSON)
        #[arg(short, long, value_name = "FILE")]
        flame: Option<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "flame.png")]
        out: PathBuf,

        /// Preset palette name
        #[arg(short, long, value_name = "NAME", default_value = "fire-dragon")]
        palette: String,

        /// Output width in pixels
        #[arg(long, value_name = "PX", default_value = "800")]
        width: u32,

        /// Output height in pixels
        #[arg(long, value_name = "PX", default_value = "600")]
        height: u32,

        /// Histogram bins per pixel axis
        #[arg(long, value_name = "N", default_value = "2")]
        supersample: u32,

        /// Camera center x
        #[arg(long, value_name = "X", default_value = "0.0")]
        camera_x: f32,

        /// Camera center y
        #[arg(long, value_name = "Y", default_value = "0.0")]
        camera_y: f32,

        /// Camera zoom (1 shows x in (-1, 1))
        #[arg(long, value_name = "Z", default_value = "1.0")]
        zoom: f32,

        /// Iterations per chain per batch
        #[arg(long, value_name = "N", default_value = "10000")]
        batch_size: u32,

        /// Number of independent chains
        #[arg(long, value_name = "N", default_value = "1024")]
        parallelism: u32,

        /// Number of batches to accumulate
        #[arg(long, value_name = "N", default_value = "100")]
        batches: u32,

        /// Tone mapping gamma
        #[arg(long, value_name = "G", default_value = "4.0")]
        gamma: f32,

        /// RNG seed; identical seeds reproduce identical images
        #[arg(long, value_name = "SEED", default_value = "0")]
        seed: u64,

        /// Render on the GPU instead of the CPU
        #[arg(long)]
        gpu: bool,

        /// Print per-batch progress
        #[arg(long)]
        verbose: bool,
    },

    /// List embedded preset palettes
    Palettes,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Palettes => {
            for name in preset_palette_names() {
                println!("{}", name);
            }
            Ok(())
        }
        Commands::Render {
            generator,
            flame,
            out,
            palette,
            width,
            height,
            supersample,
            camera_x,
            camera_y,
            zoom,
            batch_size,
            parallelism,
            batches,
            gamma,
            seed,
            gpu,
            verbose,
        } => {
            pyre_core::config::set_verbose(verbose);

            let flame = load_flame(generator.as_deref(), flame.as_deref())?;
            let palette = load_palette(&palette)?;

            let mut options = IterationOptions::with_palette(palette);
            options.width = width;
            options.height = height;
            options.supersample = supersample;
            options.camera_x = camera_x;
            options.camera_y = camera_y;
            options.camera_zoom = zoom;
            options.batch_size = batch_size;
            options.parallelism = parallelism;
            options.batch_limit = batches;
            options.seed = seed;

            let post = PostProcessingOptions { gamma };

            let mut render_loop =
                build_loop(flame, options, post, gpu).map_err(|e| e.to_string())?;

            render_loop
                .run_to_limit(|count| {
                    if verbose {
                        eprintln!("batch {}/{}", count, batches);
                    }
                })
                .map_err(|e| e.to_string())?;

            let frame = render_loop.frame().map_err(|e| e.to_string())?;
            let pixels = frame_to_rgba8(&frame);

            let image = image::RgbaImage::from_raw(width, height, pixels)
                .ok_or_else(|| "frame size mismatch".to_string())?;
            image
                .save(&out)
                .map_err(|e| format!("failed to write {}: {}", out.display(), e))?;

            eprintln!("wrote {}", out.display());
            Ok(())
        }
    }
}

#[cfg(feature = "gpu")]
fn build_loop(
    flame: pyre_core::Flame,
    options: IterationOptions,
    post: PostProcessingOptions,
    gpu: bool,
) -> Result<RenderLoop, pyre_core::RenderError> {
    if gpu {
        let context = pyre_core::gpu::GpuContext::new()
            .map_err(|e| pyre_core::RenderError::DeviceLost(e.to_string()))?;
        RenderLoop::new_gpu(std::sync::Arc::new(context), flame, options, post)
    } else {
        RenderLoop::new(flame, options, post)
    }
}

#[cfg(not(feature = "gpu"))]
fn build_loop(
    flame: pyre_core::Flame,
    options: IterationOptions,
    post: PostProcessingOptions,
    gpu: bool,
) -> Result<RenderLoop, pyre_core::RenderError> {
    if gpu {
        return Err(pyre_core::RenderError::InvalidParameters(
            "this build has no GPU support; rebuild with --features gpu".to_string(),
        ));
    }
    RenderLoop::new(flame, options, post)
}
