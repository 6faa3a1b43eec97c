use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use patchfill::{InpaintConfig, Inpainter, Pixel, RgbImage};

/// PatchMatch inpainting CLI — fill the masked region of a PNG/JPEG image
#[derive(Parser)]
#[command(name = "patchfill", version)]
struct Args {
    /// Source image file (PNG, JPEG or BMP)
    source: PathBuf,

    /// Mask image of the same size; every non-black pixel is filled
    mask: PathBuf,

    /// Output image file (format from extension)
    #[arg(short, long)]
    output: PathBuf,

    /// Patch edge length in pixels
    #[arg(short, long)]
    patch_size: Option<u32>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many iterations
    #[arg(short = 'n', long)]
    max_iterations: Option<u32>,

    /// TOML config file; command-line flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write each iteration's image into this directory
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Print a JSON summary to stdout
    #[arg(long)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Summary {
    source: String,
    mask: String,
    output: String,
    width: u32,
    height: u32,
    patch_size: u32,
    iterations: u32,
    finished: bool,
    percent_complete: f64,
}

fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to open image: {}", path.display()))?
        .into_rgb8();

    let width = img.width();
    let height = img.height();
    let pixels = img
        .pixels()
        .map(|p| Pixel::new(p.0[0], p.0[1], p.0[2]))
        .collect();

    Ok(RgbImage::from_buf(width, height, pixels))
}

fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let buf = image::RgbImage::from_raw(img.width, img.height, img.to_rgb_bytes())
        .context("pixel buffer does not match image dimensions")?;
    buf.save(path)
        .with_context(|| format!("failed to write image: {}", path.display()))
}

fn load_config(args: &Args) -> Result<InpaintConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            InpaintConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => InpaintConfig::default(),
    };

    if let Some(p) = args.patch_size {
        config.patch_size = p;
    }
    if let Some(s) = args.seed {
        config.seed = s;
    }
    if args.max_iterations.is_some() {
        config.max_iterations = args.max_iterations;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = load_config(&args)?;
    let source = load_image(&args.source)?;
    let mask = load_image(&args.mask)?;
    let (width, height) = (source.width, source.height);

    if !args.quiet {
        eprintln!(
            "inpainting {} ({}x{}, {} hole pixels, patch {})",
            args.source.display(),
            width,
            height,
            mask.hole_count(),
            config.patch_size,
        );
    }

    if let Some(dir) = &args.snapshots {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create snapshot dir: {}", dir.display()))?;
    }

    let mut engine = Inpainter::with_config(source, mask, &config)
        .context("failed to start inpainting")?;

    while !engine.is_finished() {
        if config.max_iterations.is_some_and(|max| engine.iterations() >= max) {
            info!("stopping at iteration limit {}", engine.iterations());
            break;
        }
        engine.advance();

        if !args.quiet {
            eprintln!(
                "  iteration {}: {:.0}%",
                engine.iterations(),
                engine.percent_complete()
            );
        }
        if let Some(dir) = &args.snapshots {
            let path = dir.join(format!("iter_{:03}.png", engine.iterations()));
            save_image(engine.current_image(), &path)?;
        }
    }

    save_image(engine.current_image(), &args.output)?;

    if !args.quiet {
        eprintln!("  wrote {}", args.output.display());
    }

    if args.json {
        let progress = engine.progress();
        let summary = Summary {
            source: args.source.display().to_string(),
            mask: args.mask.display().to_string(),
            output: args.output.display().to_string(),
            width,
            height,
            patch_size: engine.patch_size(),
            iterations: progress.iterations,
            finished: progress.finished,
            percent_complete: progress.percent_complete,
        };
        let json = if args.pretty {
            serde_json::to_string_pretty(&summary)?
        } else {
            serde_json::to_string(&summary)?
        };
        println!("{json}");
    }

    Ok(())
}
