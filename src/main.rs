use anyhow::Context;
use clap::{Parser, Subcommand};
use image::ImageReader;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use driver_distraction::config::{DEFAULT_BUNDLE_PATH, DEFAULT_SKIP_INTERVAL};
use driver_distraction::stream::{annotate, prepare_output_dir};
use driver_distraction::{
    extract_features, ClassifyError, FrameOrchestrator, JsonBundleFile, Pipeline,
};

#[derive(Parser)]
#[command(name = "driver-distraction")]
#[command(about = "Classify driver behaviour in images and frame sequences")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one or more image files
    Classify {
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Path to the fitted pipeline bundle
        #[arg(long, env = "DRIVER_BUNDLE", default_value = DEFAULT_BUNDLE_PATH)]
        bundle: PathBuf,

        /// Print the JSON response payload instead of text
        #[arg(long)]
        json: bool,
    },
    /// Classify a directory of frames, sampling every Nth frame
    Stream {
        #[arg(value_name = "DIR")]
        frames: PathBuf,

        #[arg(long, env = "DRIVER_BUNDLE", default_value = DEFAULT_BUNDLE_PATH)]
        bundle: PathBuf,

        /// Classify every Nth frame, reuse the last result in between
        #[arg(long, default_value_t = DEFAULT_SKIP_INTERVAL)]
        skip: NonZeroU32,

        /// Save annotated frames to directory (must be empty)
        #[arg(long, value_name = "DIR")]
        annotate_out: Option<PathBuf>,
    },
    /// Print descriptor statistics for an image; needs no bundle
    Describe {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_pipeline(bundle: &Path) -> anyhow::Result<Pipeline> {
    // Refuse to serve anything without a usable bundle
    Pipeline::from_provider(&JsonBundleFile::new(bundle))
        .with_context(|| format!("Cannot start without pipeline bundle {}", bundle.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Classify {
            images,
            bundle,
            json,
        } => classify(&images, &bundle, json),
        Command::Stream {
            frames,
            bundle,
            skip,
            annotate_out,
        } => stream(&frames, &bundle, skip, annotate_out.as_deref()),
        Command::Describe { image } => describe(&image),
    }
}

fn classify(images: &[PathBuf], bundle: &Path, json: bool) -> anyhow::Result<()> {
    let pipeline = load_pipeline(bundle)?;

    for path in images {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let content_type = image::ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type());
        let response = pipeline.respond(content_type, &bytes);

        if json {
            println!("{}", serde_json::to_string(&response)?);
            continue;
        }

        match response {
            driver_distraction::InferenceResponse::Prediction(prediction) => {
                match prediction.confidence {
                    Some(confidence) => println!(
                        "{}: {} (confidence: {:.2})",
                        path.display(),
                        prediction.label,
                        confidence
                    ),
                    None => println!("{}: {}", path.display(), prediction.label),
                }
            }
            driver_distraction::InferenceResponse::Error { error } => {
                println!("{}: error: {}", path.display(), error);
            }
        }
    }

    Ok(())
}

/// Image files in a directory, sorted by name
fn frame_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && image::ImageFormat::from_path(path).is_ok())
        .collect();
    paths.sort();
    Ok(paths)
}

fn decode_frame(path: &Path) -> Result<image::DynamicImage, ClassifyError> {
    ImageReader::open(path)
        .map_err(|e| ClassifyError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(ClassifyError::from)
}

fn stream(
    dir: &Path,
    bundle: &Path,
    skip: NonZeroU32,
    annotate_out: Option<&Path>,
) -> anyhow::Result<()> {
    let pipeline = load_pipeline(bundle)?;
    if let Some(out) = annotate_out {
        prepare_output_dir(out)?;
    }

    let paths = frame_paths(dir)?;
    println!("Processing {} frames, sampling every {}\n", paths.len(), skip);

    let mut orchestrator = FrameOrchestrator::new(&pipeline, skip);
    let mut write_error = None;
    let summary = orchestrator.run(paths.iter().map(|p| decode_frame(p)), |frame, report| {
        println!("  frame {:>5}: {}", report.frame_number, report.overlay);

        if let (Some(out), Some(frame)) = (annotate_out, frame) {
            let target = out.join(format!("{:05}.png", report.frame_number));
            if let Err(e) = annotate(frame, report).save(&target) {
                write_error.get_or_insert(anyhow::anyhow!(
                    "Failed to save annotated frame {}: {}",
                    target.display(),
                    e
                ));
            }
        }
    });

    println!("\n=== Stream Summary ===");
    println!("Frames: {}", summary.frames);
    println!("Classified: {} ({} failed)", summary.classified, summary.failed);
    println!("Current Prediction: {}", summary.last_status.text());

    match write_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn describe(path: &Path) -> anyhow::Result<()> {
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
    println!("Image loaded: {}x{}\n", img.width(), img.height());

    let features = extract_features(&img)?;
    let sections = [
        ("gradient", features.gradient()),
        ("color", features.color()),
        ("texture", features.texture()),
    ];
    for (name, values) in sections {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
        println!(
            "  {:<8} len={:<6} min={:.4} max={:.4} mean={:.4}",
            name,
            values.len(),
            min,
            max,
            mean
        );
    }
    println!("\nTotal features: {}", features.len());
    Ok(())
}
