//! Process command - redact the Aadhaar number in a single card image.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use admask_core::{AdmaskConfig, ImageInput, service_from_dir};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input card image (PNG, JPEG, TIFF, BMP)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file for the redacted image (default: <input>_redacted.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model directory (overrides the configured one)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Sweep all 15-degree rotations instead of only the cardinal angles
    #[arg(long)]
    thorough: bool,

    /// Show per-stage timings
    #[arg(long)]
    show_timings: bool,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = if let Some(path) = config_path {
        AdmaskConfig::from_file(Path::new(path))?
    } else {
        AdmaskConfig::default()
    };

    if let Some(model_dir) = &args.model_dir {
        config.models.model_dir = model_dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !matches!(extension.as_str(), "png" | "jpg" | "jpeg" | "tiff" | "bmp") {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let service = service_from_dir(config)
        .map_err(|e| anyhow::anyhow!("Failed to load models: {}", e))?;

    let result = service
        .redact(ImageInput::from(args.input.as_path()), args.thorough)
        .map_err(|e| anyhow::anyhow!("Redaction failed: {}", e))?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    result.image.save(&output_path)?;

    println!("{}", serde_json::to_string_pretty(&result.fields)?);
    println!(
        "{} Redacted image written to {}",
        style("✓").green(),
        output_path.display()
    );

    if args.show_timings {
        println!();
        println!(
            "{} Preprocessing:   {}ms",
            style("ℹ").blue(),
            result.metrics.preprocessing_ms
        );
        println!(
            "{} Rotation search: {}ms",
            style("ℹ").blue(),
            result.metrics.detection_ms
        );
        println!(
            "{} Postprocessing:  {}ms",
            style("ℹ").blue(),
            result.metrics.postprocessing_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}_redacted.png", stem))
}
