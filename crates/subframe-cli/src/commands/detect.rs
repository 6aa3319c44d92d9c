use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use subframe_core::io::{load_image, save_mask};
use subframe_core::measure::detect_frame;

use crate::summary;

#[derive(Args)]
pub struct DetectArgs {
    /// Input image (TIFF, PNG, ...)
    pub file: PathBuf,

    /// Run configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save the structure map as an image
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// List at most N stars
    #[arg(long, default_value = "20")]
    pub top: usize,
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let frame = load_image(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let detection = detect_frame(&frame, &config.measure)?;
    summary::print_detection(&args.file, &frame, &detection, args.top);

    if let Some(ref path) = args.map {
        save_mask(&detection.structures, path)
            .with_context(|| format!("Failed to write structure map {}", path.display()))?;
        println!("Structure map saved to {}", path.display());
    }

    Ok(())
}
