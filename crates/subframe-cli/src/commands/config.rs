use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use subframe_core::config::SubframeConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Destination file; the config is printed when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

const HEADER: &str = "# SubframeSelector settings. Omitted keys take their default value.\n\n";

/// Emit the default detection, PSF and batch settings as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let body = toml::to_string_pretty(&SubframeConfig::default())
        .context("Failed to serialize default config")?;
    let text = format!("{HEADER}{body}");

    match &args.output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write config to {}", path.display()))?;
            println!("Default config saved to {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
