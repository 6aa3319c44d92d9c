mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subframe", about = "Subframe quality measurement tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure FWHM, eccentricity, noise and SNR weight of subframes
    Measure(commands::measure::MeasureArgs),
    /// Run only the star detector on one image
    Detect(commands::detect::DetectArgs),
    /// Print the default configuration as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
