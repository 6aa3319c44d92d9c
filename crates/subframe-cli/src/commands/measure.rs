use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use subframe_core::batch::{
    run_batch, BatchReport, CancellationToken, ErrorDecision, ErrorPolicy, ProgressReporter,
    SubframeItem,
};
use subframe_core::error::SubframeError;
use subframe_core::io::ImageFileLoader;
use subframe_core::measure::{
    sort_items, MeasureData, MeasureItem, MeasureProperties, MeasureUnits, SortingProperty,
};
use subframe_core::psf::PsfModel;
use tracing::info;

use crate::summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum OnErrorArg {
    Continue,
    Abort,
    Ask,
}

impl From<OnErrorArg> for ErrorPolicy {
    fn from(arg: OnErrorArg) -> Self {
        match arg {
            OnErrorArg::Continue => ErrorPolicy::Continue,
            OnErrorArg::Abort => ErrorPolicy::AbortBatch,
            OnErrorArg::Ask => ErrorPolicy::AskCaller,
        }
    }
}

#[derive(Args)]
pub struct MeasureArgs {
    /// Subframes to measure
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Run configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Worker threads (0 = one per CPU)
    #[arg(long)]
    pub workers: Option<usize>,

    /// What to do when a subframe fails
    #[arg(long, value_enum)]
    pub on_error: Option<OnErrorArg>,

    /// PSF model (gaussian, moffat4, lorentzian, ...)
    #[arg(long)]
    pub model: Option<PsfModel>,

    /// Fit circular PSFs
    #[arg(long)]
    pub circular: bool,

    /// Sort the result table by this property
    #[arg(long, default_value = "index")]
    pub sort: SortingProperty,

    /// Sort in descending order
    #[arg(long)]
    pub descending: bool,

    /// Export the result table as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Fail before starting if any input file is missing
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &MeasureArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        config.batch.workers = workers;
    }
    if let Some(on_error) = args.on_error {
        config.batch.on_error = on_error.into();
    }
    if let Some(model) = args.model {
        config.measure.psf.model = model;
    }
    if args.circular {
        config.measure.psf.circular = true;
    }
    config.validate().context("Invalid subframe config")?;

    if args.strict {
        if let Some(missing) = args.files.iter().find(|path| !path.is_file()) {
            return Err(SubframeError::MissingFile(missing.clone()).into());
        }
    }

    summary::print_measure_summary(&config, args.files.len());

    let items: Vec<SubframeItem> = args.files.iter().map(SubframeItem::new).collect();
    let reporter = Arc::new(BarReporter::new(args.files.len())?);
    let report = run_batch(
        &items,
        Arc::new(ImageFileLoader),
        &config.measure,
        &config.batch,
        &CancellationToken::new(),
        reporter,
    )?;

    let units = &config.measure.units;
    let mut results = report.results.clone();
    sort_items(&mut results, args.sort, !args.descending, units);

    summary::print_results(&results, units);
    summary::print_statistics(&MeasureProperties::compute(&results, units), units);
    summary::print_report(&report);

    if let Some(ref path) = args.csv {
        write_csv(path, &results, units)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = results.len(), "CSV written");
        println!("Results saved to {}", path.display());
    }

    Ok(())
}

/// Progress bar driven by the batch scheduler.
struct BarReporter {
    pb: ProgressBar,
    failed: Style,
}

impl BarReporter {
    fn new(total: usize) -> Result<Self> {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
        );
        Ok(Self {
            pb,
            failed: Style::new().red().bold(),
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ProgressReporter for BarReporter {
    fn begin(&self, total: usize, _skipped: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_message("Measuring");
    }

    fn task_started(&self, _index: usize, path: &Path) {
        self.pb.set_message(file_name(path));
    }

    fn task_finished(
        &self,
        _index: usize,
        path: &Path,
        result: std::result::Result<&MeasureData, &SubframeError>,
    ) {
        if let Err(e) = result {
            self.pb.println(format!(
                "  {} {}: {}",
                self.failed.apply_to("failed"),
                file_name(path),
                e
            ));
        }
        self.pb.inc(1);
    }

    fn on_task_error(&self, _index: usize, path: &Path, error: &SubframeError) -> ErrorDecision {
        self.pb.suspend(|| {
            let term = Term::stderr();
            let prompt = format!(
                "{} {}: {}. Continue with the remaining files? [y/N] ",
                self.failed.apply_to("Error"),
                file_name(path),
                error
            );
            if term.write_str(&prompt).is_err() {
                return ErrorDecision::Abort;
            }
            match term.read_line() {
                Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => ErrorDecision::Continue,
                _ => ErrorDecision::Abort,
            }
        })
    }

    fn finish(&self, report: &BatchReport) {
        if report.cancelled {
            self.pb.abandon_with_message("Aborted");
        } else {
            self.pb.finish_with_message("Done");
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    index: usize,
    file: &'a Path,
    fwhm: f64,
    fwhm_mean_dev: f64,
    eccentricity: f64,
    eccentricity_mean_dev: f64,
    snr_weight: f64,
    median: f64,
    median_mean_dev: f64,
    noise: f64,
    noise_ratio: f64,
    stars: usize,
    star_residual: f64,
    star_residual_mean_dev: f64,
}

/// One row per subframe, values in the configured units.
fn write_csv(path: &Path, items: &[MeasureItem], units: &MeasureUnits) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for item in items {
        let value = |p: SortingProperty| p.value(item, units);
        wtr.serialize(CsvRow {
            index: item.index,
            file: &item.data.path,
            fwhm: value(SortingProperty::Fwhm),
            fwhm_mean_dev: value(SortingProperty::FwhmMeanDev),
            eccentricity: item.data.eccentricity,
            eccentricity_mean_dev: item.data.eccentricity_mean_dev,
            snr_weight: item.data.snr_weight,
            median: value(SortingProperty::Median),
            median_mean_dev: value(SortingProperty::MedianMeanDev),
            noise: value(SortingProperty::Noise),
            noise_ratio: item.data.noise_ratio,
            stars: item.data.star_count,
            star_residual: item.data.star_residual,
            star_residual_mean_dev: item.data.star_residual_mean_dev,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
