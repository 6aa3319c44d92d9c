use std::path::Path;

use console::Style;
use subframe_core::batch::{BatchReport, ErrorPolicy};
use subframe_core::config::SubframeConfig;
use subframe_core::frame::Frame;
use subframe_core::measure::{
    Detection, MeasureItem, MeasureProperties, MeasureUnits, SortingProperty,
};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    failed: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            failed: Style::new().red().bold(),
        }
    }
}

fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

fn with_unit(value: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{value:.4}")
    } else {
        format!("{value:.4} {unit}")
    }
}

pub fn print_measure_summary(config: &SubframeConfig, files: usize) {
    let s = Styles::new();
    let detector = &config.measure.detector;
    let psf = &config.measure.psf;

    println!();
    println!("  {}", s.title.apply_to("Subframe Measurement"));
    println!("  {}", s.title.apply_to(rule(20)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Files"),
        s.value.apply_to(files)
    );
    let workers = match config.batch.workers {
        0 => "auto".to_string(),
        n => n.to_string(),
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("Workers"),
        s.value.apply_to(workers)
    );
    let policy = match config.batch.on_error {
        ErrorPolicy::Continue => "continue",
        ErrorPolicy::AbortBatch => "abort",
        ErrorPolicy::AskCaller => "ask",
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to("On error"),
        s.method.apply_to(policy)
    );
    println!();

    println!("  {}", s.header.apply_to("Star Detector"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Layers"),
        s.value.apply_to(format!(
            "{} structure, {} noise",
            detector.structure_layers, detector.noise_layers
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Sensitivity"),
        s.value.apply_to(detector.sensitivity)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Peak resp."),
        s.value.apply_to(detector.peak_response)
    );
    match detector.roi {
        Some(roi) => println!(
            "    {:<12}{}",
            s.label.apply_to("ROI"),
            s.value.apply_to(format!(
                "({}, {}) - ({}, {})",
                roi.x0, roi.y0, roi.x1, roi.y1
            ))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("ROI"),
            s.disabled.apply_to("full frame")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("PSF Fit"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Model"),
        s.method.apply_to(psf.model)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Shape"),
        s.value
            .apply_to(if psf.circular { "circular" } else { "elliptical" })
    );
    if config.measure.pedestal > 0.0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Pedestal"),
            s.value.apply_to(format!("{} DN", config.measure.pedestal))
        );
    }
    println!();
}

pub fn print_results(items: &[MeasureItem], units: &MeasureUnits) {
    let s = Styles::new();
    let fwhm = format!("FWHM {}", units.fwhm_label());
    let median = match units.range_label() {
        "" => "Median".to_string(),
        label => format!("Median {label}"),
    };

    println!();
    println!(
        "  {}",
        s.header.apply_to(format!(
            "{:>5}  {:<28} {:>10} {:>8} {:>10} {:>10} {:>10} {:>6}",
            "#", "File", fwhm, "Ecc.", "SNR W.", median, "Noise", "Stars"
        ))
    );
    println!("  {}", "-".repeat(96));

    for item in items {
        let value = |p: SortingProperty| p.value(item, units);
        println!(
            "  {:>5}  {:<28} {:>10.3} {:>8.3} {:>10.3} {:>10.4} {:>10.3e} {:>6}",
            item.index + 1,
            truncate(&item.name(), 28),
            value(SortingProperty::Fwhm),
            value(SortingProperty::Eccentricity),
            value(SortingProperty::SnrWeight),
            value(SortingProperty::Median),
            value(SortingProperty::Noise),
            item.data.star_count,
        );
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let tail: String = name
        .chars()
        .rev()
        .take(width - 1)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("\u{2026}{tail}")
}

pub fn print_statistics(props: &MeasureProperties, units: &MeasureUnits) {
    let s = Styles::new();
    let rows = [
        ("FWHM", props.fwhm, units.fwhm_label()),
        ("Eccentricity", props.eccentricity, ""),
        ("SNR weight", props.snr_weight, ""),
        ("Median", props.median, units.range_label()),
        ("Noise", props.noise, units.range_label()),
        ("Stars", props.stars, ""),
    ];

    println!();
    println!("  {}", s.header.apply_to("Statistics"));
    println!(
        "    {:<14}{:>14}{:>14}{:>14}{:>14}",
        s.label.apply_to(""),
        s.label.apply_to("min"),
        s.label.apply_to("max"),
        s.label.apply_to("median"),
        s.label.apply_to("mean dev")
    );
    for (name, p, unit) in rows {
        println!(
            "    {:<14}{:>14}{:>14}{:>14}{:>14}",
            s.label.apply_to(name),
            s.value.apply_to(format!("{:.4}", p.min)),
            s.value.apply_to(format!("{:.4}", p.max)),
            s.value.apply_to(with_unit(p.median, unit)),
            s.value.apply_to(format!("{:.4}", p.deviation)),
        );
    }
}

pub fn print_report(report: &BatchReport) {
    let s = Styles::new();

    println!();
    for failure in &report.failures {
        println!(
            "  {} {}: {}",
            s.failed.apply_to("failed"),
            s.path.apply_to(failure.path.display()),
            failure.message
        );
    }
    if report.cancelled {
        println!("  {}", s.disabled.apply_to("Batch aborted"));
    }
    println!("  {}", s.value.apply_to(report.summary()));
    println!();
}

pub fn print_detection(path: &Path, frame: &Frame, detection: &Detection, top: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Star Detector"));
    println!("  {}", s.title.apply_to(rule(13)));
    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(path.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!(
            "{}x{} ({}-bit)",
            frame.width(),
            frame.height(),
            frame.original_bit_depth
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Stars"),
        s.value.apply_to(detection.stars.len())
    );
    println!();

    if detection.stars.is_empty() {
        return;
    }

    let mut stars = detection.stars.clone();
    stars.sort_by(|a, b| b.flux.total_cmp(&a.flux));

    println!(
        "  {}",
        s.header.apply_to(format!(
            "{:>9} {:>9} {:>6} {:>10} {:>8} {:>10}",
            "x", "y", "Size", "Flux", "Peak", "Background"
        ))
    );
    println!("  {}", "-".repeat(57));
    for star in stars.iter().take(top) {
        println!(
            "  {:>9.1} {:>9.1} {:>6} {:>10.4} {:>8.4} {:>10.4}",
            star.x, star.y, star.size, star.flux, star.peak, star.background
        );
    }
    if stars.len() > top {
        println!(
            "  {}",
            s.disabled
                .apply_to(format!("... {} more", stars.len() - top))
        );
    }
    println!();
}
