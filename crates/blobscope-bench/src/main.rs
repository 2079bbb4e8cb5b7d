//! blobscope-bench: CLI tool for segmentation parameter experimentation and diagnostics.
//!
//! Runs the blob segmentation pipeline on a given image file with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Tuning the minimum component area and simplification tolerance
//! - Checking how the classifier cutoffs react to a given sample
//! - Measuring per-stage durations to identify bottlenecks
//! - Producing SVG or PNG overlays of the detected components
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin blobscope-bench -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use blobscope_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use blobscope_pipeline::{
    BorderPolicy, ClassifierConfig, DescribeConfig, RgbaImage, SegmentConfig, Segmentation,
};
use clap::{Parser, ValueEnum};

/// Segmentation parameter experimentation and diagnostics for blobscope.
///
/// Runs the blob segmentation pipeline on a given image with configurable
/// parameters and prints detailed per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "blobscope-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Components with this many pixels or fewer are discarded.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_MIN_COMPONENT_AREA, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    min_area: usize,

    /// Douglas-Peucker tolerance as a fraction of the component perimeter.
    #[arg(long, default_value_t = SegmentConfig::DEFAULT_SIMPLIFY_EPSILON_FACTOR)]
    epsilon_factor: f64,

    /// Treatment of components touching the image edge.
    #[arg(long, value_enum, default_value_t = Border::Exclude)]
    border: Border,

    /// Components with average intensity below this count as dark.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_DARK_INTENSITY)]
    dark_intensity: f64,

    /// Components with area above this count as large.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_LARGE_AREA)]
    large_area: usize,

    /// More dark components than this flags the sample.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_DARK_COUNT_LIMIT)]
    dark_limit: usize,

    /// More large components than this flags the sample.
    #[arg(long, default_value_t = ClassifierConfig::DEFAULT_LARGE_COUNT_LIMIT)]
    large_limit: usize,

    /// Invert the decoded image before segmenting (for dark blobs on a
    /// bright background).
    #[arg(long)]
    invert: bool,

    /// Print per-component descriptions after the report.
    #[arg(long)]
    describe: bool,

    /// Write an SVG overlay to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a PNG overlay (source image with component circles) to file.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full segmentation config as a JSON string.
    ///
    /// When provided, all other segmentation parameter flags are ignored.
    /// The JSON must be a valid `SegmentConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Border policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Border {
    /// Drop components that reach the image edge.
    Exclude,
    /// Keep components that reach the image edge.
    Include,
}

/// Build a [`SegmentConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<SegmentConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(SegmentConfig {
        min_component_area: cli.min_area,
        simplify_epsilon_factor: cli.epsilon_factor,
        border_policy: match cli.border {
            Border::Exclude => BorderPolicy::ExcludeTouching,
            Border::Include => BorderPolicy::Include,
        },
        classifier: ClassifierConfig {
            dark_intensity: cli.dark_intensity,
            large_area: cli.large_area,
            dark_count_limit: cli.dark_limit,
            large_count_limit: cli.large_limit,
        },
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let source = match blobscope_pipeline::grayscale::decode_rgba(&image_bytes) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    // Polarity is the caller's concern; the pipeline always treats bright
    // pixels as foreground.
    let mut working = source.clone();
    if cli.invert {
        image::imageops::invert(&mut working);
    }

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        working.width(),
        working.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match blobscope_pipeline::segment_with_diagnostics(
            working.as_raw(),
            working.width(),
            working.height(),
            &config,
            &StdClock,
        ) {
            Ok((segmentation, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Descriptions and overlays come from the first run only.
                if run == 0 {
                    if cli.describe && !print_descriptions(&segmentation, cli.json) {
                        return ExitCode::FAILURE;
                    }
                    if let Some(ref svg_path) = cli.svg {
                        write_svg(&cli.image_path, svg_path, &segmentation, &config);
                    }
                    if let Some(ref png_path) = cli.png {
                        write_png(png_path, &source, &segmentation);
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print per-component descriptions. Returns `false` on a serialization
/// failure.
fn print_descriptions(segmentation: &Segmentation, json: bool) -> bool {
    let details = blobscope_pipeline::describe::describe_components(
        &segmentation.components,
        &DescribeConfig::default(),
    );

    if json {
        return match serde_json::to_string_pretty(&details) {
            Ok(out) => {
                println!("{out}");
                true
            }
            Err(e) => {
                eprintln!("Error serializing descriptions: {e}");
                false
            }
        };
    }

    println!();
    println!(
        "{:>4} {:>8} {:>12} {:>9} {:>8}  {}",
        "#", "Area", "Size %", "Vertices", "Color", "Findings"
    );
    println!("{}", "-".repeat(72));
    for d in &details {
        println!(
            "{:>4} {:>8} {:>11.1}% {:>9} {:>8.1}  {}",
            d.number,
            d.area,
            d.size_percentage,
            d.vertex_count,
            d.color_difference,
            d.description(),
        );
    }
    true
}

fn write_svg(image_path: &Path, svg_path: &Path, segmentation: &Segmentation, config: &SegmentConfig) {
    let title = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let desc = format!(
        "{}, {} components (threshold {})",
        segmentation.summary.classification,
        segmentation.summary.component_count,
        segmentation.threshold,
    );
    let config_json = serde_json::to_string(config).ok();
    let metadata = blobscope_export::SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: config_json.as_deref(),
    };
    let svg = blobscope_export::to_overlay_svg(
        &segmentation.components,
        segmentation.dimensions,
        &metadata,
    );
    match std::fs::write(svg_path, &svg) {
        Ok(()) => {
            eprintln!(
                "SVG written to {} ({} bytes)",
                svg_path.display(),
                svg.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing SVG to {}: {e}", svg_path.display());
        }
    }
}

fn write_png(png_path: &Path, source: &RgbaImage, segmentation: &Segmentation) {
    let overlay = blobscope_pipeline::overlay::draw_overlay(source, &segmentation.components);
    match overlay.save_with_format(png_path, image::ImageFormat::Png) {
        Ok(()) => eprintln!("PNG written to {}", png_path.display()),
        Err(e) => eprintln!("Error writing PNG to {}: {e}", png_path.display()),
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Luma", |d| d.luma.duration),
        ("Threshold", |d| d.threshold.duration),
        ("Binarize", |d| d.binarize.duration),
        ("Trace + Simplify", |d| d.trace.duration),
        ("Summarize", |d| d.summarize.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("blobscope-bench").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_segment_config() {
        let cli = parse(&["image.png"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, SegmentConfig::default());
        assert_eq!(cli.runs, 1);
        assert!(!cli.invert);
    }

    #[test]
    fn flags_override_fields() {
        let cli = parse(&[
            "image.png",
            "--min-area",
            "10",
            "--border",
            "include",
            "--large-limit",
            "0",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.min_component_area, 10);
        assert_eq!(config.border_policy, BorderPolicy::Include);
        assert_eq!(config.classifier.large_count_limit, 0);
    }

    #[test]
    fn zero_min_area_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["blobscope-bench", "image.png", "--min-area", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_json_takes_precedence() {
        let json = serde_json::to_string(&SegmentConfig {
            min_component_area: 7,
            ..SegmentConfig::default()
        })
        .unwrap();
        let cli = parse(&["image.png", "--min-area", "99", "--config-json", json.as_str()]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.min_component_area, 7);
    }

    #[test]
    fn malformed_config_json_is_an_error() {
        let cli = parse(&["image.png", "--config-json", "{not json"]);
        assert!(config_from_cli(&cli).is_err());
    }
}
