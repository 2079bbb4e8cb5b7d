//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! The segmentation core never logs. Instead, every call to
//! [`segment_with_diagnostics`] returns a [`PipelineDiagnostics`] value
//! alongside the segmentation, and callers decide how to surface it.
//!
//! Time is read through the [`Clock`] trait so the library carries no
//! platform timer of its own; the bench CLI supplies one backed by
//! [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::tracer::TraceStats;
use crate::types::{Classification, SegmentConfig, SegmentError, Segmentation};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic time for stage measurements.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: luma conversion (includes input validation).
    pub luma: StageDiagnostics,
    /// Stage 2: threshold selection.
    pub threshold: StageDiagnostics,
    /// Stage 3: binarization.
    pub binarize: StageDiagnostics,
    /// Stages 4+5: component tracing and shape simplification.
    pub trace: StageDiagnostics,
    /// Stage 6: aggregation and classification.
    pub summarize: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: DiagnosticsSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Luma conversion metrics.
    Luma {
        width: u32,
        height: u32,
        pixel_count: u64,
    },
    /// Threshold selection metrics.
    Threshold {
        /// Selected threshold.
        threshold: u8,
        /// Number of histogram bins with at least one pixel.
        occupied_bins: usize,
    },
    /// Binarization metrics.
    Binarize {
        foreground_pixels: u64,
        total_pixels: u64,
    },
    /// Component tracing metrics.
    Trace {
        /// Number of kept components.
        component_count: usize,
        /// Full accounting of the tracing pass.
        stats: TraceStats,
    },
    /// Aggregation metrics.
    Summarize {
        component_count: usize,
        dark_count: usize,
        large_count: usize,
        classification: Classification,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub image_width: u32,
    pub image_height: u32,
    pub pixel_count: u64,
    pub threshold: u8,
    pub component_count: usize,
    pub classification: Classification,
}

/// Run the full pipeline, timing every stage.
///
/// # Errors
///
/// Same as [`crate::segment`].
pub fn segment_with_diagnostics<C: Clock>(
    rgba: &[u8],
    width: u32,
    height: u32,
    config: &SegmentConfig,
    clock: &C,
) -> Result<(Segmentation, PipelineDiagnostics), SegmentError> {
    let start = clock.now();

    let t = clock.now();
    let gray = Pipeline::new(rgba, width, height, config.clone()).luma()?;
    let luma = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: gray.metrics(),
    };

    let t = clock.now();
    let thresholded = gray.threshold();
    let threshold = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: thresholded.metrics(),
    };

    let t = clock.now();
    let binarized = thresholded.binarize();
    let binarize = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: binarized.metrics(),
    };

    let t = clock.now();
    let traced = binarized.trace();
    let trace = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: traced.metrics(),
    };

    let t = clock.now();
    let summarized = traced.summarize();
    let summarize = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: summarized.metrics(),
    };

    let segmentation = summarized.into_segmentation();
    let total_duration = clock.elapsed(&start);

    let diagnostics = PipelineDiagnostics {
        luma,
        threshold,
        binarize,
        trace,
        summarize,
        total_duration,
        summary: DiagnosticsSummary {
            image_width: segmentation.dimensions.width,
            image_height: segmentation.dimensions.height,
            pixel_count: segmentation.dimensions.pixel_count(),
            threshold: segmentation.threshold,
            component_count: segmentation.summary.component_count,
            classification: segmentation.summary.classification,
        },
    };

    Ok((segmentation, diagnostics))
}

impl PipelineDiagnostics {
    /// Stages in pipeline order, with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 5] {
        [
            ("Luma", &self.luma),
            ("Threshold", &self.threshold),
            ("Binarize", &self.binarize),
            ("Trace + Simplify", &self.trace),
            ("Summarize", &self.summarize),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Threshold: {}  |  Components: {}  |  Classification: {}",
            self.summary.threshold, self.summary.component_count, self.summary.classification,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Luma { width, height, .. } => format!("{width}x{height}"),
        StageMetrics::Threshold {
            threshold,
            occupied_bins,
        } => format!("t={threshold} bins={occupied_bins}"),
        StageMetrics::Binarize {
            foreground_pixels,
            total_pixels,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixels > 0 {
                *foreground_pixels as f64 / *total_pixels as f64 * 100.0
            } else {
                0.0
            };
            format!("fg={foreground_pixels} ({density:.1}%)")
        }
        StageMetrics::Trace {
            component_count,
            stats,
        } => format!(
            "{component_count} kept, {} small, {} border, pts {}->{}",
            stats.small_components,
            stats.border_components,
            stats.points_before_simplify,
            stats.points_after_simplify,
        ),
        StageMetrics::Summarize {
            dark_count,
            large_count,
            classification,
            ..
        } => format!("dark={dark_count} large={large_count} -> {classification}"),
    }
}
