//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::segment`] which runs the entire pipeline in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use blobscope_pipeline::{Pipeline, SegmentConfig, SegmentError};
//! # fn run(rgba: &[u8], width: u32, height: u32) -> Result<(), SegmentError> {
//! let traced = Pipeline::new(rgba, width, height, SegmentConfig::default())
//!     .luma()?
//!     .threshold()
//!     .binarize()
//!     .trace();
//!
//! println!("{} components", traced.components().len());
//! let staged = traced.summarize().into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying the intermediates later stages (or the caller) still need.
//! Only [`Pending::luma`] can fail; every later stage is infallible.

use crate::diagnostics::StageMetrics;
use crate::tracer::{Trace, TraceStats};
use crate::types::{
    AnalysisSummary, Component, Dimensions, GrayImage, SegmentConfig, SegmentError, Segmentation,
};

/// Entry point for building a pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline over a borrowed RGBA buffer.
    ///
    /// No processing is performed; call [`.luma()`](Pending::luma) to
    /// begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(rgba: &[u8], width: u32, height: u32, config: SegmentConfig) -> Pending<'_> {
        Pending {
            config,
            rgba,
            width,
            height,
        }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing — call .luma() to continue"]
pub struct Pending<'a> {
    config: SegmentConfig,
    rgba: &'a [u8],
    width: u32,
    height: u32,
}

impl Pending<'_> {
    /// The raw RGBA source buffer.
    #[must_use]
    pub const fn source(&self) -> &[u8] {
        self.rgba
    }

    /// Validate the config and input, then convert to intensity.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidConfig`] if the configuration is
    /// rejected by [`SegmentConfig::validate`],
    /// [`SegmentError::EmptyImage`] if either dimension is zero, and
    /// [`SegmentError::InvalidInput`] if the buffer length does not match
    /// the dimensions.
    pub fn luma(self) -> Result<Grayscaled, SegmentError> {
        self.config.validate()?;
        let gray = crate::grayscale::luma_from_rgba(self.rgba, self.width, self.height)?;
        Ok(Grayscaled {
            config: self.config,
            dimensions: Dimensions {
                width: self.width,
                height: self.height,
            },
            gray,
        })
    }
}

// ───────────────────────── Stage 1: Grayscaled ───────────────────────

/// Pipeline state after luma conversion.
#[must_use = "pipeline stages are consumed by advancing — call .threshold() to continue"]
pub struct Grayscaled {
    config: SegmentConfig,
    dimensions: Dimensions,
    gray: GrayImage,
}

impl Grayscaled {
    /// The intensity image.
    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Stage metrics for diagnostics.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Luma {
            width: self.dimensions.width,
            height: self.dimensions.height,
            pixel_count: self.dimensions.pixel_count(),
        }
    }

    /// Select the binarization threshold.
    pub fn threshold(self) -> Thresholded {
        let histogram = crate::threshold::histogram(&self.gray);
        let threshold = crate::threshold::select_threshold_from_histogram(&histogram);
        let occupied_bins = histogram.iter().filter(|&&count| count > 0).count();
        Thresholded {
            config: self.config,
            dimensions: self.dimensions,
            gray: self.gray,
            threshold,
            occupied_bins,
        }
    }
}

// ───────────────────────── Stage 2: Thresholded ──────────────────────

/// Pipeline state after threshold selection.
#[must_use = "pipeline stages are consumed by advancing — call .binarize() to continue"]
pub struct Thresholded {
    config: SegmentConfig,
    dimensions: Dimensions,
    gray: GrayImage,
    threshold: u8,
    occupied_bins: usize,
}

impl Thresholded {
    /// The selected threshold.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Stage metrics for diagnostics.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Threshold {
            threshold: self.threshold,
            occupied_bins: self.occupied_bins,
        }
    }

    /// Binarize the intensity image against the selected threshold.
    pub fn binarize(self) -> Binarized {
        let binary = crate::binarize::binarize(&self.gray, self.threshold);
        let foreground_pixels = crate::binarize::count_foreground(&binary);
        Binarized {
            config: self.config,
            dimensions: self.dimensions,
            gray: self.gray,
            threshold: self.threshold,
            binary,
            foreground_pixels,
        }
    }
}

// ───────────────────────── Stage 3: Binarized ────────────────────────

/// Pipeline state after binarization.
#[must_use = "pipeline stages are consumed by advancing — call .trace() to continue"]
pub struct Binarized {
    config: SegmentConfig,
    dimensions: Dimensions,
    gray: GrayImage,
    threshold: u8,
    binary: GrayImage,
    foreground_pixels: u64,
}

impl Binarized {
    /// The binary image (values 0 and 255 only).
    #[must_use]
    pub const fn binary(&self) -> &GrayImage {
        &self.binary
    }

    /// Stage metrics for diagnostics.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Binarize {
            foreground_pixels: self.foreground_pixels,
            total_pixels: self.dimensions.pixel_count(),
        }
    }

    /// Trace connected components (including shape simplification).
    pub fn trace(self) -> Traced {
        let Trace { components, stats } =
            crate::tracer::trace_components(&self.binary, &self.config);
        Traced {
            config: self.config,
            dimensions: self.dimensions,
            gray: self.gray,
            threshold: self.threshold,
            binary: self.binary,
            components,
            stats,
        }
    }
}

// ───────────────────────── Stage 4: Traced ───────────────────────────

/// Pipeline state after component tracing.
#[must_use = "pipeline stages are consumed by advancing — call .summarize() to continue"]
pub struct Traced {
    config: SegmentConfig,
    dimensions: Dimensions,
    gray: GrayImage,
    threshold: u8,
    binary: GrayImage,
    components: Vec<Component>,
    stats: TraceStats,
}

impl Traced {
    /// Kept components in discovery order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Pixel and component accounting of the tracing pass.
    #[must_use]
    pub const fn stats(&self) -> &TraceStats {
        &self.stats
    }

    /// Stage metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Trace {
            component_count: self.components.len(),
            stats: self.stats,
        }
    }

    /// Aggregate the components into a summary.
    pub fn summarize(self) -> Summarized {
        let summary = crate::aggregate::summarize(&self.components, &self.config.classifier);
        Summarized {
            dimensions: self.dimensions,
            gray: self.gray,
            threshold: self.threshold,
            binary: self.binary,
            components: self.components,
            stats: self.stats,
            summary,
        }
    }
}

// ───────────────────────── Stage 5: Summarized ───────────────────────

/// Final pipeline state.
#[must_use = "call .into_segmentation() or .into_result() to take the output"]
pub struct Summarized {
    dimensions: Dimensions,
    gray: GrayImage,
    threshold: u8,
    binary: GrayImage,
    components: Vec<Component>,
    stats: TraceStats,
    summary: AnalysisSummary,
}

impl Summarized {
    /// The aggregate summary.
    #[must_use]
    pub const fn summary(&self) -> &AnalysisSummary {
        &self.summary
    }

    /// Stage metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Summarize {
            component_count: self.summary.component_count,
            dark_count: self.summary.dark_count,
            large_count: self.summary.large_count,
            classification: self.summary.classification,
        }
    }

    /// Drop the raster intermediates and return the segmentation.
    pub fn into_segmentation(self) -> Segmentation {
        Segmentation {
            dimensions: self.dimensions,
            threshold: self.threshold,
            components: self.components,
            summary: self.summary,
        }
    }

    /// Consume the pipeline and return every intermediate.
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            gray: self.gray,
            binary: self.binary,
            trace_stats: self.stats,
            segmentation: Segmentation {
                dimensions: self.dimensions,
                threshold: self.threshold,
                components: self.components,
                summary: self.summary,
            },
        }
    }
}

/// Result of running the pipeline with the raster intermediates kept.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1: intensity image.
    pub gray: GrayImage,
    /// Stage 3: binary image.
    pub binary: GrayImage,
    /// Stage 4: tracing accounting.
    pub trace_stats: TraceStats,
    /// Final output.
    pub segmentation: Segmentation,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::AnomalyLevel;

    /// Black RGBA image with one white rectangle.
    fn rgba_with_rect(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                    255
                } else {
                    0
                };
                out.extend([v, v, v, 255]);
            }
        }
        out
    }

    #[test]
    fn stages_expose_intermediates() {
        let rgba = rgba_with_rect(30, 30, 5, 5, 20, 20);
        let thresholded = Pipeline::new(&rgba, 30, 30, SegmentConfig::default())
            .luma()
            .unwrap()
            .threshold();
        assert_eq!(thresholded.threshold(), 0);

        let binarized = thresholded.binarize();
        assert_eq!(crate::binarize::count_foreground(binarized.binary()), 225);

        let traced = binarized.trace();
        assert_eq!(traced.components().len(), 1);
        assert_eq!(traced.stats().kept_pixels, 225);

        let summarized = traced.summarize();
        assert_eq!(summarized.summary().component_count, 1);
        assert_eq!(summarized.summary().anomaly_level, AnomalyLevel::Low);
    }

    #[test]
    fn luma_rejects_invalid_config_before_input() {
        let config = SegmentConfig {
            min_component_area: 0,
            ..SegmentConfig::default()
        };
        let result = Pipeline::new(&[], 0, 0, config).luma();
        assert!(matches!(result, Err(SegmentError::InvalidConfig(_))));
    }

    #[test]
    fn luma_rejects_mismatched_buffer() {
        let result = Pipeline::new(&[0; 7], 1, 2, SegmentConfig::default()).luma();
        assert!(matches!(result, Err(SegmentError::InvalidInput { .. })));
    }

    #[test]
    fn into_result_and_into_segmentation_agree() {
        let rgba = rgba_with_rect(30, 30, 5, 5, 20, 20);
        let run = || {
            Pipeline::new(&rgba, 30, 30, SegmentConfig::default())
                .luma()
                .unwrap()
                .threshold()
                .binarize()
                .trace()
                .summarize()
        };
        let staged = run().into_result();
        let segmentation = run().into_segmentation();
        assert_eq!(staged.segmentation, segmentation);
        assert_eq!(staged.gray.dimensions(), (30, 30));
        assert_eq!(staged.binary.dimensions(), (30, 30));
    }

    #[test]
    fn metrics_reflect_stage_outputs() {
        let rgba = rgba_with_rect(30, 30, 5, 5, 20, 20);
        let gray = Pipeline::new(&rgba, 30, 30, SegmentConfig::default())
            .luma()
            .unwrap();
        assert!(matches!(
            gray.metrics(),
            StageMetrics::Luma {
                width: 30,
                height: 30,
                pixel_count: 900
            }
        ));
        let thresholded = gray.threshold();
        assert!(matches!(
            thresholded.metrics(),
            StageMetrics::Threshold {
                threshold: 0,
                occupied_bins: 2
            }
        ));
        let binarized = thresholded.binarize();
        assert!(matches!(
            binarized.metrics(),
            StageMetrics::Binarize {
                foreground_pixels: 225,
                total_pixels: 900
            }
        ));
    }
}
