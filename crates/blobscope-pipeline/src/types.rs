//! Shared types for the blobscope segmentation pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data (intensity and binary buffers) without
/// depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can hand decoded source
/// images to the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// How the component tracer treats foreground regions that reach the
/// outermost row or column of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderPolicy {
    /// Never seed a fill from the 1-pixel image border, and drop every
    /// component whose fill reaches the border. Components touching the
    /// image edge are excluded entirely, not clipped.
    #[default]
    ExcludeTouching,
    /// Seed from every pixel and keep border-touching components.
    Include,
}

/// Fixed policy values used by the descriptor aggregator to classify a
/// sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Components whose average intensity is strictly below this value
    /// count as dark.
    pub dark_intensity: f64,

    /// Components whose area is strictly above this value count as large.
    pub large_area: usize,

    /// The sample is flagged when the dark count exceeds this limit.
    pub dark_count_limit: usize,

    /// The sample is flagged when the large count exceeds this limit.
    pub large_count_limit: usize,
}

impl ClassifierConfig {
    /// Default dark intensity cutoff.
    pub const DEFAULT_DARK_INTENSITY: f64 = 100.0;
    /// Default large area cutoff in pixels.
    pub const DEFAULT_LARGE_AREA: usize = 500;
    /// Default dark component limit.
    pub const DEFAULT_DARK_COUNT_LIMIT: usize = 3;
    /// Default large component limit.
    pub const DEFAULT_LARGE_COUNT_LIMIT: usize = 5;
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dark_intensity: Self::DEFAULT_DARK_INTENSITY,
            large_area: Self::DEFAULT_LARGE_AREA,
            dark_count_limit: Self::DEFAULT_DARK_COUNT_LIMIT,
            large_count_limit: Self::DEFAULT_LARGE_COUNT_LIMIT,
        }
    }
}

/// Configuration for the segmentation pipeline.
///
/// Every policy constant the stages depend on lives here so that
/// sensitivity tuning never requires touching the algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Components with `area <= min_component_area` are discarded.
    /// Must be at least 1.
    pub min_component_area: usize,

    /// Douglas-Peucker tolerance as a fraction of the component's
    /// closed-loop perimeter.
    pub simplify_epsilon_factor: f64,

    /// Treatment of components that reach the image border.
    pub border_policy: BorderPolicy,

    /// Thresholds for the summary classification.
    pub classifier: ClassifierConfig,
}

impl SegmentConfig {
    /// Default minimum-size floor in pixels.
    pub const DEFAULT_MIN_COMPONENT_AREA: usize = 50;
    /// Default simplification tolerance factor.
    pub const DEFAULT_SIMPLIFY_EPSILON_FACTOR: f64 = 0.04;

    /// Check the configuration for values the stages cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidConfig`] if the minimum area is 0
    /// (a one-pixel component cannot simplify to two vertices), if the
    /// epsilon factor is negative or not finite, or if the dark
    /// intensity cutoff is not finite.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.min_component_area == 0 {
            return Err(SegmentError::InvalidConfig(
                "min_component_area must be at least 1".to_string(),
            ));
        }
        if !self.simplify_epsilon_factor.is_finite() || self.simplify_epsilon_factor < 0.0 {
            return Err(SegmentError::InvalidConfig(format!(
                "simplify_epsilon_factor must be finite and >= 0, got {}",
                self.simplify_epsilon_factor,
            )));
        }
        if !self.classifier.dark_intensity.is_finite() {
            return Err(SegmentError::InvalidConfig(format!(
                "dark_intensity must be finite, got {}",
                self.classifier.dark_intensity,
            )));
        }
        Ok(())
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_component_area: Self::DEFAULT_MIN_COMPONENT_AREA,
            simplify_epsilon_factor: Self::DEFAULT_SIMPLIFY_EPSILON_FACTOR,
            border_policy: BorderPolicy::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

/// One connected region of foreground pixels, reduced to a compact
/// geometric and intensity descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Number of member pixels.
    pub area: usize,
    /// Closed-loop sum of distances between consecutive member pixels in
    /// discovery order.
    ///
    /// This runs over every filled pixel, not a traced outline, so it is
    /// a roughness proxy rather than a true boundary length.
    pub perimeter: f64,
    /// Number of points left after Douglas-Peucker simplification.
    /// Always at least 2.
    pub vertex_count: usize,
    /// Mean binary value over member pixels. Callers also present this as
    /// the component's "color difference".
    pub avg_intensity: f64,
    /// Mean of member pixel coordinates.
    pub centroid: Point,
}

/// Coarse anomaly level of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnomalyLevel {
    #[default]
    Low,
    High,
}

impl fmt::Display for AnomalyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("Low"),
            Self::High => f.write_str("High"),
        }
    }
}

/// Rule-based classification label of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Classification {
    #[default]
    Normal,
    AnomalyDetected,
}

impl Classification {
    /// The label as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::AnomalyDetected => "AnomalyDetected",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate statistics over all components of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Number of kept components.
    pub component_count: usize,
    /// Components whose average intensity is below the dark cutoff.
    pub dark_count: usize,
    /// Components whose area is above the large cutoff.
    pub large_count: usize,
    /// Mean component area, 0 when there are no components.
    pub avg_area: f64,
    /// Mean component intensity, 0 when there are no components.
    pub avg_intensity: f64,
    pub anomaly_level: AnomalyLevel,
    pub classification: Classification,
}

/// Result of segmenting one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
    /// Binarization threshold chosen for the image.
    pub threshold: u8,
    /// Kept components in raster-scan discovery order.
    pub components: Vec<Component>,
    /// Aggregate statistics and classification.
    pub summary: AnalysisSummary,
}

/// Errors that can occur during segmentation.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    /// The pixel buffer length does not match `width * height * 4`.
    #[error("invalid pixel buffer: expected {expected} bytes, got {actual}")]
    InvalidInput {
        /// Byte count implied by the dimensions.
        expected: u64,
        /// Byte count actually supplied.
        actual: u64,
    },

    /// Width or height is zero.
    #[error("image is empty ({width}x{height})")]
    EmptyImage {
        /// Supplied width.
        width: u32,
        /// Supplied height.
        height: u32,
    },

    /// Segmentation configuration is invalid.
    #[error("invalid segmentation configuration: {0}")]
    InvalidConfig(String),

    /// The encoded image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the encoded input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Serde-compatible proxy for `SegmentError`.
#[derive(Serialize, Deserialize)]
enum SegmentErrorProxy {
    InvalidInput { expected: u64, actual: u64 },
    EmptyImage { width: u32, height: u32 },
    InvalidConfig(String),
    EmptyInput,
    ImageDecode(String),
}

impl Serialize for SegmentError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::InvalidInput { expected, actual } => SegmentErrorProxy::InvalidInput {
                expected: *expected,
                actual: *actual,
            },
            Self::EmptyImage { width, height } => SegmentErrorProxy::EmptyImage {
                width: *width,
                height: *height,
            },
            Self::InvalidConfig(s) => SegmentErrorProxy::InvalidConfig(s.clone()),
            Self::EmptyInput => SegmentErrorProxy::EmptyInput,
            Self::ImageDecode(e) => SegmentErrorProxy::ImageDecode(e.to_string()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SegmentError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = SegmentErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            SegmentErrorProxy::InvalidInput { expected, actual } => {
                Self::InvalidInput { expected, actual }
            }
            SegmentErrorProxy::EmptyImage { width, height } => Self::EmptyImage { width, height },
            SegmentErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
            SegmentErrorProxy::EmptyInput => Self::EmptyInput,
            // The typed image::ImageError cannot be rebuilt; keep the message.
            SegmentErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dimensions_pixel_count_does_not_overflow_u32() {
        let d = Dimensions {
            width: 100_000,
            height: 100_000,
        };
        assert_eq!(d.pixel_count(), 10_000_000_000);
    }

    #[test]
    fn segment_config_defaults() {
        let config = SegmentConfig::default();
        assert_eq!(config.min_component_area, 50);
        assert!((config.simplify_epsilon_factor - 0.04).abs() < f64::EPSILON);
        assert_eq!(config.border_policy, BorderPolicy::ExcludeTouching);
        assert!((config.classifier.dark_intensity - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.classifier.large_area, 500);
        assert_eq!(config.classifier.dark_count_limit, 3);
        assert_eq!(config.classifier.large_count_limit, 5);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(SegmentConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_min_area() {
        let config = SegmentConfig {
            min_component_area: 0,
            ..SegmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SegmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_negative_epsilon() {
        let config = SegmentConfig {
            simplify_epsilon_factor: -0.1,
            ..SegmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SegmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn validate_rejects_nan_dark_intensity() {
        let config = SegmentConfig {
            classifier: ClassifierConfig {
                dark_intensity: f64::NAN,
                ..ClassifierConfig::default()
            },
            ..SegmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SegmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn classification_labels() {
        assert_eq!(Classification::Normal.to_string(), "Normal");
        assert_eq!(Classification::AnomalyDetected.to_string(), "AnomalyDetected");
        assert_eq!(AnomalyLevel::High.to_string(), "High");
    }

    #[test]
    fn error_display() {
        let err = SegmentError::InvalidInput {
            expected: 16,
            actual: 15,
        };
        assert_eq!(
            err.to_string(),
            "invalid pixel buffer: expected 16 bytes, got 15"
        );
        let err = SegmentError::EmptyImage {
            width: 0,
            height: 4,
        };
        assert_eq!(err.to_string(), "image is empty (0x4)");
    }

    #[test]
    fn segment_config_serde_round_trip() {
        let config = SegmentConfig {
            min_component_area: 10,
            simplify_epsilon_factor: 0.1,
            border_policy: BorderPolicy::Include,
            classifier: ClassifierConfig {
                dark_intensity: 80.0,
                large_area: 200,
                dark_count_limit: 1,
                large_count_limit: 2,
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SegmentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn segment_error_serde_round_trip() {
        let err = SegmentError::EmptyImage {
            width: 0,
            height: 0,
        };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: SegmentError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            SegmentError::EmptyImage {
                width: 0,
                height: 0
            }
        ));
    }

    #[test]
    fn segmentation_result_err_serde_round_trip() {
        let result: Result<Segmentation, SegmentError> = Err(SegmentError::InvalidInput {
            expected: 4,
            actual: 3,
        });
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: Result<Segmentation, SegmentError> =
            serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            Err(SegmentError::InvalidInput {
                expected: 4,
                actual: 3
            })
        ));
    }
}
