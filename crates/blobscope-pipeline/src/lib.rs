//! blobscope-pipeline: Deterministic blob segmentation (sans-IO).
//!
//! Turns an RGBA raster into a list of connected-component descriptors
//! and one aggregate classification through:
//! luma -> Otsu threshold -> binarize -> flood-fill tracing ->
//! Douglas-Peucker simplification -> aggregation.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! buffers and returns structured data; file handling lives in
//! `blobscope-bench`, vector export in `blobscope-export`.

pub mod aggregate;
pub mod binarize;
pub mod describe;
pub mod diagnostics;
pub mod grayscale;
pub mod overlay;
pub mod pipeline;
pub mod simplify;
pub mod threshold;
pub mod tracer;
pub mod types;

pub use describe::{ComponentDetail, DescribeConfig, Finding};
pub use diagnostics::{Clock, PipelineDiagnostics, segment_with_diagnostics};
pub use pipeline::{Pipeline, StagedResult};
pub use tracer::TraceStats;
pub use types::{
    AnalysisSummary, AnomalyLevel, BorderPolicy, Classification, ClassifierConfig, Component,
    Dimensions, GrayImage, Point, RgbaImage, SegmentConfig, SegmentError, Segmentation,
};

/// Run the full segmentation pipeline on a raw RGBA buffer.
///
/// `rgba` holds `width * height` pixels, 4 bytes each, row-major. The
/// returned [`Segmentation`] lists kept components in raster-scan
/// discovery order together with the chosen threshold and the aggregate
/// summary. An image with no foreground yields an empty component list,
/// not an error.
///
/// # Errors
///
/// Returns [`SegmentError::InvalidConfig`] if `config` fails
/// [`SegmentConfig::validate`].
/// Returns [`SegmentError::EmptyImage`] if `width` or `height` is zero.
/// Returns [`SegmentError::InvalidInput`] if `rgba.len()` is not
/// `width * height * 4`.
pub fn segment(
    rgba: &[u8],
    width: u32,
    height: u32,
    config: &SegmentConfig,
) -> Result<Segmentation, SegmentError> {
    Ok(Pipeline::new(rgba, width, height, config.clone())
        .luma()?
        .threshold()
        .binarize()
        .trace()
        .summarize()
        .into_segmentation())
}

/// Run the pipeline on an already-decoded image.
///
/// # Errors
///
/// Same as [`segment`].
pub fn segment_image(image: &RgbaImage, config: &SegmentConfig) -> Result<Segmentation, SegmentError> {
    segment(image.as_raw(), image.width(), image.height(), config)
}

/// Decode encoded image bytes (PNG, JPEG, BMP, WebP) and run the
/// pipeline.
///
/// # Errors
///
/// Returns [`SegmentError::EmptyInput`] if `image_bytes` is empty and
/// [`SegmentError::ImageDecode`] if the format is unrecognized, plus
/// everything [`segment`] can return.
pub fn segment_encoded(
    image_bytes: &[u8],
    config: &SegmentConfig,
) -> Result<Segmentation, SegmentError> {
    let image = grayscale::decode_rgba(image_bytes)?;
    segment_image(&image, config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Black RGBA canvas with white axis-aligned rectangles
    /// `(x0, y0, x1, y1)`, half-open.
    fn canvas(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let inside = rects
                .iter()
                .any(|&(x0, y0, x1, y1)| (x0..x1).contains(&x) && (y0..y1).contains(&y));
            if inside {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        })
    }

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }

    #[test]
    fn all_zero_image_has_no_components() {
        let rgba = vec![0u8; 10 * 10 * 4];
        let result = segment(&rgba, 10, 10, &SegmentConfig::default()).unwrap();
        assert!(result.components.is_empty());
        assert_eq!(result.summary.component_count, 0);
        assert!(result.summary.avg_area.abs() < f64::EPSILON);
        assert_eq!(result.summary.anomaly_level, AnomalyLevel::Low);
        assert_eq!(result.summary.classification, Classification::Normal);
    }

    #[test]
    fn small_blobs_are_dropped_large_blob_is_kept() {
        // 25 px and 49 px blobs fall under the floor; the 625 px blob is
        // kept and counts as large.
        let img = canvas(60, 60, &[(3, 3, 8, 8), (12, 3, 19, 10), (20, 20, 45, 45)]);
        let result = segment_image(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(result.components.len(), 1);
        let blob = &result.components[0];
        assert_eq!(blob.area, 625);
        assert!((blob.centroid.x - 32.0).abs() < 1e-9);
        assert!((blob.centroid.y - 32.0).abs() < 1e-9);
        assert!((blob.avg_intensity - 255.0).abs() < f64::EPSILON);
        assert!(blob.vertex_count >= 2);
        assert_eq!(result.summary.large_count, 1);
        assert_eq!(result.summary.dark_count, 0);
        assert_eq!(result.summary.anomaly_level, AnomalyLevel::Low);
        assert_eq!(result.summary.classification, Classification::Normal);
    }

    #[test]
    fn six_large_blobs_flag_anomaly() {
        let mut rects = Vec::new();
        for row in 0..2u32 {
            for col in 0..3u32 {
                let x0 = 2 + col * 32;
                let y0 = 2 + row * 34;
                rects.push((x0, y0, x0 + 24, y0 + 24));
            }
        }
        let img = canvas(100, 70, &rects);
        let result = segment_image(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(result.components.len(), 6);
        assert!(result.components.iter().all(|c| c.area == 576));
        assert_eq!(result.summary.large_count, 6);
        assert_eq!(result.summary.anomaly_level, AnomalyLevel::High);
        assert_eq!(result.summary.classification, Classification::AnomalyDetected);
    }

    #[test]
    fn components_are_in_raster_discovery_order() {
        let img = canvas(60, 40, &[(40, 5, 50, 15), (5, 20, 15, 30)]);
        let result = segment_image(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(result.components.len(), 2);
        assert!(result.components[0].centroid.y < result.components[1].centroid.y);
    }

    #[test]
    fn segment_is_deterministic() {
        let img = canvas(60, 60, &[(3, 3, 20, 20), (25, 30, 50, 55)]);
        let a = segment_image(&img, &SegmentConfig::default()).unwrap();
        let b = segment_image(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn segment_rejects_zero_dimensions() {
        let result = segment(&[], 0, 5, &SegmentConfig::default());
        assert!(matches!(
            result,
            Err(SegmentError::EmptyImage {
                width: 0,
                height: 5
            })
        ));
    }

    #[test]
    fn segment_rejects_short_buffer() {
        let result = segment(&[0; 15], 2, 2, &SegmentConfig::default());
        assert!(matches!(
            result,
            Err(SegmentError::InvalidInput {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn segment_encoded_empty_input() {
        let result = segment_encoded(&[], &SegmentConfig::default());
        assert!(matches!(result, Err(SegmentError::EmptyInput)));
    }

    #[test]
    fn segment_encoded_corrupt_input() {
        let result = segment_encoded(&[0xFF, 0x00], &SegmentConfig::default());
        assert!(matches!(result, Err(SegmentError::ImageDecode(_))));
    }

    #[test]
    fn segment_encoded_matches_segment_image() {
        let img = canvas(40, 40, &[(10, 10, 30, 30)]);
        let png = encode_png(&img);
        let decoded = segment_encoded(&png, &SegmentConfig::default()).unwrap();
        let direct = segment_image(&img, &SegmentConfig::default()).unwrap();
        assert_eq!(decoded, direct);
        assert_eq!(decoded.components.len(), 1);
    }

    #[test]
    fn include_policy_keeps_border_blobs() {
        let img = canvas(30, 30, &[(0, 0, 12, 12)]);
        let excluded = segment_image(&img, &SegmentConfig::default()).unwrap();
        assert!(excluded.components.is_empty());

        let config = SegmentConfig {
            border_policy: BorderPolicy::Include,
            ..SegmentConfig::default()
        };
        let included = segment_image(&img, &config).unwrap();
        assert_eq!(included.components.len(), 1);
        assert_eq!(included.components[0].area, 144);
    }
}
