//! Image decoding and luma conversion.
//!
//! Accepts a raw RGBA pixel buffer (or encoded image bytes, via
//! [`decode_rgba`]) and produces a single-channel intensity image.
//!
//! This is the first step in the pipeline: RGBA in, `GrayImage` out.

use image::{GrayImage, RgbaImage};

use crate::types::{Dimensions, SegmentError};

/// Decode raw image bytes into an RGBA image.
///
/// Supports PNG, JPEG, BMP, and WebP formats (whatever the `image` crate
/// can decode with the enabled features).
///
/// # Errors
///
/// Returns [`SegmentError::EmptyInput`] if `bytes` is empty.
/// Returns [`SegmentError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, SegmentError> {
    if bytes.is_empty() {
        return Err(SegmentError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}

/// Check that `rgba` holds exactly `width * height` RGBA pixels.
///
/// # Errors
///
/// Returns [`SegmentError::EmptyImage`] if either dimension is zero and
/// [`SegmentError::InvalidInput`] if the buffer length does not match.
pub fn validate_rgba(rgba: &[u8], width: u32, height: u32) -> Result<Dimensions, SegmentError> {
    if width == 0 || height == 0 {
        return Err(SegmentError::EmptyImage { width, height });
    }

    let dimensions = Dimensions { width, height };
    let expected = dimensions.pixel_count().saturating_mul(4);
    let actual = rgba.len() as u64;
    if expected != actual {
        return Err(SegmentError::InvalidInput { expected, actual });
    }
    Ok(dimensions)
}

/// Convert an RGBA pixel buffer into an intensity image.
///
/// Each output value is `round(0.299*R + 0.587*G + 0.114*B)` clamped to
/// `[0, 255]`. Alpha is ignored. This is the BT.601 luma transform, not
/// the BT.709 weights used by `image`'s own `to_luma8`.
///
/// # Errors
///
/// Returns [`SegmentError::EmptyImage`] if either dimension is zero.
/// Returns [`SegmentError::InvalidInput`] if `rgba.len()` is not
/// `width * height * 4`.
#[must_use = "returns the intensity image"]
pub fn luma_from_rgba(rgba: &[u8], width: u32, height: u32) -> Result<GrayImage, SegmentError> {
    validate_rgba(rgba, width, height)?;

    let data: Vec<u8> = rgba
        .chunks_exact(4)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect();
    let actual = data.len() as u64;

    GrayImage::from_raw(width, height, data).ok_or(SegmentError::InvalidInput {
        expected: u64::from(width) * u64::from(height),
        actual,
    })
}

/// BT.601 luma of one pixel.
#[allow(
    clippy::suboptimal_flops,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    y.round().clamp(0.0, 255.0) as u8
}
