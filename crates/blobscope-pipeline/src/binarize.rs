//! Binarization of an intensity image against a global threshold.
//!
//! Polarity is fixed: pixels brighter than the threshold become
//! foreground ([`FOREGROUND`]), everything else background
//! ([`BACKGROUND`]). Callers whose regions of interest are darker than
//! their surroundings must invert the source image before segmenting.

use image::{GrayImage, Luma};

/// Value of a foreground pixel in a binary image.
pub const FOREGROUND: u8 = 255;

/// Value of a background pixel in a binary image.
pub const BACKGROUND: u8 = 0;

/// Map every pixel to [`FOREGROUND`] if it is strictly greater than
/// `threshold`, else to [`BACKGROUND`].
#[must_use = "returns the binary image"]
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (src, dst) in gray.pixels().zip(binary.pixels_mut()) {
        *dst = Luma([if src.0[0] > threshold {
            FOREGROUND
        } else {
            BACKGROUND
        }]);
    }
    binary
}

/// Count foreground pixels in a binary image.
#[must_use]
pub fn count_foreground(binary: &GrayImage) -> u64 {
    binary
        .as_raw()
        .iter()
        .map(|&v| u64::from(v == FOREGROUND))
        .sum()
}
