//! Global threshold selection by between-class variance (Otsu).
//!
//! Builds a 256-bin histogram of the intensity image and picks the
//! threshold `t` that best separates pixels `<= t` (background class)
//! from pixels `> t` (foreground class).
//!
//! This is step 2 in the pipeline, between luma conversion and
//! binarization.

use image::GrayImage;

/// Count how many pixels take each intensity value.
#[must_use]
pub fn histogram(gray: &GrayImage) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &v in gray.as_raw() {
        hist[usize::from(v)] += 1;
    }
    hist
}

/// Select the threshold that maximizes between-class variance.
///
/// For each candidate `t` in `0..=255` the pixels split into a
/// background class (`<= t`) and a foreground class (`> t`), and the
/// score is `wB * wF * (meanB - meanF)^2`. Candidates where either class
/// is empty are skipped. The comparison is strict, so among equal maxima
/// the smallest `t` wins.
///
/// A uniform image has no valid split and yields `0`.
#[must_use]
pub fn select_threshold(gray: &GrayImage) -> u8 {
    select_threshold_from_histogram(&histogram(gray))
}

/// [`select_threshold`] over a precomputed histogram.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn select_threshold_from_histogram(hist: &[u64; 256]) -> u8 {
    let total: u64 = hist.iter().sum();
    let sum_total: f64 = hist
        .iter()
        .zip(0u32..)
        .map(|(&count, value)| f64::from(value) * count as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut w_b: u64 = 0;
    let mut best_variance = 0.0;
    let mut best_t = 0u8;

    for (t, &count) in (0u8..=255).zip(hist.iter()) {
        w_b += count;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }

        sum_b += f64::from(t) * count as f64;
        let mean_b = sum_b / w_b as f64;
        let mean_f = (sum_total - sum_b) / w_f as f64;
        let diff = mean_b - mean_f;
        let variance = w_b as f64 * w_f as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best_t = t;
        }
    }

    best_t
}
