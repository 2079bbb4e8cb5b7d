//! Raster overlay of detected components.
//!
//! Draws a hollow circle at every component centroid onto a copy of the
//! source image, with the radius of a disc of equal area. Useful as a
//! quick visual check of what the tracer kept.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_circle_mut;

use crate::types::Component;

/// Stroke color of overlay circles.
pub const OVERLAY_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Radius of a disc whose area equals `area`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn equivalent_radius(area: usize) -> f64 {
    (area as f64 / std::f64::consts::PI).sqrt()
}

/// Return a copy of `source` with a 2-pixel circle drawn around each
/// component.
#[must_use = "returns the annotated image"]
#[allow(clippy::cast_possible_truncation)]
pub fn draw_overlay(source: &RgbaImage, components: &[Component]) -> RgbaImage {
    let mut canvas = source.clone();
    for component in components {
        let center = (
            component.centroid.x.round() as i32,
            component.centroid.y.round() as i32,
        );
        let radius = equivalent_radius(component.area).round() as i32;
        draw_hollow_circle_mut(&mut canvas, center, radius, OVERLAY_COLOR);
        draw_hollow_circle_mut(&mut canvas, center, radius + 1, OVERLAY_COLOR);
    }
    canvas
}
