//! Connected-component extraction from a binary image.
//!
//! Scans the binary image in raster order and flood-fills every
//! unvisited foreground seed with 4-connectivity. Each fill becomes one
//! [`Component`] once it has completed; partial fills are never
//! published.
//!
//! The fill uses an explicit LIFO stack. Neighbours are pushed right,
//! left, down, up, so the most recently pushed neighbour (up) is visited
//! first. That order fixes the discovery order of member points, which
//! in turn drives the closed-loop perimeter and the simplified vertex
//! count.
//!
//! This is step 4 in the pipeline, between binarization and
//! aggregation.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::binarize::FOREGROUND;
use crate::simplify;
use crate::types::{BorderPolicy, Component, Point, SegmentConfig};

/// Bookkeeping for one tracing pass.
///
/// Every foreground pixel of the input lands in exactly one of the four
/// pixel buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// Foreground pixels in the binary image.
    pub foreground_pixels: u64,
    /// Pixels belonging to kept components.
    pub kept_pixels: u64,
    /// Components dropped for having `area <= min_component_area`.
    pub small_components: usize,
    /// Pixels belonging to dropped small components.
    pub small_pixels: u64,
    /// Components dropped for reaching the image border.
    pub border_components: usize,
    /// Pixels belonging to dropped border-touching components.
    pub border_pixels: u64,
    /// Foreground pixels no fill ever reached (only possible on the
    /// image border under [`BorderPolicy::ExcludeTouching`]).
    pub unvisited_pixels: u64,
    /// Total points before simplification, over kept components.
    pub points_before_simplify: u64,
    /// Total points after simplification, over kept components.
    pub points_after_simplify: u64,
}

/// Output of [`trace_components`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Kept components in raster-scan discovery order.
    pub components: Vec<Component>,
    /// Pixel and component accounting for the pass.
    pub stats: TraceStats,
}

/// Accumulated state of one completed flood fill.
struct Fill {
    points: Vec<Point>,
    sum_x: u64,
    sum_y: u64,
    sum_intensity: u64,
    touches_border: bool,
}

/// Extract connected foreground components from a binary image.
///
/// The visited scratch buffer is allocated here and dropped when the
/// pass ends; it is never shared between calls.
#[must_use = "returns the traced components"]
pub fn trace_components(binary: &GrayImage, config: &SegmentConfig) -> Trace {
    let (width, height) = binary.dimensions();
    let mut visited = vec![false; binary.as_raw().len()];
    let mut components = Vec::new();
    let mut stats = TraceStats::default();

    let (rows, cols) = match config.border_policy {
        BorderPolicy::ExcludeTouching => (
            1..height.saturating_sub(1),
            1..width.saturating_sub(1),
        ),
        BorderPolicy::Include => (0..height, 0..width),
    };

    for y in rows {
        for x in cols.clone() {
            let idx = index(width, x, y);
            if visited[idx] || binary.as_raw()[idx] != FOREGROUND {
                continue;
            }

            let fill = flood_fill(binary, &mut visited, x, y);
            let area = fill.points.len();
            let area_px = area as u64;

            if fill.touches_border && config.border_policy == BorderPolicy::ExcludeTouching {
                stats.border_components += 1;
                stats.border_pixels += area_px;
                continue;
            }
            if area <= config.min_component_area {
                stats.small_components += 1;
                stats.small_pixels += area_px;
                continue;
            }

            let component = describe_fill(&fill, config.simplify_epsilon_factor);
            stats.kept_pixels += area_px;
            stats.points_before_simplify += area_px;
            stats.points_after_simplify += component.vertex_count as u64;
            components.push(component);
        }
    }

    for (&v, &seen) in binary.as_raw().iter().zip(&visited) {
        if v == FOREGROUND {
            stats.foreground_pixels += 1;
            if !seen {
                stats.unvisited_pixels += 1;
            }
        }
    }

    Trace { components, stats }
}

/// Flood-fill the 4-connected foreground region containing `(x, y)`,
/// marking every member in `visited` exactly once.
fn flood_fill(binary: &GrayImage, visited: &mut [bool], x: u32, y: u32) -> Fill {
    let (width, height) = binary.dimensions();
    let raw = binary.as_raw();

    let mut fill = Fill {
        points: Vec::new(),
        sum_x: 0,
        sum_y: 0,
        sum_intensity: 0,
        touches_border: false,
    };

    // Signed coordinates so neighbours of column/row 0 can be pushed and
    // then rejected on pop, before any buffer access.
    let mut stack: Vec<(i64, i64)> = vec![(i64::from(x), i64::from(y))];
    while let Some((sx, sy)) = stack.pop() {
        let (Ok(cx), Ok(cy)) = (u32::try_from(sx), u32::try_from(sy)) else {
            continue;
        };
        if cx >= width || cy >= height {
            continue;
        }
        let idx = index(width, cx, cy);
        if visited[idx] || raw[idx] != FOREGROUND {
            continue;
        }

        visited[idx] = true;
        fill.points.push(Point::new(f64::from(cx), f64::from(cy)));
        fill.sum_x += u64::from(cx);
        fill.sum_y += u64::from(cy);
        fill.sum_intensity += u64::from(raw[idx]);
        if cx == 0 || cy == 0 || cx == width - 1 || cy == height - 1 {
            fill.touches_border = true;
        }

        stack.push((sx + 1, sy));
        stack.push((sx - 1, sy));
        stack.push((sx, sy + 1));
        stack.push((sx, sy - 1));
    }

    fill
}

/// Reduce a completed fill to its descriptor.
#[allow(clippy::cast_precision_loss)]
fn describe_fill(fill: &Fill, epsilon_factor: f64) -> Component {
    let area = fill.points.len();
    let n = area.max(1) as f64;
    let simplified = simplify::approximate_polygon(&fill.points, epsilon_factor);

    Component {
        area,
        perimeter: simplify::closed_perimeter(&fill.points),
        vertex_count: simplified.len(),
        avg_intensity: fill.sum_intensity as f64 / n,
        centroid: Point::new(fill.sum_x as f64 / n, fill.sum_y as f64 / n),
    }
}

/// Row-major buffer index of `(x, y)`.
fn index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}
