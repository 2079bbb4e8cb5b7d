//! Shape simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces a component's ordered point list to the points that matter
//! within a tolerance proportional to its closed-loop perimeter. The
//! resulting point count is used as a shape-complexity proxy.
//!
//! The classic formulation recurses once per kept point, which can go
//! linear in depth on unlucky point orders. This implementation drives
//! the same splits from an explicit work stack instead.
//!
//! This is step 5 in the pipeline, called by the component tracer for
//! every component that survives the minimum-size floor.

use crate::types::Point;

/// Closed-loop perimeter: the sum of distances between consecutive
/// points, including the segment from the last point back to the first.
///
/// Returns 0 for fewer than two points.
#[must_use]
pub fn closed_perimeter(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    match (points.first(), points.last()) {
        (Some(&first), Some(&last)) => open + last.distance(first),
        _ => open,
    }
}

/// Simplify a closed point loop with a tolerance of
/// `epsilon_factor * closed_perimeter(points)`.
///
/// Point lists with fewer than 3 points are returned unchanged.
///
/// # Examples
///
/// ```
/// use blobscope_pipeline::Point;
/// use blobscope_pipeline::simplify::approximate_polygon;
///
/// let collinear = [
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(2.0, 0.0),
/// ];
/// assert_eq!(approximate_polygon(&collinear, 0.04).len(), 2);
/// ```
#[must_use = "returns the simplified points"]
pub fn approximate_polygon(points: &[Point], epsilon_factor: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let epsilon = epsilon_factor * closed_perimeter(points);
    douglas_peucker(points, epsilon)
}

/// Ramer-Douglas-Peucker between the first and last point.
///
/// Finds the interior point farthest from the line through the two
/// anchors. If that distance exceeds `epsilon` the point is kept and both
/// halves are processed the same way; otherwise every interior point of
/// the span is dropped. Among equally distant points the first one wins.
#[must_use = "returns the simplified points"]
pub fn douglas_peucker(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut kept = vec![false; n];
    kept[0] = true;
    kept[n - 1] = true;

    let mut spans = vec![(0usize, n - 1)];
    while let Some((start, end)) = spans.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            kept[max_idx] = true;
            spans.push((max_idx, end));
            spans.push((start, max_idx));
        }
    }

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Perpendicular distance from `p` to the infinite line through `a`
/// and `b`:
///
/// `|(b.y-a.y)*p.x - (b.x-a.x)*p.y + b.x*a.y - b.y*a.x| / |b-a|`
///
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
#[allow(clippy::suboptimal_flops)]
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = (dy * dy + dx * dx).sqrt();

    if length == 0.0 {
        return p.distance(a);
    }

    let numerator = (dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs();
    numerator / length
}
