// src/geometry.rs
//
// Polygon primitives for the bed zone. Everything here is pure: the same
// point and polygon always give the same answer, and nothing is cached.
//
// Boundary convention: a point lying exactly on an edge counts as inside,
// and its boundary distance is exactly 0.0. Both functions go through the
// same `on_segment` predicate so the two answers never disagree.

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

/// Minimum absolute polygon area (px²) accepted as a real zone.
const MIN_POLYGON_AREA: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Iterate the closed edge list `(v0,v1), (v1,v2), ..., (vn-1,v0)`.
fn edges(polygon: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Exact test: `p` is collinear with `a→b` and within its bounding box.
fn on_segment(p: Point, a: Point, b: Point) -> bool {
    cross(a, b, p) == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    if on_segment(p, a, b) {
        return 0.0;
    }

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return (p.x - a.x).hypot(p.y - a.y);
    }

    // Scalar projection of AP onto AB, clamped to the segment
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let proj_x = a.x + t * dx;
    let proj_y = a.y + t * dy;
    (p.x - proj_x).hypot(p.y - proj_y)
}

/// True iff `p` lies inside the closed polygon or on one of its edges.
///
/// Even-odd ray casting, so vertex order (clockwise or counter-clockwise)
/// does not matter.
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if edges(polygon).any(|(a, b)| on_segment(p, a, b)) {
        return true;
    }

    let mut inside = false;
    for (a, b) in edges(polygon) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Minimum Euclidean distance from `p` to any edge segment of the polygon
/// (including the closing edge). Always ≥ 0; exactly 0 on an edge.
pub fn distance_to_polygon_boundary(p: Point, polygon: &[Point]) -> f64 {
    match polygon.len() {
        0 => f64::INFINITY,
        1 => (p.x - polygon[0].x).hypot(p.y - polygon[0].y),
        _ => edges(polygon)
            .map(|(a, b)| distance_to_segment(p, a, b))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Absolute shoelace area.
pub fn polygon_area(polygon: &[Point]) -> f64 {
    let twice: f64 = edges(polygon).map(|(a, b)| a.x * b.y - b.x * a.y).sum();
    (twice * 0.5).abs()
}

fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear / touching cases
    on_segment(p1, q1, q2) || on_segment(p2, q1, q2) || on_segment(q1, p1, p2) || on_segment(q2, p1, p2)
}

/// Reject polygons the monitor cannot classify against reliably: fewer
/// than 3 vertices, non-finite coordinates, zero area, or any pair of
/// non-adjacent edges that touch or cross.
pub fn validate_polygon(polygon: &[Point]) -> Result<()> {
    ensure!(
        polygon.len() >= 3,
        "bed polygon needs at least 3 vertices, got {}",
        polygon.len()
    );

    if let Some((i, p)) = polygon.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        bail!("bed polygon vertex {} is not finite: ({}, {})", i, p.x, p.y);
    }

    let area = polygon_area(polygon);
    ensure!(
        area > MIN_POLYGON_AREA,
        "bed polygon is degenerate (area {:.6})",
        area
    );

    let n = polygon.len();
    for i in 0..n {
        for k in (i + 2)..n {
            // First and last edges share vertex 0
            if i == 0 && k == n - 1 {
                continue;
            }
            let (a1, a2) = (polygon[i], polygon[(i + 1) % n]);
            let (b1, b2) = (polygon[k], polygon[(k + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                bail!(
                    "bed polygon is self-intersecting: edge {} crosses edge {}",
                    i,
                    k
                );
            }
        }
    }

    Ok(())
}
