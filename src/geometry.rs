use serde::{Deserialize, Serialize};

use crate::utils::lerp;

/// A point in arena space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Ordered pair of points. Direction only matters for the `offset` of a touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Where two segments cross. `offset` is the fraction along the first segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub x: f64,
    pub y: f64,
    pub offset: f64,
}

/// Intersection of segments A-B and C-D.
///
/// Returns `None` when the determinant is exactly zero (parallel, collinear
/// or degenerate segments) or when the crossing lies outside either segment.
pub fn intersect(a: Point, b: Point, c: Point, d: Point) -> Option<Touch> {
    let t_top = (d.x - c.x) * (a.y - c.y) - (d.y - c.y) * (a.x - c.x);
    let u_top = (c.y - a.y) * (a.x - b.x) - (c.x - a.x) * (a.y - b.y);
    let bot = (d.y - c.y) * (b.x - a.x) - (d.x - c.x) * (b.y - a.y);

    if bot == 0.0 {
        return None;
    }

    let t = t_top / bot;
    let u = u_top / bot;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Touch {
            x: lerp(a.x, b.x, t),
            y: lerp(a.y, b.y, t),
            offset: t,
        })
    } else {
        None
    }
}

/// Border segments of an implicitly closed polygon: `[p[i], p[i+1 mod n]]`.
pub fn polygon_borders(points: &[Point]) -> Vec<Segment> {
    let n = points.len();
    (0..n)
        .map(|i| Segment::new(points[i], points[(i + 1) % n]))
        .collect()
}

/// True iff any border of `p` crosses any border of `q`.
pub fn polygons_intersect(p: &[Point], q: &[Point]) -> bool {
    for i in 0..p.len() {
        let (a, b) = (p[i], p[(i + 1) % p.len()]);
        for j in 0..q.len() {
            if intersect(a, b, q[j], q[(j + 1) % q.len()]).is_some() {
                return true;
            }
        }
    }
    false
}

/// True iff any border of `polygon` crosses `segment`.
pub fn polygon_hits_segment(polygon: &[Point], segment: &Segment) -> bool {
    polygons_intersect(polygon, &[segment.start, segment.end])
}
