//! Simple polygon with optional holes, and its exact segment tests.
//!
//! Rings are stored open (the closing vertex is implicit). A segment that
//! enters the polygon produces the same candidate points a full
//! line/polygon overlay would report as the vertices of the clipped
//! intersection:
//!
//! - every proper crossing with a ring edge (a point)
//! - both ends of every collinear overlap with a ring edge (a line)
//! - each segment end that lies strictly inside the polygon (the clipped
//!   line starts or stops there)

use crate::core::{Bounds, Point2D};

/// Relative tolerance for parallel / collinear decisions.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Polygon made of an exterior ring and zero or more hole rings.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    exterior: Vec<Point2D>,
    interiors: Vec<Vec<Point2D>>,
}

impl Polygon {
    /// Create a polygon from an exterior ring. A repeated closing vertex is
    /// dropped.
    pub fn new(exterior: Vec<Point2D>) -> Self {
        Self::with_holes(exterior, Vec::new())
    }

    /// Create a polygon with hole rings.
    pub fn with_holes(exterior: Vec<Point2D>, interiors: Vec<Vec<Point2D>>) -> Self {
        Self {
            exterior: open_ring(exterior),
            interiors: interiors.into_iter().map(open_ring).collect(),
        }
    }

    /// Exterior ring vertices (open).
    #[inline]
    pub fn exterior(&self) -> &[Point2D] {
        &self.exterior
    }

    /// Hole rings (open).
    #[inline]
    pub fn interiors(&self) -> &[Vec<Point2D>] {
        &self.interiors
    }

    /// No exterior vertices at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exterior.is_empty()
    }

    /// Enclosed area (exterior minus holes).
    pub fn area(&self) -> f64 {
        let holes: f64 = self.interiors.iter().map(|r| ring_area(r)).sum();
        (ring_area(&self.exterior) - holes).max(0.0)
    }

    /// Usable as a footprint: at least three distinct finite exterior
    /// vertices enclosing a non-zero area.
    pub fn is_valid(&self) -> bool {
        let finite = self.exterior.iter().all(Point2D::is_finite)
            && self.interiors.iter().flatten().all(Point2D::is_finite);
        if !finite {
            return false;
        }
        let mut distinct: Vec<Point2D> = Vec::with_capacity(self.exterior.len());
        for p in &self.exterior {
            if !distinct.contains(p) {
                distinct.push(*p);
            }
        }
        distinct.len() >= 3 && self.area() > 0.0
    }

    /// Bounding box of the exterior ring.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(&self.exterior)
    }

    /// Apply a coordinate mapping to every vertex.
    pub fn map_points(&self, f: impl Fn(Point2D) -> Point2D) -> Self {
        Self {
            exterior: self.exterior.iter().map(|p| f(*p)).collect(),
            interiors: self
                .interiors
                .iter()
                .map(|ring| ring.iter().map(|p| f(*p)).collect())
                .collect(),
        }
    }

    /// Even-odd point-in-polygon test over all rings. Points exactly on a
    /// boundary may land on either side.
    pub fn contains(&self, point: Point2D) -> bool {
        let mut inside = false;
        for ring in self.rings() {
            for (a, b) in ring_edges(ring) {
                if (a.y > point.y) != (b.y > point.y) {
                    let x_at = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
                    if point.x < x_at {
                        inside = !inside;
                    }
                }
            }
        }
        inside
    }

    /// Does the segment `start → end` touch the polygon at all?
    pub fn intersects_segment(&self, start: Point2D, end: Point2D) -> bool {
        if self.contains(start) || self.contains(end) {
            return true;
        }
        self.rings()
            .flat_map(|ring| ring_edges(ring))
            .any(|(a, b)| !segment_edge_points(start, end, a, b).is_empty())
    }

    /// Vertices of the intersection between the segment `start → end` and
    /// this polygon, in ring/edge order. Empty when they do not meet.
    pub fn segment_intersection_points(&self, start: Point2D, end: Point2D) -> Vec<Point2D> {
        let mut points = Vec::new();
        if self.contains(start) {
            points.push(start);
        }
        for ring in self.rings() {
            for (a, b) in ring_edges(ring) {
                points.extend(segment_edge_points(start, end, a, b));
            }
        }
        if end != start && self.contains(end) {
            points.push(end);
        }
        points
    }

    fn rings(&self) -> impl Iterator<Item = &[Point2D]> {
        std::iter::once(self.exterior.as_slice()).chain(self.interiors.iter().map(Vec::as_slice))
    }
}

fn open_ring(mut ring: Vec<Point2D>) -> Vec<Point2D> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn ring_edges(ring: &[Point2D]) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
}

/// Shoelace area (unsigned).
fn ring_area(ring: &[Point2D]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice: f64 = ring_edges(ring).map(|(a, b)| a.cross(b)).sum();
    twice.abs() * 0.5
}

/// Intersection of segment `p → p + r` with edge `q → q + s`.
///
/// Returns one point for a proper crossing, the two overlap ends for a
/// collinear overlap, nothing otherwise.
fn segment_edge_points(p: Point2D, p_end: Point2D, q: Point2D, q_end: Point2D) -> Vec<Point2D> {
    let r = p_end - p;
    let s = q_end - q;
    let r_len2 = r.length_squared();
    if r_len2 == 0.0 {
        return Vec::new();
    }

    let diff = q - p;
    let denom = r.cross(s);
    let scale = r.length() * s.length().max(diff.length());

    if denom.abs() > COLLINEAR_TOLERANCE * r.length() * s.length() {
        let t = diff.cross(s) / denom;
        let u = diff.cross(r) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            return vec![p + r * t];
        }
        return Vec::new();
    }

    // Parallel: only collinear edges can share points with the segment
    if diff.cross(r).abs() > COLLINEAR_TOLERANCE * scale.max(f64::MIN_POSITIVE) {
        return Vec::new();
    }

    let t0 = diff.dot(r) / r_len2;
    let t1 = (q_end - p).dot(r) / r_len2;
    let lo = t0.min(t1).max(0.0);
    let hi = t0.max(t1).min(1.0);
    if lo > hi {
        Vec::new()
    } else if lo == hi {
        vec![p + r * lo]
    } else {
        vec![p + r * lo, p + r * hi]
    }
}
