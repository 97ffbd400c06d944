//! Ray / building-footprint intersection.
//!
//! Two-stage filtering:
//! 1. **Broad phase**: footprints whose bounding boxes overlap the ray's box
//!    ([`FootprintIndex`])
//! 2. **Narrow phase**: footprints whose exact outline touches the ray
//!
//! Every surviving footprint contributes the vertices of its intersection
//! with the ray as candidate points; the candidate nearest the ray origin
//! wins. Ties keep the earliest candidate in footprint input order, then
//! ring and edge order.
//!
//! A miss is reported as `None`. Retrying with a longer ray is the caller's
//! decision.

use crate::core::{Frame, Point2D};
use crate::error::{GeoError, Result};
use crate::footprint::{BuildingFootprint, FootprintIndex};
use crate::ray::RaySegment;

/// Closest hit of a ray on a footprint.
#[derive(Clone, Debug, PartialEq)]
pub struct IntersectionResult {
    /// Identifier of the footprint that was hit
    pub footprint_id: String,
    /// Hit point, in the ray's frame
    pub point: Point2D,
    /// Frame of `point`
    pub frame: Frame,
    /// Distance from the ray origin, in frame units
    pub distance: f64,
}

/// Hit / miss tallies, accumulated by whoever drives the resolver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntersectionStats {
    /// Resolve calls that found at least one candidate
    pub hits: u32,
    /// Resolve calls that found nothing
    pub misses: u32,
}

impl IntersectionStats {
    /// Record one resolve outcome.
    #[inline]
    pub fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }
}

/// Intersects rays against a fixed set of footprints.
///
/// The broad-phase index is built once so an escalated retry reuses it.
#[derive(Clone, Debug)]
pub struct IntersectionResolver {
    footprints: Vec<BuildingFootprint>,
    frame: Option<Frame>,
    index: FootprintIndex,
}

impl IntersectionResolver {
    /// Build a resolver. All footprints must share one frame.
    pub fn new(footprints: Vec<BuildingFootprint>) -> Result<Self> {
        let frame = footprints.first().map(|f| f.frame);
        if let Some(expected) = frame
            && let Some(odd) = footprints.iter().find(|f| f.frame != expected)
        {
            return Err(GeoError::FrameMismatch {
                expected,
                actual: odd.frame,
            });
        }

        let index = FootprintIndex::build(&footprints);

        Ok(Self {
            footprints,
            frame,
            index,
        })
    }

    /// Frame of the footprints, `None` when there are none.
    #[inline]
    pub fn frame(&self) -> Option<Frame> {
        self.frame
    }

    /// Number of footprints.
    #[inline]
    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    /// No footprints to hit.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }

    /// Closest footprint hit along `ray`, if any.
    ///
    /// # Errors
    /// [`GeoError::FrameMismatch`] when the ray and footprints disagree on
    /// frame. An empty footprint set is a miss, not an error.
    pub fn resolve(
        &self,
        ray: &RaySegment,
        stats: &mut IntersectionStats,
    ) -> Result<Option<IntersectionResult>> {
        let Some(frame) = self.frame else {
            stats.record(false);
            return Ok(None);
        };
        if ray.frame != frame {
            return Err(GeoError::FrameMismatch {
                expected: frame,
                actual: ray.frame,
            });
        }

        // Broad phase
        let candidates = self.index.query(&ray.bounds());

        // Narrow phase
        let touching = candidates
            .into_iter()
            .map(|i| &self.footprints[i])
            .filter(|f| f.polygon.intersects_segment(ray.origin, ray.end));

        let mut best: Option<(f64, Point2D, &BuildingFootprint)> = None;
        for footprint in touching {
            for point in footprint
                .polygon
                .segment_intersection_points(ray.origin, ray.end)
            {
                let d = ray.origin.distance_squared(point);
                if best.as_ref().is_none_or(|(best_d, _, _)| d < *best_d) {
                    best = Some((d, point, footprint));
                }
            }
        }

        stats.record(best.is_some());

        Ok(best.map(|(d, point, footprint)| {
            log::trace!(
                "Ray hit footprint {} at {:.2} units from origin",
                footprint.id,
                d.sqrt()
            );
            IntersectionResult {
                footprint_id: footprint.id.clone(),
                point,
                frame,
                distance: d.sqrt(),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::Polygon;
    use approx::assert_relative_eq;

    fn rect(id: &str, min: (f64, f64), max: (f64, f64)) -> BuildingFootprint {
        BuildingFootprint::new(
            id,
            Polygon::new(vec![
                Point2D::new(min.0, min.1),
                Point2D::new(max.0, min.1),
                Point2D::new(max.0, max.1),
                Point2D::new(min.0, max.1),
            ]),
            Frame::Planar,
        )
    }

    fn east_ray(length: f64) -> RaySegment {
        RaySegment {
            origin: Point2D::ZERO,
            end: Point2D::new(length, 0.0),
            frame: Frame::Planar,
        }
    }

    #[test]
    fn test_nearest_footprint_wins() {
        let resolver = IntersectionResolver::new(vec![
            rect("far", (30.0, -5.0), (40.0, 5.0)),
            rect("near", (10.0, -5.0), (20.0, 5.0)),
            rect("off-axis", (5.0, 10.0), (15.0, 20.0)),
        ])
        .unwrap();
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&east_ray(50.0), &mut stats).unwrap().unwrap();

        assert_eq!(hit.footprint_id, "near");
        assert_relative_eq!(hit.point.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-9);
        assert_eq!(stats, IntersectionStats { hits: 1, misses: 0 });
    }

    #[test]
    fn test_short_ray_misses() {
        let resolver =
            IntersectionResolver::new(vec![rect("b", (10.0, -5.0), (20.0, 5.0))]).unwrap();
        let mut stats = IntersectionStats::default();

        assert!(resolver.resolve(&east_ray(8.0), &mut stats).unwrap().is_none());
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_ray_ending_inside_footprint_hits_wall() {
        let resolver =
            IntersectionResolver::new(vec![rect("b", (10.0, -5.0), (20.0, 5.0))]).unwrap();
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&east_ray(15.0), &mut stats).unwrap().unwrap();
        assert_relative_eq!(hit.point.x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_camera_inside_footprint_hits_origin() {
        let resolver =
            IntersectionResolver::new(vec![rect("b", (-5.0, -5.0), (5.0, 5.0))]).unwrap();
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&east_ray(20.0), &mut stats).unwrap().unwrap();
        assert_eq!(hit.point, Point2D::ZERO);
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_ray_along_wall_takes_nearest_vertex() {
        // Ray runs along the bottom wall starting before it
        let resolver =
            IntersectionResolver::new(vec![rect("b", (10.0, 0.0), (20.0, 10.0))]).unwrap();
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&east_ray(30.0), &mut stats).unwrap().unwrap();
        assert_relative_eq!(hit.point.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_equidistant_keeps_first_footprint() {
        // Two footprints share the wall at x = 10
        let resolver = IntersectionResolver::new(vec![
            rect("first", (10.0, -5.0), (20.0, 0.0)),
            rect("second", (10.0, 0.0), (20.0, 5.0)),
        ])
        .unwrap();
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&east_ray(30.0), &mut stats).unwrap().unwrap();
        assert_eq!(hit.footprint_id, "first");
    }

    #[test]
    fn test_equidistant_order_survives_large_sets() {
        // A dense block of unrelated footprints around the tied pair; the
        // pair is listed late and in reverse spatial order
        let mut footprints: Vec<BuildingFootprint> = (0..200)
            .map(|i| {
                let x = (i % 20) as f64 * 12.0 - 120.0;
                let y = (i / 20) as f64 * 12.0 + 20.0;
                rect(&format!("filler{i}"), (x, y), (x + 10.0, y + 10.0))
            })
            .collect();
        footprints.push(rect("upper", (10.0, 0.0), (20.0, 5.0)));
        footprints.push(rect("lower", (10.0, -5.0), (20.0, 0.0)));

        let resolver = IntersectionResolver::new(footprints).unwrap();
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&east_ray(30.0), &mut stats).unwrap().unwrap();
        assert_eq!(hit.footprint_id, "upper");
    }

    #[test]
    fn test_geographic_frame_uses_same_index() {
        let deg = |id: &str, lon: f64| {
            BuildingFootprint::new(
                id,
                Polygon::new(vec![
                    Point2D::new(lon, 40.0),
                    Point2D::new(lon + 0.0001, 40.0),
                    Point2D::new(lon + 0.0001, 40.0001),
                    Point2D::new(lon, 40.0001),
                ]),
                Frame::Geographic,
            )
        };
        let footprints: Vec<BuildingFootprint> = (0..50)
            .map(|i| deg(&format!("b{i}"), -74.0 + i as f64 * 0.0002))
            .collect();
        let resolver = IntersectionResolver::new(footprints).unwrap();
        let ray = RaySegment {
            origin: Point2D::new(-73.99965, 40.00005),
            end: Point2D::new(-73.9990, 40.00005),
            frame: Frame::Geographic,
        };
        let mut stats = IntersectionStats::default();

        let hit = resolver.resolve(&ray, &mut stats).unwrap().unwrap();
        assert_eq!(hit.footprint_id, "b2");
        assert_relative_eq!(hit.point.x, -73.9996, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_footprints_is_absence() {
        let resolver = IntersectionResolver::new(Vec::new()).unwrap();
        let mut stats = IntersectionStats::default();

        assert!(resolver.is_empty());
        assert!(resolver.resolve(&east_ray(30.0), &mut stats).unwrap().is_none());
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_frame_mismatch_is_rejected() {
        let resolver =
            IntersectionResolver::new(vec![rect("b", (10.0, -5.0), (20.0, 5.0))]).unwrap();
        let mut stats = IntersectionStats::default();
        let geographic = RaySegment {
            frame: Frame::Geographic,
            ..east_ray(30.0)
        };

        let err = resolver.resolve(&geographic, &mut stats).unwrap_err();
        assert_eq!(
            err,
            GeoError::FrameMismatch {
                expected: Frame::Planar,
                actual: Frame::Geographic
            }
        );
    }

    #[test]
    fn test_mixed_footprint_frames_rejected() {
        let mut geographic = rect("g", (0.0, 0.0), (1.0, 1.0));
        geographic.frame = Frame::Geographic;

        let result = IntersectionResolver::new(vec![rect("p", (0.0, 0.0), (1.0, 1.0)), geographic]);
        assert!(matches!(result, Err(GeoError::FrameMismatch { .. })));
    }
}
