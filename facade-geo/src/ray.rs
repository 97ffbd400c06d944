//! Camera pose to ground-ray projection.
//!
//! A label placed on a street-level panorama gives the viewing direction
//! (heading, pitch) and zoom at which it was placed. The projector turns
//! that into a 2D segment on the map starting at the camera:
//!
//! ```text
//!   distance = camera_height / |tan(pitch)|   if |pitch| > 0.01 rad
//!            = base_distance(zoom)            otherwise
//!   distance *= (base_distance(zoom) / 25) * scale_factor
//!
//!   dx = distance * sin(heading)              heading 0° = north = +y
//!   dy = distance * cos(heading)              heading 90° = east = +x
//! ```
//!
//! Direction is computed in the planar frame.

use crate::core::{Bounds, Frame, GeoPoint, Point2D};
use crate::error::{GeoError, Result};
use crate::transform::{Reproject, convert, geographic_to_planar, planar_to_geographic};

/// Base ray distance (meters) for zoom levels outside [`ZOOM_DISTANCES`].
pub const DEFAULT_BASE_DISTANCE_M: f64 = 25.0;

/// Base ray distance (meters) by panorama zoom level.
pub const ZOOM_DISTANCES: [(i32, f64); 6] = [
    (0, 100.0),
    (1, 60.0),
    (2, 40.0),
    (3, 25.0),
    (4, 15.0),
    (5, 10.0),
];

/// Scale factor of the single longer retry after a miss.
pub const RETRY_SCALE: f64 = 2.0;

/// Pitch magnitude (radians) below which the ground-plane estimate is
/// degenerate and the zoom base distance is used instead.
pub const MIN_PITCH_RAD: f64 = 0.01;

/// Base distance for a zoom level. Total: unknown zooms map to 25 m.
#[inline]
pub fn base_distance(zoom: i32) -> f64 {
    ZOOM_DISTANCES
        .iter()
        .find(|(z, _)| *z == zoom)
        .map_or(DEFAULT_BASE_DISTANCE_M, |(_, d)| *d)
}

/// Where the camera was and which way the label was facing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    /// Camera location
    pub location: GeoPoint,
    /// Compass heading in degrees, clockwise from north
    pub heading_deg: f64,
    /// Pitch in degrees, negative looks down
    pub pitch_deg: f64,
    /// Panorama zoom level
    pub zoom: i32,
}

impl CameraPose {
    /// Create a validated pose.
    pub fn new(location: GeoPoint, heading_deg: f64, pitch_deg: f64, zoom: i32) -> Result<Self> {
        if !location.is_valid() {
            return Err(GeoError::InvalidPose(format!(
                "location ({}, {}) out of range",
                location.lat, location.lon
            )));
        }
        if !heading_deg.is_finite() || !pitch_deg.is_finite() {
            return Err(GeoError::InvalidPose(format!(
                "heading {heading_deg} / pitch {pitch_deg} not finite"
            )));
        }
        Ok(Self {
            location,
            heading_deg,
            pitch_deg,
            zoom,
        })
    }
}

/// Projection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayOptions {
    /// Multiplier applied after the zoom scaling (escalation uses 2.0)
    pub scale_factor: f64,
    /// Camera height above the ground plane in meters
    pub camera_height_m: f64,
    /// Compute in the planar frame and return the ray in the geographic
    /// frame. When false the planar ray is returned as-is.
    pub use_meters: bool,
}

impl Default for RayOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            camera_height_m: 2.5,
            use_meters: true,
        }
    }
}

impl RayOptions {
    /// Same options with a different scale factor.
    #[inline]
    pub fn with_scale(self, scale_factor: f64) -> Self {
        Self {
            scale_factor,
            ..self
        }
    }
}

/// Frame-tagged ray segment from the camera outward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaySegment {
    /// Camera location in `frame`
    pub origin: Point2D,
    /// Far end of the ray in `frame`
    pub end: Point2D,
    /// Frame of both points
    pub frame: Frame,
}

impl RaySegment {
    /// Length in frame units.
    #[inline]
    pub fn length(&self) -> f64 {
        self.origin.distance(self.end)
    }

    /// Bounding box in frame units.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points([&self.origin, &self.end])
    }
}

impl Reproject for RaySegment {
    fn frame(&self) -> Frame {
        self.frame
    }

    fn reproject(&self, target: Frame) -> Self {
        Self {
            origin: convert(self.origin, self.frame, target),
            end: convert(self.end, self.frame, target),
            frame: target,
        }
    }
}

/// Ground distance (planar units) the ray should cover for a pose.
pub fn ray_length(pose: &CameraPose, options: &RayOptions) -> f64 {
    let pitch_rad = pose.pitch_deg.to_radians();
    let zoom_distance = base_distance(pose.zoom);

    let distance = if pitch_rad.abs() > MIN_PITCH_RAD {
        options.camera_height_m / pitch_rad.tan().abs()
    } else {
        zoom_distance
    };

    distance * (zoom_distance / DEFAULT_BASE_DISTANCE_M) * options.scale_factor
}

/// Project a camera pose into a ground ray.
///
/// With `use_meters` the result is in the geographic frame and its origin is
/// exactly the pose location; otherwise it is in the planar frame.
pub fn project_ray(pose: &CameraPose, options: &RayOptions) -> Result<RaySegment> {
    if !(options.scale_factor.is_finite() && options.scale_factor > 0.0) {
        return Err(GeoError::InvalidPose(format!(
            "scale factor {} must be positive",
            options.scale_factor
        )));
    }
    if !(options.camera_height_m.is_finite() && options.camera_height_m > 0.0) {
        return Err(GeoError::InvalidPose(format!(
            "camera height {} must be positive",
            options.camera_height_m
        )));
    }

    let heading_rad = pose.heading_deg.to_radians();
    let distance = ray_length(pose, options);

    let origin = geographic_to_planar(pose.location.to_point());
    let end = origin
        + Point2D::new(
            distance * heading_rad.sin(),
            distance * heading_rad.cos(),
        );

    log::trace!(
        "Ray heading={:.1}° pitch={:.1}° zoom={} length={:.2}",
        pose.heading_deg,
        pose.pitch_deg,
        pose.zoom,
        distance
    );

    if options.use_meters {
        Ok(RaySegment {
            origin: pose.location.to_point(),
            end: planar_to_geographic(end),
            frame: Frame::Geographic,
        })
    } else {
        Ok(RaySegment {
            origin,
            end,
            frame: Frame::Planar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pose(heading: f64, pitch: f64, zoom: i32) -> CameraPose {
        CameraPose::new(GeoPoint::new(40.0, -74.0), heading, pitch, zoom).unwrap()
    }

    fn planar() -> RayOptions {
        RayOptions {
            use_meters: false,
            ..RayOptions::default()
        }
    }

    #[test]
    fn test_zoom_table_is_total() {
        assert_eq!(base_distance(0), 100.0);
        assert_eq!(base_distance(1), 60.0);
        assert_eq!(base_distance(2), 40.0);
        assert_eq!(base_distance(3), 25.0);
        assert_eq!(base_distance(4), 15.0);
        assert_eq!(base_distance(5), 10.0);
        for zoom in [-3, -1, 6, 7, 42, i32::MAX, i32::MIN] {
            assert_eq!(base_distance(zoom), 25.0, "zoom {zoom}");
        }
    }

    #[test]
    fn test_oblique_pitch_uses_ground_plane() {
        let length = ray_length(&pose(0.0, -10.0, 2), &RayOptions::default());
        let expected = 2.5 / 10f64.to_radians().tan() * (40.0 / 25.0);
        assert_relative_eq!(length, expected, epsilon = 1e-9);
        assert_relative_eq!(length, 22.685, epsilon = 1e-3);
    }

    #[test]
    fn test_flat_pitch_uses_scaled_base_distance() {
        // 0.5° is below the 0.01 rad threshold
        for zoom in 0..=5 {
            let length = ray_length(&pose(0.0, 0.5, zoom), &RayOptions::default());
            let base = base_distance(zoom);
            assert_relative_eq!(length, base * base / 25.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pitch_sign_does_not_matter() {
        let down = ray_length(&pose(0.0, -15.0, 1), &RayOptions::default());
        let up = ray_length(&pose(0.0, 15.0, 1), &RayOptions::default());
        assert_relative_eq!(down, up, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_factor_multiplies_length() {
        let options = RayOptions::default();
        let base = ray_length(&pose(0.0, -10.0, 1), &options);
        let doubled = ray_length(&pose(0.0, -10.0, 1), &options.with_scale(RETRY_SCALE));
        assert_relative_eq!(doubled, base * 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_compass_directions_in_planar_frame() {
        let east = project_ray(&pose(90.0, -10.0, 2), &planar()).unwrap();
        let d = east.end - east.origin;
        assert_eq!(east.frame, Frame::Planar);
        assert!(d.x > 0.0);
        assert_relative_eq!(d.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(east.length(), 22.685, epsilon = 1e-3);

        let north = project_ray(&pose(0.0, -10.0, 2), &planar()).unwrap();
        let d = north.end - north.origin;
        assert!(d.y > 0.0);
        assert_relative_eq!(d.x, 0.0, epsilon = 1e-9);

        let south_west = project_ray(&pose(225.0, -10.0, 2), &planar()).unwrap();
        let d = south_west.end - south_west.origin;
        assert!(d.x < 0.0 && d.y < 0.0);
        assert_relative_eq!(d.x, d.y, epsilon = 1e-9);
    }

    #[test]
    fn test_geographic_output_starts_at_camera() {
        let p = pose(90.0, -10.0, 2);
        let ray = project_ray(&p, &RayOptions::default()).unwrap();

        assert_eq!(ray.frame, Frame::Geographic);
        assert_eq!(ray.origin, p.location.to_point());
        assert!(ray.end.x > ray.origin.x);
        assert_relative_eq!(ray.end.y, ray.origin.y, epsilon = 1e-9);

        // Back in the planar frame the length is unchanged
        let planar_ray = ray.reproject(Frame::Planar);
        assert_relative_eq!(planar_ray.length(), 22.685, epsilon = 1e-3);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(CameraPose::new(GeoPoint::new(95.0, 0.0), 0.0, 0.0, 1).is_err());
        assert!(CameraPose::new(GeoPoint::new(0.0, 0.0), f64::NAN, 0.0, 1).is_err());

        let p = pose(0.0, -10.0, 1);
        assert!(project_ray(&p, &RayOptions::default().with_scale(0.0)).is_err());
        let no_height = RayOptions {
            camera_height_m: -1.0,
            ..RayOptions::default()
        };
        assert!(project_ray(&p, &no_height).is_err());
    }
}
