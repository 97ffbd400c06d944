//! Conversion between the geographic and planar reference frames.
//!
//! The planar frame is spherical Mercator (EPSG:3857), the projection used by
//! web map tiles and by the footprint data this crate was built around.
//! Planar units are Mercator meters, which stretch by `1 / cos(lat)` relative
//! to ground meters; distances along a ray are measured in these units.
//!
//! Conversion is stateless and total for valid inputs. Latitudes beyond the
//! Mercator limit are clamped to it before projecting.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::core::{Frame, Point2D};

/// Sphere radius used by spherical Mercator (WGS84 semi-major axis).
pub const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Northern/southern limit of the Mercator square.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Project a geographic point (x = lon, y = lat, degrees) to planar meters.
#[inline]
pub fn geographic_to_planar(point: Point2D) -> Point2D {
    let lat = point
        .y
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    Point2D::new(
        MERCATOR_RADIUS_M * point.x.to_radians(),
        MERCATOR_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    )
}

/// Inverse projection from planar meters back to degrees (x = lon, y = lat).
#[inline]
pub fn planar_to_geographic(point: Point2D) -> Point2D {
    let lon = (point.x / MERCATOR_RADIUS_M).to_degrees();
    let lat = (2.0 * (point.y / MERCATOR_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    Point2D::new(lon, lat)
}

/// Convert a point between frames. Identity when `from == to`.
#[inline]
pub fn convert(point: Point2D, from: Frame, to: Frame) -> Point2D {
    match (from, to) {
        (Frame::Geographic, Frame::Planar) => geographic_to_planar(point),
        (Frame::Planar, Frame::Geographic) => planar_to_geographic(point),
        _ => point,
    }
}

/// Geometry that can be re-expressed in another reference frame.
///
/// Implementors keep their own frame tag in sync with their coordinates;
/// reprojecting to the frame a value already has returns it unchanged.
pub trait Reproject: Sized {
    /// Frame the coordinates are currently expressed in.
    fn frame(&self) -> Frame;

    /// Same geometry expressed in `target`.
    fn reproject(&self, target: Frame) -> Self;
}
