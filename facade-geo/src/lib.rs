//! # Facade-Geo: Label Geolocation Geometry
//!
//! Turns a label placed on a street-level panorama into a point on a
//! building facade and the closest known street address.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use facade_geo::{CameraPose, GeoPoint, RayOptions, IntersectionResolver, Reproject, Frame};
//! use facade_geo::project_ray;
//!
//! let pose = CameraPose::new(GeoPoint::new(40.0, -74.0), 90.0, -10.0, 2).unwrap();
//! let ray = project_ray(&pose, &RayOptions::default()).unwrap();
//!
//! let resolver = IntersectionResolver::new(Vec::new()).unwrap();
//! let mut stats = Default::default();
//! let hit = resolver.resolve(&ray.reproject(Frame::Planar), &mut stats).unwrap();
//! assert!(hit.is_none());
//! ```
//!
//! ## Reference Frames
//!
//! Every geometry carries a [`Frame`] tag:
//! - **Geographic**: WGS84 degrees, x = longitude, y = latitude
//! - **Planar**: spherical Mercator meters, x = east, y = north
//!
//! Components compare tags and return [`GeoError::FrameMismatch`] instead of
//! converting silently. Use [`Reproject`] to move geometry between frames.
//!
//! ## Data Flow
//!
//! ```text
//!   CameraPose ──► project_ray ──► RaySegment
//!                                      │
//!   BuildingFootprint[] ──────────────►│ IntersectionResolver
//!                                      │  (R-tree broad phase, exact narrow phase)
//!                                      ▼
//!                              IntersectionResult
//!                                      │ planar → geographic
//!                                      ▼
//!   AddressPoint[] ──► NearestAddressIndex ──► AddressMatch (≤ 25 m)
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Points, bounds and the frame tag
//! - [`transform`]: Geographic ↔ planar conversion
//! - [`ray`]: Camera pose to ground ray
//! - [`footprint`]: Building polygons and their spatial index
//! - [`intersection`]: Closest ray/footprint hit
//! - [`address`]: Great-circle nearest address lookup

pub mod address;
pub mod core;
pub mod error;
pub mod footprint;
pub mod intersection;
pub mod ray;
pub mod transform;

pub use address::{
    AddressMatch, AddressPoint, EARTH_RADIUS_M, MAX_MATCH_DISTANCE_M, NearestAddressIndex,
    haversine_angle, haversine_distance_m,
};
pub use core::{Bounds, Frame, GeoPoint, Point2D};
pub use error::{GeoError, Result};
pub use footprint::{BuildingFootprint, FootprintIndex, Polygon};
pub use intersection::{IntersectionResolver, IntersectionResult, IntersectionStats};
pub use ray::{CameraPose, RETRY_SCALE, RayOptions, RaySegment, base_distance, project_ray, ray_length};
pub use transform::{Reproject, convert, geographic_to_planar, planar_to_geographic};
