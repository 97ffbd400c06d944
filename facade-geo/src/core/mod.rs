//! Fundamental geometric types shared by every component:
//! - [`Point2D`] and [`GeoPoint`]: coordinate types
//! - [`Frame`]: reference-frame tag carried by all geometries
//! - [`Bounds`]: axis-aligned bounding box

mod bounds;
mod point;

pub use bounds::Bounds;
pub use point::{Frame, GeoPoint, Point2D};
