//! Building footprint providers.
//!
//! A provider answers "which buildings are near this point?" in the
//! geographic frame. Providers may return invalid or empty geometry; the
//! caller filters with [`usable_footprints`].

mod fixed;
mod geojson;

pub use fixed::StaticFootprints;
pub use geojson::GeoJsonFootprints;

use facade_geo::{BuildingFootprint, GeoPoint, haversine_distance_m};

use crate::error::Result;

/// Source of building footprints.
pub trait FootprintProvider: Send + Sync {
    /// Footprints within `radius_m` meters of `center`, geographic frame.
    fn footprints_near(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<BuildingFootprint>>;
}

/// Drop empty and invalid geometries.
pub fn usable_footprints(footprints: Vec<BuildingFootprint>) -> Vec<BuildingFootprint> {
    let before = footprints.len();
    let usable: Vec<BuildingFootprint> =
        footprints.into_iter().filter(BuildingFootprint::is_usable).collect();
    if usable.len() < before {
        log::debug!("Dropped {} invalid footprints", before - usable.len());
    }
    usable
}

/// Is any part of a geographic footprint's bounding box within `radius_m`
/// of `center`?
pub(crate) fn is_within(footprint: &BuildingFootprint, center: GeoPoint, radius_m: f64) -> bool {
    let bounds = footprint.bounds();
    if bounds.is_empty() || !bounds.min.is_finite() || !bounds.max.is_finite() {
        return false;
    }
    let nearest = GeoPoint::new(
        center.lat.clamp(bounds.min.y, bounds.max.y),
        center.lon.clamp(bounds.min.x, bounds.max.x),
    );
    haversine_distance_m(center, nearest) <= radius_m
}
