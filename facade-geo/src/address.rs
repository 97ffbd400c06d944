//! Nearest street address lookup.
//!
//! Address points are placed on the unit sphere as 3D vectors and stored in
//! a k-d tree. Chord length between two unit vectors grows monotonically
//! with the great-circle angle between them, so the Euclidean nearest
//! neighbour is also the haversine nearest neighbour. The reported distance
//! is recomputed with the haversine formula.
//!
//! A match is accepted only within [`MAX_MATCH_DISTANCE_M`].

use std::collections::HashSet;

use kiddo::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use serde::{Deserialize, Serialize};

use crate::core::GeoPoint;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Farthest an address point may be from the query and still match.
pub const MAX_MATCH_DISTANCE_M: f64 = 25.0;

/// A known street address with its location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressPoint {
    /// Store identifier of the address record
    pub id: String,
    /// Where the address point sits
    pub location: GeoPoint,
    /// Formatted address text
    pub address: String,
}

impl AddressPoint {
    pub fn new(id: impl Into<String>, location: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location,
            address: address.into(),
        }
    }
}

/// Accepted nearest address. Field names match the stored label shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddressMatch {
    /// Identifier of the matched address record
    #[serde(rename = "mongo_id")]
    pub address_id: String,
    /// Address text
    #[serde(rename = "google_address")]
    pub address: String,
    /// Great-circle distance in meters, rounded to 2 decimals
    pub distance_m: f64,
}

/// Central angle between two locations (radians), haversine formula.
pub fn haversine_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// Great-circle distance in meters.
#[inline]
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_angle(a, b) * EARTH_RADIUS_M
}

/// Balanced, read-only tree. Items are positions in the kept point list.
type AddressTree = ImmutableKdTree<f64, u64, 3, 32>;

fn unit_vector(p: GeoPoint) -> [f64; 3] {
    let (lat, lon) = (p.lat.to_radians(), p.lon.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Immutable nearest-neighbour index over address points.
pub struct NearestAddressIndex {
    /// `None` when no point survived filtering
    tree: Option<AddressTree>,
    points: Vec<AddressPoint>,
}

impl std::fmt::Debug for NearestAddressIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearestAddressIndex")
            .field("points", &self.points.len())
            .finish()
    }
}

impl NearestAddressIndex {
    /// Build the index. Points with invalid locations are dropped; of several
    /// points at the exact same location only the first is kept.
    pub fn build(points: impl IntoIterator<Item = AddressPoint>) -> Self {
        let mut vectors: Vec<[f64; 3]> = Vec::new();
        let mut kept: Vec<AddressPoint> = Vec::new();
        let mut seen: HashSet<[u64; 3]> = HashSet::new();
        let mut skipped = 0usize;

        for point in points {
            if !point.location.is_valid() {
                skipped += 1;
                continue;
            }
            let v = unit_vector(point.location);
            if !seen.insert(v.map(f64::to_bits)) {
                skipped += 1;
                continue;
            }
            vectors.push(v);
            kept.push(point);
        }

        let tree = (!vectors.is_empty()).then(|| AddressTree::new_from_slice(&vectors));

        if skipped > 0 {
            log::debug!("Address index dropped {skipped} invalid or duplicate points");
        }
        log::info!("Address index built with {} points", kept.len());

        Self { tree, points: kept }
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nearest indexed point and its great-circle distance in meters,
    /// regardless of the acceptance threshold.
    pub fn nearest(&self, location: GeoPoint) -> Option<(&AddressPoint, f64)> {
        let tree = self.tree.as_ref()?;
        if !location.is_valid() {
            return None;
        }
        let nn = tree.nearest_one::<SquaredEuclidean>(&unit_vector(location));
        let point = self.points.get(nn.item as usize)?;
        Some((point, haversine_distance_m(location, point.location)))
    }

    /// Nearest address within [`MAX_MATCH_DISTANCE_M`] of `location`.
    pub fn query(&self, location: GeoPoint) -> Option<AddressMatch> {
        if self.points.is_empty() {
            log::warn!("No address points available");
            return None;
        }

        let (point, distance) = self.nearest(location)?;
        if distance > MAX_MATCH_DISTANCE_M {
            log::debug!(
                "Nearest address {} is {:.2} m away, beyond {} m",
                point.id,
                distance,
                MAX_MATCH_DISTANCE_M
            );
            return None;
        }

        Some(AddressMatch {
            address_id: point.id.clone(),
            address: point.address.clone(),
            distance_m: (distance * 100.0).round() / 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Location `meters` due north of `origin` along the meridian.
    fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
        GeoPoint::new(origin.lat + (meters / EARTH_RADIUS_M).to_degrees(), origin.lon)
    }

    fn origin() -> GeoPoint {
        GeoPoint::new(40.0, -74.0)
    }

    #[test]
    fn test_haversine_along_meridian() {
        let d = haversine_distance_m(origin(), north_of(origin(), 1000.0));
        assert_relative_eq!(d, 1000.0, epsilon = 1e-6);
        assert_eq!(haversine_distance_m(origin(), origin()), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_longitude_at_equator() {
        let d = haversine_distance_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0));
        assert_relative_eq!(d, EARTH_RADIUS_M.to_radians() * 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_index_reports_absence() {
        let index = NearestAddressIndex::build(Vec::new());
        assert!(index.is_empty());
        assert!(index.query(origin()).is_none());
        assert!(index.nearest(origin()).is_none());
    }

    #[test]
    fn test_threshold_boundary() {
        let index = NearestAddressIndex::build(vec![AddressPoint::new(
            "a",
            north_of(origin(), 24.99),
            "1 Main St",
        )]);
        let hit = index.query(origin()).unwrap();
        assert_eq!(hit.address_id, "a");
        assert_eq!(hit.address, "1 Main St");
        assert_relative_eq!(hit.distance_m, 24.99, epsilon = 1e-9);

        let index = NearestAddressIndex::build(vec![AddressPoint::new(
            "b",
            north_of(origin(), 25.01),
            "2 Main St",
        )]);
        assert!(index.query(origin()).is_none());
    }

    #[test]
    fn test_picks_nearest_of_many() {
        let points = (0..50)
            .map(|i| {
                AddressPoint::new(
                    format!("p{i}"),
                    north_of(origin(), 7.0 * i as f64 + 3.0),
                    format!("{i} Main St"),
                )
            })
            .collect::<Vec<_>>();
        let index = NearestAddressIndex::build(points);

        // 60 m north: p8 sits at 59 m
        let hit = index.query(north_of(origin(), 60.0)).unwrap();
        assert_eq!(hit.address_id, "p8");
        assert_relative_eq!(hit.distance_m, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_distance_is_rounded() {
        let index = NearestAddressIndex::build(vec![AddressPoint::new(
            "a",
            north_of(origin(), 12.3456),
            "1 Main St",
        )]);
        let hit = index.query(origin()).unwrap();
        assert_relative_eq!(hit.distance_m, 12.35, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicates_keep_first() {
        let spot = north_of(origin(), 5.0);
        let points = (0..100).map(|i| AddressPoint::new(format!("dup{i}"), spot, "Same St"));
        let index = NearestAddressIndex::build(points);

        assert_eq!(index.len(), 1);
        assert_eq!(index.query(origin()).unwrap().address_id, "dup0");
    }

    #[test]
    fn test_invalid_locations_dropped() {
        let index = NearestAddressIndex::build(vec![
            AddressPoint::new("bad", GeoPoint::new(f64::NAN, 0.0), "Nowhere"),
            AddressPoint::new("good", origin(), "Here"),
        ]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_shared_latitude_and_longitude_rows() {
        // Unit vectors on one parallel share z, on one meridian share the
        // lon-derived ratio; both must index without trouble
        let row: Vec<AddressPoint> = (0..64)
            .map(|i| {
                AddressPoint::new(
                    format!("lat{i}"),
                    GeoPoint::new(40.7, -74.0 + i as f64 * 0.0001),
                    format!("{i} Parallel St"),
                )
            })
            .chain((0..64).map(|i| {
                AddressPoint::new(
                    format!("lon{i}"),
                    GeoPoint::new(40.8 + i as f64 * 0.0001, -73.9),
                    format!("{i} Meridian Ave"),
                )
            }))
            .collect();
        let index = NearestAddressIndex::build(row);
        assert_eq!(index.len(), 128);

        let m = index.query(GeoPoint::new(40.7, -74.0 + 37.0 * 0.0001)).unwrap();
        assert_eq!(m.address_id, "lat37");
        assert_eq!(m.distance_m, 0.0);

        let m = index.query(north_of(GeoPoint::new(40.8 + 12.0 * 0.0001, -73.9), 2.0)).unwrap();
        assert_eq!(m.address_id, "lon12");
        assert_relative_eq!(m.distance_m, 2.0, epsilon = 0.01);
    }
}
