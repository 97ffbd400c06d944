//! Footprints loaded from a GeoJSON FeatureCollection.
//!
//! `Polygon` and `MultiPolygon` features are kept; every polygon part becomes
//! one footprint. Ids come from the feature `id`, then `properties.id`, then
//! the feature's position in the collection. Multi-part features get a
//! `#<part>` suffix.

use std::path::Path;

use facade_geo::{BuildingFootprint, Frame, GeoPoint, Point2D, Polygon};
use serde_json::Value;

use super::{FootprintProvider, StaticFootprints};
use crate::document::id_string;
use crate::error::{ResolverError, Result};

/// Footprints parsed once from a GeoJSON file.
#[derive(Clone, Debug)]
pub struct GeoJsonFootprints {
    inner: StaticFootprints,
}

impl GeoJsonFootprints {
    /// Load a FeatureCollection from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResolverError::Config(format!(
                "Failed to read footprints file {}: {}",
                path.display(),
                e
            ))
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            ResolverError::Config(format!("Invalid GeoJSON in {}: {}", path.display(), e))
        })?;
        let footprints = Self::from_value(&value)?;
        log::info!(
            "Loaded {} building footprints from {}",
            footprints.len(),
            path.display()
        );
        Ok(footprints)
    }

    /// Parse a FeatureCollection value.
    pub fn from_value(collection: &Value) -> Result<Self> {
        let features = collection
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ResolverError::Config("GeoJSON FeatureCollection has no features array".into())
            })?;

        let mut footprints = Vec::new();
        for (index, feature) in features.iter().enumerate() {
            let id = feature_id(feature).unwrap_or_else(|| index.to_string());
            match feature_polygons(feature) {
                Some(polygons) if polygons.len() == 1 => {
                    footprints.extend(
                        polygons
                            .into_iter()
                            .map(|p| BuildingFootprint::new(id.clone(), p, Frame::Geographic)),
                    );
                }
                Some(polygons) => {
                    footprints.extend(polygons.into_iter().enumerate().map(|(part, p)| {
                        BuildingFootprint::new(format!("{id}#{part}"), p, Frame::Geographic)
                    }));
                }
                None => log::warn!("Skipping feature {id}: not a readable polygon"),
            }
        }

        Ok(Self {
            inner: StaticFootprints::new(footprints),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl FootprintProvider for GeoJsonFootprints {
    fn footprints_near(&self, center: GeoPoint, radius_m: f64) -> Result<Vec<BuildingFootprint>> {
        self.inner.footprints_near(center, radius_m)
    }
}

fn feature_id(feature: &Value) -> Option<String> {
    feature
        .get("id")
        .and_then(id_string)
        .or_else(|| feature.get("properties")?.get("id").and_then(id_string))
}

fn feature_polygons(feature: &Value) -> Option<Vec<Polygon>> {
    let geometry = feature.get("geometry")?;
    let coordinates = geometry.get("coordinates")?.as_array()?;
    match geometry.get("type")?.as_str()? {
        "Polygon" => Some(vec![parse_polygon(coordinates)?]),
        "MultiPolygon" => coordinates
            .iter()
            .map(|part| parse_polygon(part.as_array()?))
            .collect(),
        _ => None,
    }
}

/// `[[exterior...], [hole...], ...]`
fn parse_polygon(rings: &[Value]) -> Option<Polygon> {
    let (exterior, holes) = rings.split_first()?;
    let holes = holes.iter().map(parse_ring).collect::<Option<Vec<_>>>()?;
    Some(Polygon::with_holes(parse_ring(exterior)?, holes))
}

/// `[[lon, lat], ...]`; extra ordinates (altitude) are ignored.
fn parse_ring(ring: &Value) -> Option<Vec<Point2D>> {
    ring.as_array()?
        .iter()
        .map(|position| {
            let position = position.as_array()?;
            Some(Point2D::new(
                position.first()?.as_f64()?,
                position.get(1)?.as_f64()?,
            ))
        })
        .collect()
}
