//! Shared fixtures: one camera, a building on each side of the street and
//! address points near where east/west facing labels hit them.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use facade_geo::{
    AddressPoint, BuildingFootprint, EARTH_RADIUS_M, Frame, GeoPoint, Point2D, Polygon,
    geographic_to_planar, planar_to_geographic,
};
use facade_resolver::config::{PollingConfig, ProjectionConfig};
use facade_resolver::document::ImageDocument;
use facade_resolver::{
    AddressIndexCache, DocumentStore, FieldUpdate, LabelResolutionWorkflow, LocatePipeline,
    MemoryStore, ResolverError, Result, StaticFootprints,
};
use serde_json::{Value, json};

pub const CAMERA: GeoPoint = GeoPoint::new(40.0, -74.0);

/// Planar offset of each facade from the camera.
pub const FACADE_OFFSET: f64 = 15.0;

fn planar_block(id: &str, from: f64, to: f64) -> BuildingFootprint {
    let c = geographic_to_planar(CAMERA.to_point());
    BuildingFootprint::new(
        id,
        Polygon::new(vec![
            Point2D::new(c.x + from, c.y - 8.0),
            Point2D::new(c.x + to, c.y - 8.0),
            Point2D::new(c.x + to, c.y + 8.0),
            Point2D::new(c.x + from, c.y + 8.0),
        ]),
        Frame::Planar,
    )
}

/// One building east and one west of the camera, facades 15 planar meters
/// away. North and south are open.
pub fn street() -> StaticFootprints {
    StaticFootprints::new(vec![
        planar_block("east", FACADE_OFFSET, 35.0),
        planar_block("west", -35.0, -FACADE_OFFSET),
    ])
}

/// The same street as a GeoJSON FeatureCollection in lon/lat.
pub fn street_geojson() -> Value {
    let c = geographic_to_planar(CAMERA.to_point());
    let block = |id: &str, from: f64, to: f64| {
        let ring: Vec<Value> = [(from, -8.0), (to, -8.0), (to, 8.0), (from, 8.0), (from, -8.0)]
            .iter()
            .map(|(dx, dy)| {
                let p = planar_to_geographic(Point2D::new(c.x + dx, c.y + dy));
                json!([p.x, p.y])
            })
            .collect();
        json!({
            "type": "Feature",
            "properties": {"id": id},
            "geometry": {"type": "Polygon", "coordinates": [ring]}
        })
    };
    json!({
        "type": "FeatureCollection",
        "features": [
            block("east", FACADE_OFFSET, 35.0),
            block("west", -35.0, -FACADE_OFFSET),
        ]
    })
}

fn facade_point(dx: f64) -> GeoPoint {
    let c = geographic_to_planar(CAMERA.to_point());
    GeoPoint::from_point(planar_to_geographic(Point2D::new(c.x + dx, c.y)))
}

/// Where an east-facing label lands.
pub fn east_hit() -> GeoPoint {
    facade_point(FACADE_OFFSET)
}

/// Where a west-facing label lands.
pub fn west_hit() -> GeoPoint {
    facade_point(-FACADE_OFFSET)
}

/// `meters` due north of `from`.
pub fn north_of(from: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint::new(from.lat + (meters / EARTH_RADIUS_M).to_degrees(), from.lon)
}

/// `meters` due west of `from`.
pub fn west_of(from: GeoPoint, meters: f64) -> GeoPoint {
    let radius = EARTH_RADIUS_M * from.lat.to_radians().cos();
    GeoPoint::new(from.lat, from.lon - (meters / radius).to_degrees())
}

pub fn label(id: &str, heading: f64) -> Value {
    json!({
        "label_id": id,
        "markerPov": {"heading": heading, "pitch": -10.0, "zoom": 2}
    })
}

pub fn image(image_id: &str, labels: Vec<Value>) -> Value {
    json!({
        "image_id": image_id,
        "location": {"lat": CAMERA.lat, "lng": CAMERA.lon},
        "human_labels": [{"labels": labels}]
    })
}

pub fn address_record(id: &str, at: GeoPoint, text: &str) -> Value {
    json!({
        "_id": {"$oid": id},
        "geometry": {"type": "Point", "coordinates": [at.lon, at.lat]},
        "google_address": text
    })
}

/// A: 5 m from the east hit. B: 1 m from the west hit.
pub fn addresses() -> Vec<Value> {
    vec![
        address_record("A", north_of(east_hit(), 5.0), "15 East St"),
        address_record("B", north_of(west_hit(), 1.0), "14 West St"),
    ]
}

pub fn fast_polling() -> PollingConfig {
    PollingConfig {
        max_attempts: 5,
        delay_ms: 10,
    }
}

pub fn workflow_with(store: Arc<dyn DocumentStore>, polling: PollingConfig) -> LabelResolutionWorkflow {
    let pipeline = LocatePipeline::new(Arc::new(street()), ProjectionConfig::default(), 100.0);
    let addresses = Arc::new(AddressIndexCache::new(Arc::clone(&store)));
    LabelResolutionWorkflow::new(store, pipeline, addresses, polling)
}

pub fn workflow(store: Arc<dyn DocumentStore>) -> LabelResolutionWorkflow {
    workflow_with(store, fast_polling())
}

/// Store wrapper that hides labels for the first reads, counts reads and
/// can fail writes for one label index or the address collection read.
pub struct ScriptedStore {
    pub inner: MemoryStore,
    reads: AtomicU32,
    labels_visible_from_read: u32,
    failing_label: Option<usize>,
    failing_addresses: bool,
}

impl ScriptedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            reads: AtomicU32::new(0),
            labels_visible_from_read: 1,
            failing_label: None,
            failing_addresses: false,
        }
    }

    /// Labels appear on read number `n` (1-based).
    pub fn labels_from_read(mut self, n: u32) -> Self {
        self.labels_visible_from_read = n;
        self
    }

    /// Writes touching this label index fail.
    pub fn fail_writes_for_label(mut self, index: usize) -> Self {
        self.failing_label = Some(index);
        self
    }

    /// Reading the address collection fails.
    pub fn fail_address_reads(mut self) -> Self {
        self.failing_addresses = true;
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl DocumentStore for ScriptedStore {
    fn find_image(&self, image_id: &str) -> Result<Option<ImageDocument>> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        let doc = self.inner.find_image(image_id)?;
        if read < self.labels_visible_from_read {
            return Ok(doc.map(|d| ImageDocument {
                human_labels: Vec::new(),
                ..d
            }));
        }
        Ok(doc)
    }

    fn find_image_by_label(&self, label_id: &str) -> Result<Option<ImageDocument>> {
        self.inner.find_image_by_label(label_id)
    }

    fn set_fields(&self, image_id: &str, updates: &[FieldUpdate]) -> Result<()> {
        if let Some(index) = self.failing_label {
            let prefix = format!("human_labels.0.labels.{index}.");
            if updates.iter().any(|u| u.path.starts_with(&prefix)) {
                return Err(ResolverError::Store("injected write failure".into()));
            }
        }
        self.inner.set_fields(image_id, updates)
    }

    fn address_records(&self) -> Result<Vec<AddressPoint>> {
        if self.failing_addresses {
            return Err(ResolverError::Store("injected read failure".into()));
        }
        self.inner.address_records()
    }
}
