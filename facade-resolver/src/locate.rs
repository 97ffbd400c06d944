//! Label → ground point pipeline.
//!
//! ```text
//!   camera location ──► FootprintProvider (geographic, search radius)
//!                          │ drop invalid, reproject to planar
//!                          ▼
//!   CameraPose ──► ray (scale 1.0) ──► IntersectionResolver ──► hit?
//!                                                   │ miss
//!                  ray (×2.0)        ──► IntersectionResolver ──► hit? / NoIntersection
//!                                                   │
//!                              planar hit ──► geographic point
//! ```

use std::sync::Arc;

use facade_geo::{
    CameraPose, Frame, GeoPoint, IntersectionResolver, IntersectionStats, RETRY_SCALE, RayOptions,
    Reproject, planar_to_geographic, project_ray,
};
use serde_json::{Value, json};

use crate::config::ProjectionConfig;
use crate::error::{ResolverError, Result};
use crate::footprints::{FootprintProvider, usable_footprints};
use crate::store::DocumentStore;

/// Intersection tallies for one or more labels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocateStats {
    pub intersections: IntersectionStats,
    /// Labels that needed the longer retry ray
    pub escalations: u32,
}

/// Resolved ground point of one label.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelFix {
    pub point: GeoPoint,
    pub footprint_id: String,
    pub escalated: bool,
}

/// Shared ray/footprint machinery.
#[derive(Clone)]
pub struct LocatePipeline {
    footprints: Arc<dyn FootprintProvider>,
    projection: ProjectionConfig,
    search_radius_m: f64,
}

impl LocatePipeline {
    pub fn new(
        footprints: Arc<dyn FootprintProvider>,
        projection: ProjectionConfig,
        search_radius_m: f64,
    ) -> Self {
        Self {
            footprints,
            projection,
            search_radius_m,
        }
    }

    #[inline]
    pub fn fallback_zoom(&self) -> i32 {
        self.projection.fallback_zoom
    }

    /// Planar resolver over the usable footprints around `camera`.
    ///
    /// # Errors
    /// `NoFootprints` when the provider has nothing usable nearby.
    pub fn resolver_near(&self, camera: GeoPoint) -> Result<IntersectionResolver> {
        let footprints = usable_footprints(
            self.footprints
                .footprints_near(camera, self.search_radius_m)?,
        );
        if footprints.is_empty() {
            return Err(ResolverError::NoFootprints(format!(
                "none within {} m of ({:.6}, {:.6})",
                self.search_radius_m, camera.lat, camera.lon
            )));
        }
        log::debug!(
            "{} footprints within {} m of camera",
            footprints.len(),
            self.search_radius_m
        );

        let planar = footprints
            .iter()
            .map(|f| f.reproject(Frame::Planar))
            .collect();
        Ok(IntersectionResolver::new(planar)?)
    }

    /// Intersect the label ray, retrying once with the longer ray on a miss.
    ///
    /// # Errors
    /// `NoIntersection` when both rays miss.
    pub fn intersect(
        &self,
        resolver: &IntersectionResolver,
        pose: &CameraPose,
        label_id: &str,
        stats: &mut LocateStats,
    ) -> Result<LabelFix> {
        let options = RayOptions {
            camera_height_m: self.projection.camera_height_m,
            ..RayOptions::default()
        };

        let mut escalated = false;
        let mut hit = self.cast(resolver, pose, &options, stats)?;
        if hit.is_none() {
            log::debug!("Label {label_id}: no hit, retrying with scale {RETRY_SCALE}");
            escalated = true;
            stats.escalations += 1;
            hit = self.cast(
                resolver,
                pose,
                &options.with_scale(RETRY_SCALE),
                stats,
            )?;
        }

        let hit = hit.ok_or_else(|| ResolverError::NoIntersection(label_id.to_string()))?;
        let point = GeoPoint::from_point(planar_to_geographic(hit.point));
        log::debug!(
            "Label {label_id}: hit footprint {} at ({:.7}, {:.7})",
            hit.footprint_id,
            point.lat,
            point.lon
        );

        Ok(LabelFix {
            point,
            footprint_id: hit.footprint_id,
            escalated,
        })
    }

    fn cast(
        &self,
        resolver: &IntersectionResolver,
        pose: &CameraPose,
        options: &RayOptions,
        stats: &mut LocateStats,
    ) -> Result<Option<facade_geo::IntersectionResult>> {
        let ray = project_ray(pose, options)?.reproject(Frame::Planar);
        Ok(resolver.resolve(&ray, &mut stats.intersections)?)
    }
}

/// A located label: where on the ground it points.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatedLabel {
    pub label_id: String,
    pub image_id: String,
    pub point: GeoPoint,
}

impl LocatedLabel {
    /// GeoJSON-style record with `[lon, lat]` coordinates.
    pub fn to_json(&self) -> Value {
        json!({
            "label_id": self.label_id,
            "image_id": self.image_id,
            "geometry": {
                "type": "Point",
                "coordinates": [self.point.lon, self.point.lat]
            }
        })
    }
}

/// Locates single labels by id, wherever they are stored.
pub struct LabelLocator {
    store: Arc<dyn DocumentStore>,
    pipeline: LocatePipeline,
}

impl LabelLocator {
    pub fn new(store: Arc<dyn DocumentStore>, pipeline: LocatePipeline) -> Self {
        Self { store, pipeline }
    }

    /// Ground point of the label with `label_id`.
    pub fn locate(&self, label_id: &str) -> Result<LocatedLabel> {
        let doc = self
            .store
            .find_image_by_label(label_id)?
            .ok_or_else(|| ResolverError::NotFound(format!("label {label_id}")))?;
        let image_id = doc.image_id.clone().unwrap_or_default();
        let label = doc
            .find_label(label_id)
            .ok_or_else(|| ResolverError::NotFound(format!("label {label_id}")))?;

        let camera = doc.camera_location()?;
        let pose = label.camera_pose(camera, self.pipeline.fallback_zoom())?;
        let resolver = self.pipeline.resolver_near(camera)?;

        let mut stats = LocateStats::default();
        let fix = self.pipeline.intersect(&resolver, &pose, label_id, &mut stats)?;

        Ok(LocatedLabel {
            label_id: label_id.to_string(),
            image_id,
            point: fix.point,
        })
    }
}
