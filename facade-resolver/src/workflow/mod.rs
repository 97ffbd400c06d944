//! Label resolution workflow.
//!
//! One run per image:
//!
//! ```text
//!   PENDING_LABELS ──(labels present)──► LABELS_READY ──► RESOLVING ──► DONE
//!         │
//!         └──(attempts exhausted)──► ABORTED
//! ```
//!
//! Labels of the first label group are resolved one after another. Each
//! resolved label gets its own store write; a failed write does not stop
//! the others. The first label (by position) with an address match supplies
//! the image's promoted address.

mod state;

pub use state::{RunSummary, WorkflowState};

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use facade_geo::{GeoPoint, IntersectionResolver};
use serde_json::{Value, json};

use crate::address_cache::AddressIndexCache;
use crate::config::PollingConfig;
use crate::document::{
    ImageDocument, Label, address_value, exact_coordinates_value, label_field_path,
};
use crate::error::{ResolverError, Result};
use crate::locate::LocatePipeline;
use crate::store::{DocumentStore, FieldUpdate};

/// Result of resolving one label, waiting to be written.
#[derive(Clone, Debug)]
struct StagedLabel {
    index: usize,
    point: GeoPoint,
    /// `None` when the lookup failed; the stored field is left untouched
    address: Option<Value>,
    address_text: Option<String>,
}

impl StagedLabel {
    fn updates(&self) -> Vec<FieldUpdate> {
        let mut updates = vec![FieldUpdate::set(
            label_field_path(self.index, "exactCoordinates"),
            exact_coordinates_value(self.point),
        )];
        if let Some(address) = &self.address {
            updates.push(FieldUpdate::set(
                label_field_path(self.index, "address"),
                address.clone(),
            ));
        }
        updates
    }
}

/// Footprints around the camera, fetched on first need.
enum Footprints {
    NotFetched,
    Ready(IntersectionResolver),
    Unavailable,
}

/// Resolves every label of an image and writes the results back.
pub struct LabelResolutionWorkflow {
    store: Arc<dyn DocumentStore>,
    pipeline: LocatePipeline,
    addresses: Arc<AddressIndexCache>,
    polling: PollingConfig,
}

impl LabelResolutionWorkflow {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        pipeline: LocatePipeline,
        addresses: Arc<AddressIndexCache>,
        polling: PollingConfig,
    ) -> Self {
        Self {
            store,
            pipeline,
            addresses,
            polling,
        }
    }

    /// Run the workflow for one image. Never fails: problems are logged and
    /// show up in the summary.
    pub fn run(&self, image_id: &str) -> RunSummary {
        let mut summary = RunSummary::new(image_id);

        let doc = match self.wait_for_labels(image_id, &mut summary) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("[{image_id}] {e}");
                summary.transition(WorkflowState::Aborted);
                return summary;
            }
        };
        summary.transition(WorkflowState::LabelsReady);

        summary.transition(WorkflowState::Resolving);
        let staged = self.resolve_labels(&doc, &mut summary);
        self.apply(image_id, &staged, &mut summary);

        summary.transition(WorkflowState::Done);
        log::info!("{summary}");
        summary
    }

    /// Read the image until its first label group is non-empty.
    fn wait_for_labels(&self, image_id: &str, summary: &mut RunSummary) -> Result<ImageDocument> {
        let max_attempts = self.polling.max_attempts;
        let delay = Duration::from_millis(self.polling.delay_ms);

        for attempt in 1..=max_attempts {
            summary.poll_attempts = attempt;
            match self.store.find_image(image_id) {
                Ok(Some(doc)) if doc.has_labels() => {
                    log::info!("[{image_id}] found labels after {attempt} attempt(s)");
                    return Ok(doc);
                }
                Ok(Some(_)) => log::debug!("[{image_id}] attempt {attempt}: no labels yet"),
                Ok(None) => log::debug!("[{image_id}] attempt {attempt}: document not found"),
                Err(e) => log::warn!("[{image_id}] attempt {attempt}: read failed: {e}"),
            }
            if attempt < max_attempts {
                thread::sleep(delay);
            }
        }

        Err(ResolverError::RetryExhausted {
            what: format!("labels for image {image_id}"),
            attempts: max_attempts,
        })
    }

    fn resolve_labels(&self, doc: &ImageDocument, summary: &mut RunSummary) -> Vec<StagedLabel> {
        let camera = match doc.camera_location() {
            Ok(camera) => Some(camera),
            Err(e) => {
                log::warn!("[{}] {e}", summary.image_id);
                None
            }
        };

        let mut footprints = Footprints::NotFetched;
        let mut staged = Vec::new();

        for (index, label) in doc.first_group_labels().iter().enumerate() {
            summary.labels_seen += 1;
            match self.resolve_label(index, label, camera, &mut footprints, summary) {
                Ok(label) => {
                    summary.labels_resolved += 1;
                    if label.address_text.is_some() {
                        summary.addresses_matched += 1;
                    }
                    staged.push(label);
                }
                Err(e) => {
                    summary.labels_skipped += 1;
                    log::warn!(
                        "[{}] skipping label {index} ({}): {e}",
                        summary.image_id,
                        e.code()
                    );
                }
            }
        }

        summary.promoted_address = staged.iter().find_map(|s| s.address_text.clone());
        staged
    }

    fn resolve_label(
        &self,
        index: usize,
        label: &Label,
        camera: Option<GeoPoint>,
        footprints: &mut Footprints,
        summary: &mut RunSummary,
    ) -> Result<StagedLabel> {
        let label_id = label
            .id()
            .ok_or_else(|| ResolverError::MissingAttribute("label_id".to_string()))?;
        let camera = camera.ok_or_else(|| ResolverError::MissingAttribute("location".to_string()))?;
        let pose = label.camera_pose(camera, self.pipeline.fallback_zoom())?;

        if let Footprints::NotFetched = footprints {
            *footprints = match self.pipeline.resolver_near(camera) {
                Ok(resolver) => Footprints::Ready(resolver),
                Err(e) => {
                    log::warn!("[{}] {e}", summary.image_id);
                    Footprints::Unavailable
                }
            };
        }
        let Footprints::Ready(resolver) = footprints else {
            return Err(ResolverError::NoFootprints(format!("image {}", summary.image_id)));
        };

        let fix = self
            .pipeline
            .intersect(resolver, &pose, label_id, &mut summary.locate)?;

        let (address, address_text) = match self.addresses.nearest_address(fix.point) {
            Ok(m) => (Some(address_value(Some(&m))?), Some(m.address)),
            Err(ResolverError::NoAddressMatch) => {
                log::debug!("[{}] label {label_id}: no address in range", summary.image_id);
                (Some(address_value(None)?), None)
            }
            Err(e) => {
                log::warn!("[{}] label {label_id}: address lookup failed: {e}", summary.image_id);
                (None, None)
            }
        };

        Ok(StagedLabel {
            index,
            point: fix.point,
            address,
            address_text,
        })
    }

    /// Write staged labels, then the promoted address. Writes are
    /// independent of each other.
    fn apply(&self, image_id: &str, staged: &[StagedLabel], summary: &mut RunSummary) {
        for label in staged {
            if let Err(e) = self.store.set_fields(image_id, &label.updates()) {
                summary.writes_failed += 1;
                log::warn!("[{image_id}] write for label {} failed: {e}", label.index);
            }
        }

        if let Some(address) = &summary.promoted_address {
            let update = FieldUpdate::set("address", json!(address));
            if let Err(e) = self.store.set_fields(image_id, &[update]) {
                summary.writes_failed += 1;
                log::warn!("[{image_id}] address write failed: {e}");
            }
        }
    }
}
