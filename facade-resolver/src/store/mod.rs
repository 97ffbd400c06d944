//! Document store contract and implementations.
//!
//! The store holds two collections: panorama image documents and address
//! point records. The resolver only reads documents and issues field-level
//! `$set` updates; it never creates or deletes them.

mod json_dir;
mod memory;
mod path;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use path::{get_path, set_path};

use facade_geo::{AddressPoint, GeoPoint};
use serde_json::Value;

use crate::document::{ImageDocument, id_matches, id_string};
use crate::error::{ResolverError, Result};

/// One field update: dotted path and its new value.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Read/write access to image documents and address records.
pub trait DocumentStore: Send + Sync {
    /// Image document by `image_id`.
    fn find_image(&self, image_id: &str) -> Result<Option<ImageDocument>>;

    /// Image document holding a label with `label_id` in any label group.
    fn find_image_by_label(&self, label_id: &str) -> Result<Option<ImageDocument>>;

    /// Apply all updates to one image document. Either every update is
    /// applied or none is.
    fn set_fields(&self, image_id: &str, updates: &[FieldUpdate]) -> Result<()>;

    /// All well-formed address records.
    fn address_records(&self) -> Result<Vec<AddressPoint>>;
}

/// Position of the image document with `image_id`.
fn position_of_image(docs: &[Value], image_id: &str) -> Option<usize> {
    docs.iter()
        .position(|doc| doc.get("image_id").is_some_and(|id| id_matches(id, image_id)))
}

/// Does any label group of `doc` hold `label_id`?
fn holds_label(doc: &Value, label_id: &str) -> bool {
    let Some(groups) = doc.get("human_labels").and_then(Value::as_array) else {
        return false;
    };
    groups
        .iter()
        .filter_map(|group| group.get("labels").and_then(Value::as_array))
        .flatten()
        .any(|label| label.get("label_id").is_some_and(|id| id_matches(id, label_id)))
}

fn find_image_in(docs: &[Value], image_id: &str) -> Result<Option<ImageDocument>> {
    position_of_image(docs, image_id)
        .map(|i| ImageDocument::from_value(&docs[i]))
        .transpose()
}

fn find_image_by_label_in(docs: &[Value], label_id: &str) -> Result<Option<ImageDocument>> {
    docs.iter()
        .find(|doc| holds_label(doc, label_id))
        .map(ImageDocument::from_value)
        .transpose()
}

/// Apply `updates` to the image document in `docs`, all or nothing.
fn apply_updates(docs: &mut [Value], image_id: &str, updates: &[FieldUpdate]) -> Result<()> {
    let index = position_of_image(docs, image_id)
        .ok_or_else(|| ResolverError::NotFound(format!("image {image_id}")))?;

    let mut updated = docs[index].clone();
    for update in updates {
        set_path(&mut updated, &update.path, update.value.clone())?;
    }
    docs[index] = updated;
    Ok(())
}

/// Address point from a raw record: `{_id, geometry.coordinates: [lon, lat],
/// google_address}`. `None` when any piece is missing or malformed.
pub fn parse_address_record(record: &Value) -> Option<AddressPoint> {
    let address = record.get("google_address")?.as_str()?;
    let coords = get_path(record, "geometry.coordinates")?.as_array()?;
    let [lon, lat] = coords.as_slice() else {
        return None;
    };
    let location = GeoPoint::new(lat.as_f64()?, lon.as_f64()?);
    if !location.is_valid() {
        return None;
    }
    let id = record.get("_id").and_then(id_string).unwrap_or_default();
    Some(AddressPoint::new(id, location, address))
}

fn address_records_in(records: &[Value]) -> Vec<AddressPoint> {
    let points: Vec<AddressPoint> = records.iter().filter_map(parse_address_record).collect();
    if points.len() < records.len() {
        log::debug!(
            "Skipped {} malformed address records",
            records.len() - points.len()
        );
    }
    points
}
