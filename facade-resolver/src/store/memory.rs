//! In-memory document store.

use facade_geo::AddressPoint;
use parking_lot::RwLock;
use serde_json::Value;

use super::{
    DocumentStore, FieldUpdate, address_records_in, apply_updates, find_image_by_label_in,
    find_image_in, position_of_image,
};
use crate::document::ImageDocument;
use crate::error::Result;

/// Store backed by two in-memory JSON collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    images: RwLock<Vec<Value>>,
    addresses: RwLock<Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with raw image documents and address records.
    pub fn with_documents(images: Vec<Value>, addresses: Vec<Value>) -> Self {
        Self {
            images: RwLock::new(images),
            addresses: RwLock::new(addresses),
        }
    }

    /// Add an image document, replacing one with the same `image_id`.
    pub fn upsert_image(&self, doc: Value) {
        let mut images = self.images.write();
        let existing = doc
            .get("image_id")
            .and_then(crate::document::id_string)
            .and_then(|id| position_of_image(&images, &id));
        match existing {
            Some(i) => images[i] = doc,
            None => images.push(doc),
        }
    }

    pub fn insert_address(&self, record: Value) {
        self.addresses.write().push(record);
    }

    /// Raw copy of an image document.
    pub fn image_value(&self, image_id: &str) -> Option<Value> {
        let images = self.images.read();
        position_of_image(&images, image_id).map(|i| images[i].clone())
    }
}

impl DocumentStore for MemoryStore {
    fn find_image(&self, image_id: &str) -> Result<Option<ImageDocument>> {
        find_image_in(&self.images.read(), image_id)
    }

    fn find_image_by_label(&self, label_id: &str) -> Result<Option<ImageDocument>> {
        find_image_by_label_in(&self.images.read(), label_id)
    }

    fn set_fields(&self, image_id: &str, updates: &[FieldUpdate]) -> Result<()> {
        apply_updates(&mut self.images.write(), image_id, updates)
    }

    fn address_records(&self) -> Result<Vec<AddressPoint>> {
        Ok(address_records_in(&self.addresses.read()))
    }
}
