//! Directory-backed JSON document store.
//!
//! Each collection is one file `<dir>/<collection>.json` holding a JSON
//! array of documents. Collections are re-read on every call so documents
//! written by other processes become visible, which is what label polling
//! relies on. Writes go to a uniquely named temporary file in the same
//! directory that is then renamed over the collection file.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use facade_geo::AddressPoint;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::NamedTempFile;

use super::{
    DocumentStore, FieldUpdate, address_records_in, apply_updates, find_image_by_label_in,
    find_image_in,
};
use crate::document::ImageDocument;
use crate::error::{ResolverError, Result};

/// Store over a directory of JSON collection files.
#[derive(Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
    images_collection: String,
    addresses_collection: String,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl JsonDirStore {
    /// Open a store directory.
    ///
    /// # Errors
    /// `Store` when the directory does not exist.
    pub fn open(
        dir: impl Into<PathBuf>,
        images_collection: impl Into<String>,
        addresses_collection: impl Into<String>,
    ) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ResolverError::Store(format!(
                "store directory {} does not exist",
                dir.display()
            )));
        }
        let store = Self {
            dir,
            images_collection: images_collection.into(),
            addresses_collection: addresses_collection.into(),
            write_lock: Mutex::new(()),
        };
        log::info!(
            "Opened store at {} ({}, {})",
            store.dir.display(),
            store.images_collection,
            store.addresses_collection
        );
        Ok(store)
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    /// All documents of a collection. A missing file is an empty collection.
    fn read_collection(&self, collection: &str) -> Result<Vec<Value>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&content)? {
            Value::Array(docs) => Ok(docs),
            _ => Err(ResolverError::Store(format!(
                "{} does not hold a JSON array",
                path.display()
            ))),
        }
    }

    fn write_collection(&self, collection: &str, docs: &[Value]) -> Result<()> {
        let path = self.collection_path(collection);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(docs)?)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl DocumentStore for JsonDirStore {
    fn find_image(&self, image_id: &str) -> Result<Option<ImageDocument>> {
        find_image_in(&self.read_collection(&self.images_collection)?, image_id)
    }

    fn find_image_by_label(&self, label_id: &str) -> Result<Option<ImageDocument>> {
        find_image_by_label_in(&self.read_collection(&self.images_collection)?, label_id)
    }

    fn set_fields(&self, image_id: &str, updates: &[FieldUpdate]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut docs = self.read_collection(&self.images_collection)?;
        apply_updates(&mut docs, image_id, updates)?;
        self.write_collection(&self.images_collection, &docs)
    }

    fn address_records(&self) -> Result<Vec<AddressPoint>> {
        Ok(address_records_in(
            &self.read_collection(&self.addresses_collection)?,
        ))
    }
}
