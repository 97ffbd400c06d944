//! Process-wide nearest-address index.
//!
//! Built at most once from the store's address records and shared by every
//! workflow run. The first caller builds it under the lock; concurrent
//! callers wait and then share the same handle. A failed load is not cached
//! so a later call can retry.

use std::sync::Arc;

use facade_geo::{AddressMatch, GeoPoint, NearestAddressIndex};
use parking_lot::Mutex;

use crate::error::{ResolverError, Result};
use crate::store::DocumentStore;

/// Lazily built, never refreshed address index.
pub struct AddressIndexCache {
    store: Arc<dyn DocumentStore>,
    index: Mutex<Option<Arc<NearestAddressIndex>>>,
}

impl AddressIndexCache {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            index: Mutex::new(None),
        }
    }

    /// The shared index, building it on first use.
    pub fn get(&self) -> Result<Arc<NearestAddressIndex>> {
        let mut slot = self.index.lock();
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }

        let records = self.store.address_records()?;
        let index = Arc::new(NearestAddressIndex::build(records));
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Build the index now rather than on the first query.
    pub fn warm(&self) -> Result<usize> {
        Ok(self.get()?.len())
    }

    /// Whether the index has been built.
    pub fn is_built(&self) -> bool {
        self.index.lock().is_some()
    }

    /// Nearest address within range of `location`.
    ///
    /// # Errors
    /// `NoAddressMatch` when nothing is close enough or the index is empty.
    pub fn nearest_address(&self, location: GeoPoint) -> Result<AddressMatch> {
        self.get()?
            .query(location)
            .ok_or(ResolverError::NoAddressMatch)
    }
}
