//! Startup wiring: store, footprints, address index, workflow.

use std::sync::Arc;

use crate::address_cache::AddressIndexCache;
use crate::config::FacadeConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::footprints::{FootprintProvider, GeoJsonFootprints};
use crate::locate::{LabelLocator, LocatePipeline};
use crate::store::{DocumentStore, JsonDirStore};
use crate::workflow::LabelResolutionWorkflow;

/// Everything a running resolver needs.
pub struct App {
    pub config: FacadeConfig,
    pub workflow: Arc<LabelResolutionWorkflow>,
    pub locator: LabelLocator,
    pub addresses: Arc<AddressIndexCache>,
}

impl App {
    /// Open the store and footprint file named by `config`.
    ///
    /// # Errors
    /// Fatal `Store` / `Config` / `Io` errors when either cannot be opened.
    pub fn bootstrap(config: FacadeConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(JsonDirStore::open(
            &config.store.path,
            &config.store.images_collection,
            &config.store.addresses_collection,
        )?);
        let footprints: Arc<dyn FootprintProvider> =
            Arc::new(GeoJsonFootprints::load(&config.footprints.path)?);
        Ok(Self::with_parts(config, store, footprints))
    }

    /// Assemble from already opened collaborators.
    pub fn with_parts(
        config: FacadeConfig,
        store: Arc<dyn DocumentStore>,
        footprints: Arc<dyn FootprintProvider>,
    ) -> Self {
        let pipeline = LocatePipeline::new(
            footprints,
            config.projection,
            config.footprints.search_radius_m,
        );
        let addresses = Arc::new(AddressIndexCache::new(Arc::clone(&store)));
        let workflow = Arc::new(LabelResolutionWorkflow::new(
            Arc::clone(&store),
            pipeline.clone(),
            Arc::clone(&addresses),
            config.polling,
        ));
        let locator = LabelLocator::new(store, pipeline);

        Self {
            config,
            workflow,
            locator,
            addresses,
        }
    }

    /// Build the address index ahead of the first request.
    pub fn warm(&self) -> Result<()> {
        let count = self.addresses.warm()?;
        if count == 0 {
            log::warn!("Address index is empty; no addresses will be matched");
        }
        Ok(())
    }

    /// Start the background worker pool.
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        Dispatcher::start(Arc::clone(&self.workflow), self.config.workers.count)
    }
}
