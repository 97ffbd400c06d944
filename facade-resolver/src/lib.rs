//! # Facade-Resolver
//!
//! Background service that pins panorama labels to building facades and
//! street addresses.
//!
//! Given an image id, the resolver waits for the image's labels to appear in
//! the document store, casts a ground ray for each label from the camera
//! pose, intersects it with nearby building footprints, looks up the nearest
//! address to the hit, and writes both back onto the label. The first label
//! with an address also sets the image's address.
//!
//! ## Architecture
//!
//! - [`workflow`]: Per-image state machine (poll, resolve, write)
//! - [`locate`]: Ray → footprint → ground point pipeline, single-label lookup
//! - [`address_cache`]: Process-wide nearest-address index
//! - [`store`]: Document store contract, in-memory and JSON-directory stores
//! - [`footprints`]: Footprint provider contract, static and GeoJSON sources
//! - [`dispatch`]: Fire-and-forget worker pool
//! - [`document`]: Stored document shapes
//! - [`config`]: TOML configuration
//! - [`app`]: Startup wiring

pub mod address_cache;
pub mod app;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod footprints;
pub mod locate;
pub mod store;
pub mod workflow;

pub use address_cache::AddressIndexCache;
pub use app::App;
pub use config::FacadeConfig;
pub use dispatch::Dispatcher;
pub use error::{ResolverError, Result};
pub use footprints::{FootprintProvider, GeoJsonFootprints, StaticFootprints};
pub use locate::{LabelLocator, LocatePipeline, LocatedLabel};
pub use store::{DocumentStore, FieldUpdate, JsonDirStore, MemoryStore};
pub use workflow::{LabelResolutionWorkflow, RunSummary, WorkflowState};
