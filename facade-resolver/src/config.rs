//! Configuration loading for facade-resolver

use crate::error::{ResolverError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    pub store: StoreConfig,
    pub footprints: FootprintsConfig,
    pub projection: ProjectionConfig,
    pub polling: PollingConfig,
    pub workers: WorkersConfig,
    pub logging: LoggingConfig,
}

/// Document store location
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one `<collection>.json` file per collection
    pub path: PathBuf,

    /// Collection of panorama image documents (default: collect_panorama)
    pub images_collection: String,

    /// Collection of address point records (default: address-points)
    pub addresses_collection: String,
}

/// Building footprint source
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FootprintsConfig {
    /// GeoJSON FeatureCollection of building polygons
    pub path: PathBuf,

    /// Search radius around the camera in meters (default: 100)
    pub search_radius_m: f64,
}

/// Ray projection parameters
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Camera height above the ground in meters (default: 2.5)
    pub camera_height_m: f64,

    /// Zoom used when a label has none (default: 1)
    pub fallback_zoom: i32,
}

/// Label polling
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Reads before giving up (default: 5)
    pub max_attempts: u32,

    /// Delay between reads in milliseconds (default: 1000)
    pub delay_ms: u64,
}

/// Background worker pool
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Number of worker threads (default: 2)
    pub count: usize,
}

/// Logging
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (default: info)
    pub level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            images_collection: "collect_panorama".to_string(),
            addresses_collection: "address-points".to_string(),
        }
    }
}

impl Default for FootprintsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/buildings.geojson"),
            search_radius_m: 100.0,
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            camera_height_m: 2.5,
            fallback_zoom: 1,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_ms: 1000,
        }
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { count: 2 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl FacadeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ResolverError::Config(format!("Failed to read config file: {}", e)))?;
        Self::parse(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            Self::load(path)
        } else {
            log::info!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: FacadeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ResolverError::Config(format!("{name} must be positive, got {v}")))
            }
        };
        positive("footprints.search_radius_m", self.footprints.search_radius_m)?;
        positive("projection.camera_height_m", self.projection.camera_height_m)?;

        if self.polling.max_attempts == 0 {
            return Err(ResolverError::Config(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.workers.count == 0 {
            return Err(ResolverError::Config(
                "workers.count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
