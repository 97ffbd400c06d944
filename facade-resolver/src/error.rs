//! Error types for facade-resolver

use facade_geo::GeoError;
use thiserror::Error;

/// Resolver error type.
///
/// Everything above `Store` is per-label or per-image: it is logged and the
/// affected work is skipped. `Store`, `Config` and `Io` abort startup when
/// they surface during bootstrap.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(String),

    #[error("No usable building footprints: {0}")]
    NoFootprints(String),

    #[error("No intersection for label {0}")]
    NoIntersection(String),

    #[error("No address point within range")]
    NoAddressMatch,

    #[error("Gave up on {what} after {attempts} attempts")]
    RetryExhausted { what: String, attempts: u32 },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl ResolverError {
    /// Short stable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::NotFound(_) => "not_found",
            ResolverError::MissingAttribute(_) => "missing_attribute",
            ResolverError::NoFootprints(_) => "no_footprints",
            ResolverError::NoIntersection(_) => "no_intersection",
            ResolverError::NoAddressMatch => "no_address_match",
            ResolverError::RetryExhausted { .. } => "retry_exhausted",
            ResolverError::Store(_) => "store",
            ResolverError::Config(_) => "config",
            ResolverError::Io(_) => "io",
            ResolverError::Geo(_) => "geo",
        }
    }

    /// Store, configuration and I/O failures. Fatal when raised at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ResolverError::Store(_) | ResolverError::Config(_) | ResolverError::Io(_)
        )
    }
}

impl From<toml::de::Error> for ResolverError {
    fn from(e: toml::de::Error) -> Self {
        ResolverError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(e: serde_json::Error) -> Self {
        ResolverError::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
