//! Error types for facade-geo

use thiserror::Error;

use crate::core::Frame;

/// Input-validation failures raised by the geometric components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("Frame mismatch: expected {expected} geometry, got {actual}")]
    FrameMismatch { expected: Frame, actual: Frame },

    #[error("Invalid camera pose: {0}")]
    InvalidPose(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;
