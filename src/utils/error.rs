//! Error types and handling
//!
//! Common error types used across the crate.

use crate::authorization::PermissionSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a media acquisition call
///
/// Every acquisition call resolves with exactly one of these or a stream.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The request asked for no media kind at all
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// At least one required permission was not granted
    #[error("Permission denied: {denied}")]
    PermissionDenied { denied: PermissionSet },

    /// A requested track could not be built; everything created was rolled back
    #[error("Failed to create new track: {0}")]
    TrackCreationFailed(String),

    /// A capturer is already registered under this track id
    #[error("Duplicate track: {0}")]
    DuplicateTrack(String),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Error response for the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AcquisitionError> for ErrorResponse {
    fn from(error: AcquisitionError) -> Self {
        let code = match &error {
            AcquisitionError::InvalidRequest(_) => "INVALID_REQUEST",
            AcquisitionError::PermissionDenied { .. } => "PERMISSION_DENIED",
            AcquisitionError::TrackCreationFailed(_) => "TRACK_CREATION_FAILED",
            AcquisitionError::DuplicateTrack(_) => "DUPLICATE_TRACK",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<ConfigError> for ErrorResponse {
    fn from(error: ConfigError) -> Self {
        ErrorResponse {
            code: "CONFIG_ERROR".to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AcquisitionError
pub type AcquisitionResult<T> = Result<T, AcquisitionError>;
