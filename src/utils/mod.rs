//! Shared utilities

pub mod error;

pub use error::{AcquisitionError, AcquisitionResult, ConfigError, ErrorResponse};
