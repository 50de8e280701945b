//! Media acquisition
//!
//! This module implements the acquisition flows:
//! - AcquisitionOrchestrator sequencing authorization, selection and creation
//! - AcquisitionState machine tracked per call
//! - AcquisitionConfig defaults (geometry, audio processing options)

pub mod coordinator;
pub mod state;


pub use coordinator::{AcquisitionEvent, AcquisitionOrchestrator, MediaServices};
pub use state::{AcquisitionConfig, AcquisitionFlow, AcquisitionState};
