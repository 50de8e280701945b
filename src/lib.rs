//! Media acquisition - camera, microphone, screen and still-image streams.
//!
//! This is the main library crate. It turns constraint trees into local
//! media streams: authorization, device selection, capturer lifecycle and
//! all-or-nothing track creation.

pub mod authorization;
pub mod capture;
pub mod commands;
pub mod constraints;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{AcquisitionConfig, AcquisitionEvent, AcquisitionOrchestrator, MediaServices};
pub use pipeline::StreamResult;
pub use utils::{AcquisitionError, AcquisitionResult, ErrorResponse};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging
///
/// Honors `RUST_LOG`, falling back to `media_acquisition=debug`. Safe to call
/// more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_acquisition=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Starting media acquisition v{}", env!("CARGO_PKG_VERSION"));
    }
}
