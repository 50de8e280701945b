//! Media acquisition commands

use crate::capture::CameraInfo;
use crate::orchestrator::{AcquisitionConfig, AcquisitionEvent, AcquisitionOrchestrator, MediaServices};
use crate::pipeline::{LocalMediaStore, StreamResult};
use crate::registry::{CapturerInfo, CapturerRegistry};
use crate::utils::ErrorResponse;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Application state for media acquisition
#[derive(Clone)]
pub struct MediaState {
    pub orchestrator: Arc<AcquisitionOrchestrator>,
}

impl MediaState {
    pub fn new(config: AcquisitionConfig, services: MediaServices) -> Self {
        let orchestrator = AcquisitionOrchestrator::new(
            config,
            services,
            Arc::new(CapturerRegistry::new()),
            Arc::new(LocalMediaStore::new()),
        );
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Build state from a JSON config file
    pub fn from_config_file(path: &Path, services: MediaServices) -> Result<Self, ErrorResponse> {
        let config = AcquisitionConfig::from_json_file(path)?;
        Ok(Self::new(config, services))
    }

    pub fn events(&self) -> broadcast::Receiver<AcquisitionEvent> {
        self.orchestrator.subscribe()
    }
}

/// Acquire a stream for a constraint tree
pub async fn get_user_media(state: &MediaState, constraints: Value) -> Result<StreamResult, ErrorResponse> {
    tracing::info!("get_user_media: {}", constraints);
    state
        .orchestrator
        .acquire_media(&constraints)
        .await
        .map_err(|e| {
            tracing::warn!("get_user_media failed: {}", e);
            e.into()
        })
}

/// Acquire a still-image video track
pub async fn get_image_media(state: &MediaState) -> Result<StreamResult, ErrorResponse> {
    state.orchestrator.acquire_image_media().map_err(Into::into)
}

/// Stop the capturer behind a track
pub async fn release_capturer(state: &MediaState, track_id: String) -> Result<(), ErrorResponse> {
    state.orchestrator.release_capturer(&track_id);
    Ok(())
}

/// Flip the camera behind a track
pub async fn switch_camera(state: &MediaState, track_id: String) -> Result<(), ErrorResponse> {
    state.orchestrator.switch_camera(&track_id);
    Ok(())
}

/// Push a PNG frame to a still-image track
pub async fn put_still_image(state: &MediaState, track_id: String, frame: Vec<u8>) -> Result<(), ErrorResponse> {
    state.orchestrator.push_still_image_frame(&track_id, &frame);
    Ok(())
}

/// Release a stream; returns whether it existed
pub async fn release_stream(state: &MediaState, stream_id: String) -> Result<bool, ErrorResponse> {
    Ok(state.orchestrator.release_stream(&stream_id))
}

/// Get list of available cameras
pub async fn get_cameras(state: &MediaState) -> Result<Vec<CameraInfo>, ErrorResponse> {
    Ok(state.orchestrator.cameras())
}

/// Describe every live capturer
pub async fn get_capturers(state: &MediaState) -> Result<Vec<CapturerInfo>, ErrorResponse> {
    Ok(state.orchestrator.registry().snapshot())
}
