//! Acquisition orchestrator
//!
//! Sequences authorization, device selection and track creation for the three
//! request flows (camera/microphone, screen, still image) and owns the
//! out-of-band event channel.

use super::state::{AcquisitionConfig, AcquisitionFlow, AcquisitionState};
use crate::authorization::{
    required_permissions, AuthorizationCoordinator, AuthorizationService, Permission,
    PermissionSet, ScreenConsent, ScreenConsentService,
};
use crate::capture::{CameraBackends, CameraInfo, CaptureFormat, Capturer, DeviceSelector, ImageCapturer};
use crate::constraints::{AcquisitionRequest, MediaConstraints, VideoSourceKind};
use crate::pipeline::{LocalMediaStore, MediaPipeline, MediaStream, MediaTrack, StreamResult};
use crate::registry::CapturerRegistry;
use crate::utils::{AcquisitionError, AcquisitionResult};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

/// Events reported outside of any call's result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AcquisitionEvent {
    /// A stream was handed to a caller
    #[serde(rename_all = "camelCase")]
    StreamAcquired { stream_id: String },
    /// A track stopped producing media on its own (e.g. consent revoked)
    #[serde(rename_all = "camelCase")]
    TrackEnded { track_id: String, reason: String },
    /// A stream and its capturers were released
    #[serde(rename_all = "camelCase")]
    StreamReleased { stream_id: String },
}

/// External collaborators the orchestrator drives
#[derive(Clone)]
pub struct MediaServices {
    pub authorization: Arc<dyn AuthorizationService>,
    pub screen_consent: Arc<dyn ScreenConsentService>,
    pub cameras: CameraBackends,
    pub pipeline: Arc<dyn MediaPipeline>,
}

/// Tracks and capturers built so far in one call
///
/// Either committed into a stream or rolled back as a whole.
struct PendingTracks<'a> {
    registry: &'a CapturerRegistry,
    stream: MediaStream,
    registered: Vec<String>,
}

impl<'a> PendingTracks<'a> {
    fn new(registry: &'a CapturerRegistry) -> Self {
        Self {
            registry,
            stream: MediaStream::new(Uuid::new_v4().to_string()),
            registered: Vec::new(),
        }
    }

    fn push_track(&mut self, track: Arc<dyn MediaTrack>) {
        self.stream.add_track(track);
    }

    fn registered(&mut self, track_id: String) {
        self.registered.push(track_id);
    }

    /// Dispose every track and unregister every capturer from this call
    fn roll_back(self) {
        for track in self.stream.tracks() {
            track.dispose();
        }
        for track_id in &self.registered {
            self.registry.remove(track_id);
        }
        tracing::debug!(
            "Rolled back {} tracks and {} capturers",
            self.stream.tracks().len(),
            self.registered.len()
        );
    }

    fn commit(self) -> MediaStream {
        self.stream
    }
}

/// Media acquisition orchestrator
pub struct AcquisitionOrchestrator {
    config: AcquisitionConfig,
    authorization: AuthorizationCoordinator,
    screen_consent: Arc<dyn ScreenConsentService>,
    selector: DeviceSelector,
    pipeline: Arc<dyn MediaPipeline>,
    registry: Arc<CapturerRegistry>,
    store: Arc<LocalMediaStore>,
    event_tx: broadcast::Sender<AcquisitionEvent>,
}

impl AcquisitionOrchestrator {
    /// Create an orchestrator sharing `registry` and `store` with the caller
    pub fn new(
        config: AcquisitionConfig,
        services: MediaServices,
        registry: Arc<CapturerRegistry>,
        store: Arc<LocalMediaStore>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            config,
            authorization: AuthorizationCoordinator::new(services.authorization),
            screen_consent: services.screen_consent,
            selector: DeviceSelector::new(services.cameras),
            pipeline: services.pipeline,
            registry,
            store,
            event_tx,
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<CapturerRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<LocalMediaStore> {
        &self.store
    }

    /// Subscribe to out-of-band events
    pub fn subscribe(&self) -> broadcast::Receiver<AcquisitionEvent> {
        self.event_tx.subscribe()
    }

    /// Cameras visible through the backend chosen for this platform
    pub fn cameras(&self) -> Vec<CameraInfo> {
        self.selector.enumerator().cameras()
    }

    /// Acquire a stream for a raw constraint tree
    ///
    /// The flow is picked from `video.mandatory.chromeMediaSource`. Resolves
    /// exactly once; on failure nothing stays registered.
    pub async fn acquire_media(&self, constraints: &Value) -> AcquisitionResult<StreamResult> {
        let request = AcquisitionRequest::parse(constraints);

        match request.video_source() {
            VideoSourceKind::Screen => self.acquire_screen_media(&request).await,
            VideoSourceKind::StillImage => {
                let format = request.capture_format(self.config.default_format);
                self.image_media(format)
            }
            VideoSourceKind::Camera => self.acquire_user_media(&request).await,
        }
    }

    /// Acquire a single still-image video track
    ///
    /// No device and no permission are involved.
    pub fn acquire_image_media(&self) -> AcquisitionResult<StreamResult> {
        self.image_media(self.config.default_format)
    }

    /// Stop and forget the capturer behind a track; idempotent
    pub fn release_capturer(&self, track_id: &str) {
        self.registry.remove(track_id);
    }

    /// Flip the camera behind a track, if it can
    pub fn switch_camera(&self, track_id: &str) {
        self.registry.switch_facing(track_id);
    }

    /// Feed a PNG frame to a still-image track
    pub fn push_still_image_frame(&self, track_id: &str, frame: &[u8]) {
        self.registry.put_still_image(track_id, frame);
    }

    /// Dispose a stream's tracks and release their capturers
    ///
    /// Returns `false` if the stream is unknown.
    pub fn release_stream(&self, stream_id: &str) -> bool {
        let Some(stream) = self.store.remove_stream(stream_id) else {
            return false;
        };

        for track in stream.tracks() {
            self.registry.remove(track.id());
            track.dispose();
        }

        tracing::info!("Released stream {}", stream_id);
        let _ = self.event_tx.send(AcquisitionEvent::StreamReleased {
            stream_id: stream_id.to_string(),
        });
        true
    }

    /// Stop every registered capturer
    pub fn shutdown(&self) {
        tracing::info!("Stopping {} capturers", self.registry.len());
        self.registry.clear();
    }

    async fn acquire_user_media(&self, request: &AcquisitionRequest) -> AcquisitionResult<StreamResult> {
        let mut flow = AcquisitionFlow::new("user media");

        let required = required_permissions(request);
        if required.is_empty() {
            flow.advance(AcquisitionState::InvalidRequest);
            return Err(AcquisitionError::InvalidRequest(
                "no media types requested".to_string(),
            ));
        }

        flow.advance(AcquisitionState::RequiresPermission);
        let granted = match self.authorization.resolve(&required).await {
            Ok(granted) => granted,
            Err(e) => {
                flow.advance(AcquisitionState::Denied);
                return Err(e);
            }
        };
        flow.advance(AcquisitionState::Granted);

        flow.advance(AcquisitionState::Creating);
        let mut pending = PendingTracks::new(&self.registry);

        let mut created = Ok(());
        if granted.contains(Permission::Microphone) {
            created = self
                .create_audio_track(request, &mut pending)
                .context("audio");
        }
        if created.is_ok() && granted.contains(Permission::Camera) {
            created = self
                .create_camera_track(request, &mut pending)
                .context("video");
        }

        if let Err(e) = created {
            return Err(self.roll_back(flow, pending, e));
        }

        Ok(self.commit(flow, pending))
    }

    async fn acquire_screen_media(&self, request: &AcquisitionRequest) -> AcquisitionResult<StreamResult> {
        let mut flow = AcquisitionFlow::new("screen");

        if request.audio().is_requested() {
            tracing::debug!("Audio is not captured alongside the screen; ignoring it");
        }

        flow.advance(AcquisitionState::RequiresPermission);
        let (token, revoked) = match self.screen_consent.request_consent().await {
            ScreenConsent::Granted { token, revoked } => (token, revoked),
            ScreenConsent::Denied => {
                tracing::info!("User didn't give permission to capture the screen");
                flow.advance(AcquisitionState::Denied);
                let denied: PermissionSet = [Permission::Screen].into_iter().collect();
                return Err(AcquisitionError::PermissionDenied { denied });
            }
        };
        flow.advance(AcquisitionState::Granted);

        flow.advance(AcquisitionState::Creating);
        let mut pending = PendingTracks::new(&self.registry);
        let format = request.capture_format(self.config.default_format);

        let created = self
            .pipeline
            .create_screen_capturer(&token)
            .context("failed to create screen capturer")
            .and_then(|capturer| self.start_video_track(capturer, format, &mut pending));

        let track_id = match created {
            Ok(track_id) => track_id,
            Err(e) => return Err(self.roll_back(flow, pending, e.context("video"))),
        };

        let result = self.commit(flow, pending);
        if let Some(revoked) = revoked {
            self.watch_revocation(track_id, revoked);
        }
        Ok(result)
    }

    fn image_media(&self, format: CaptureFormat) -> AcquisitionResult<StreamResult> {
        let mut flow = AcquisitionFlow::new("image");
        flow.advance(AcquisitionState::Creating);

        let mut pending = PendingTracks::new(&self.registry);
        let capturer: Arc<dyn Capturer> = Arc::new(ImageCapturer::new());

        if let Err(e) = self.start_video_track(capturer, format, &mut pending) {
            return Err(self.roll_back(flow, pending, e.context("video")));
        }

        Ok(self.commit(flow, pending))
    }

    fn create_audio_track(
        &self,
        request: &AcquisitionRequest,
        pending: &mut PendingTracks<'_>,
    ) -> anyhow::Result<()> {
        let constraints = match request.audio().details() {
            Some(map) => MediaConstraints::parse(map),
            None => MediaConstraints::enabled_options(self.config.default_audio_options.iter().cloned()),
        };
        tracing::info!("getUserMedia(audio): {}", constraints);

        let source = self
            .pipeline
            .create_audio_source(&constraints)
            .context("failed to create audio source")?;

        let track_id = Uuid::new_v4().to_string();
        match self.pipeline.create_audio_track(&track_id, source.clone()) {
            Ok(track) => {
                pending.push_track(track);
                Ok(())
            }
            Err(e) => {
                source.dispose();
                Err(e.context("failed to create audio track"))
            }
        }
    }

    fn create_camera_track(
        &self,
        request: &AcquisitionRequest,
        pending: &mut PendingTracks<'_>,
    ) -> anyhow::Result<()> {
        let capturer = self
            .selector
            .select(request.prefer_front(), request.source_id())
            .ok_or_else(|| {
                let facing = if request.prefer_front() { "front" } else { "back" };
                anyhow!("no {} camera could be opened", facing)
            })?;

        let format = request.capture_format(self.config.default_format);
        self.start_video_track(capturer, format, pending)?;
        Ok(())
    }

    /// Wire a capturer into a source and a video track
    ///
    /// The device is started at `format` and the same geometry is then
    /// re-asserted on the source, since devices may settle on a nearby mode.
    /// Returns the track id, which is also the registry key.
    fn start_video_track(
        &self,
        capturer: Arc<dyn Capturer>,
        format: CaptureFormat,
        pending: &mut PendingTracks<'_>,
    ) -> anyhow::Result<String> {
        let source = self
            .pipeline
            .create_video_source(capturer.clone())
            .context("failed to create video source")?;

        if let Err(e) = capturer.start_capture(format) {
            source.dispose();
            return Err(e.context(format!("failed to start capture at {}", format)));
        }

        let track_id = Uuid::new_v4().to_string();
        if let Err(e) = self.registry.create(&track_id, capturer.clone()) {
            if let Err(stop_err) = capturer.stop_capture() {
                tracing::warn!("Failed to stop unregistered capturer: {}", stop_err);
            }
            source.dispose();
            return Err(e.into());
        }
        pending.registered(track_id.clone());

        tracing::debug!("changeCaptureFormat: {}", format);
        source.adapt_output_format(format);

        match self.pipeline.create_video_track(&track_id, source.clone()) {
            Ok(track) => {
                pending.push_track(track);
                Ok(track_id)
            }
            Err(e) => {
                source.dispose();
                Err(e.context("failed to create video track"))
            }
        }
    }

    fn roll_back(
        &self,
        mut flow: AcquisitionFlow,
        pending: PendingTracks<'_>,
        error: anyhow::Error,
    ) -> AcquisitionError {
        tracing::warn!("Track creation failed, rolling back: {:#}", error);
        pending.roll_back();
        flow.advance(AcquisitionState::RolledBack);
        AcquisitionError::TrackCreationFailed(format!("{:#}", error))
    }

    fn commit(&self, mut flow: AcquisitionFlow, pending: PendingTracks<'_>) -> StreamResult {
        let stream = pending.commit();
        let result = stream.to_result();
        self.store.insert_stream(stream);
        flow.advance(AcquisitionState::Committed);

        tracing::info!(
            "Acquired stream {} with {} tracks",
            result.stream_id,
            result.tracks.len()
        );
        let _ = self.event_tx.send(AcquisitionEvent::StreamAcquired {
            stream_id: result.stream_id.clone(),
        });
        result
    }

    /// Report a revoked screen consent as an ended track
    ///
    /// A dropped notifier means the consent can no longer be revoked.
    fn watch_revocation(&self, track_id: String, revoked: oneshot::Receiver<()>) {
        let registry = self.registry.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            if revoked.await.is_err() {
                return;
            }

            tracing::error!("User revoked permission to capture the screen");
            registry.remove(&track_id);
            let _ = event_tx.send(AcquisitionEvent::TrackEnded {
                track_id,
                reason: "screen capture permission revoked".to_string(),
            });
        });
    }
}
