//! In-memory collaborators for tests

use crate::authorization::{
    AuthorizationService, ConsentToken, Permission, PermissionGrant, PermissionSet,
    ScreenConsent, ScreenConsentService,
};
use crate::capture::{CameraEnumerator, CaptureFormat, Capturer, CapturerKind, FacingSwitch};
use crate::constraints::MediaConstraints;
use crate::pipeline::{AudioSource, MediaPipeline, MediaTrack, TrackKind, TrackState, VideoSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

pub struct FakeCapturer {
    kind: CapturerKind,
    name: String,
    fail_start: bool,
    fail_stop: bool,
    starts: Mutex<Vec<CaptureFormat>>,
    stops: AtomicUsize,
    switches: AtomicUsize,
}

impl FakeCapturer {
    fn with_kind(kind: CapturerKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            fail_start: false,
            fail_stop: false,
            starts: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            switches: AtomicUsize::new(0),
        }
    }

    pub fn camera(name: &str) -> Self {
        Self::with_kind(CapturerKind::Camera, name)
    }

    pub fn screen() -> Self {
        Self::with_kind(CapturerKind::Screen, "screen")
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn starts(&self) -> Vec<CaptureFormat> {
        self.starts.lock().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn switches(&self) -> usize {
        self.switches.load(Ordering::SeqCst)
    }
}

impl Capturer for FakeCapturer {
    fn kind(&self) -> CapturerKind {
        self.kind
    }

    fn start_capture(&self, format: CaptureFormat) -> anyhow::Result<()> {
        if self.fail_start {
            anyhow::bail!("device busy");
        }
        self.starts.lock().push(format);
        Ok(())
    }

    fn stop_capture(&self) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            anyhow::bail!("interrupted while stopping");
        }
        Ok(())
    }

    fn as_facing_switch(&self) -> Option<&dyn FacingSwitch> {
        match self.kind {
            CapturerKind::Camera => Some(self),
            _ => None,
        }
    }
}

impl FacingSwitch for FakeCapturer {
    fn switch_facing(&self) {
        self.switches.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct FakeCamera {
    name: String,
    front: bool,
}

impl FakeCamera {
    pub fn new(name: &str, front: bool) -> Self {
        Self {
            name: name.to_string(),
            front,
        }
    }
}

pub struct FakeEnumerator {
    name: String,
    supported: bool,
    cameras: Vec<FakeCamera>,
    failing: HashSet<String>,
    attempts: Mutex<Vec<String>>,
    capturers: Mutex<Vec<Arc<FakeCapturer>>>,
}

impl FakeEnumerator {
    pub fn new(cameras: Vec<FakeCamera>) -> Self {
        Self {
            name: "fake".to_string(),
            supported: true,
            cameras,
            failing: HashSet::new(),
            attempts: Mutex::new(Vec::new()),
            capturers: Mutex::new(Vec::new()),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Every device a capturer was requested for
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().clone()
    }

    /// Devices that were successfully opened
    pub fn opened(&self) -> Vec<String> {
        self.capturers
            .lock()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn capturers(&self) -> Vec<Arc<FakeCapturer>> {
        self.capturers.lock().clone()
    }
}

impl CameraEnumerator for FakeEnumerator {
    fn backend_name(&self) -> &str {
        &self.name
    }

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn device_names(&self) -> Vec<String> {
        self.cameras.iter().map(|c| c.name.clone()).collect()
    }

    fn is_front_facing(&self, name: &str) -> bool {
        self.cameras.iter().any(|c| c.name == name && c.front)
    }

    fn create_capturer(&self, name: &str) -> Option<Arc<dyn Capturer>> {
        self.attempts.lock().push(name.to_string());
        if self.failing.contains(name) {
            return None;
        }
        let capturer = Arc::new(FakeCapturer::camera(name));
        self.capturers.lock().push(capturer.clone());
        Some(capturer as Arc<dyn Capturer>)
    }
}

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    disposed: AtomicBool,
}

impl FakeTrack {
    pub fn new(id: &str, kind: TrackKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn enabled(&self) -> bool {
        true
    }

    fn ready_state(&self) -> TrackState {
        if self.is_disposed() {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeAudioSource {
    pub constraints: MediaConstraints,
}

impl AudioSource for FakeAudioSource {}

#[derive(Default)]
pub struct FakeVideoSource {
    formats: Mutex<Vec<CaptureFormat>>,
    disposed: AtomicBool,
}

impl FakeVideoSource {
    pub fn output_formats(&self) -> Vec<CaptureFormat> {
        self.formats.lock().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl VideoSource for FakeVideoSource {
    fn adapt_output_format(&self, format: CaptureFormat) {
        self.formats.lock().push(format);
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakePipeline {
    fail_audio_source: bool,
    fail_video_track: bool,
    fail_screen: bool,
    fail_screen_start: bool,
    audio_sources: Mutex<Vec<Arc<FakeAudioSource>>>,
    video_sources: Mutex<Vec<Arc<FakeVideoSource>>>,
    tracks: Mutex<Vec<Arc<FakeTrack>>>,
    screen_capturers: Mutex<Vec<Arc<FakeCapturer>>>,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_audio_source(mut self) -> Self {
        self.fail_audio_source = true;
        self
    }

    pub fn failing_video_track(mut self) -> Self {
        self.fail_video_track = true;
        self
    }

    pub fn failing_screen(mut self) -> Self {
        self.fail_screen = true;
        self
    }

    /// Screen capturers that refuse to start
    pub fn failing_screen_start(mut self) -> Self {
        self.fail_screen_start = true;
        self
    }

    pub fn audio_sources(&self) -> Vec<Arc<FakeAudioSource>> {
        self.audio_sources.lock().clone()
    }

    pub fn video_sources(&self) -> Vec<Arc<FakeVideoSource>> {
        self.video_sources.lock().clone()
    }

    pub fn tracks(&self) -> Vec<Arc<FakeTrack>> {
        self.tracks.lock().clone()
    }

    pub fn screen_capturers(&self) -> Vec<Arc<FakeCapturer>> {
        self.screen_capturers.lock().clone()
    }
}

impl MediaPipeline for FakePipeline {
    fn create_audio_source(
        &self,
        constraints: &MediaConstraints,
    ) -> anyhow::Result<Arc<dyn AudioSource>> {
        if self.fail_audio_source {
            anyhow::bail!("audio device unavailable");
        }
        let source = Arc::new(FakeAudioSource {
            constraints: constraints.clone(),
        });
        self.audio_sources.lock().push(source.clone());
        Ok(source as Arc<dyn AudioSource>)
    }

    fn create_video_source(&self, _capturer: Arc<dyn Capturer>) -> anyhow::Result<Arc<dyn VideoSource>> {
        let source = Arc::new(FakeVideoSource::default());
        self.video_sources.lock().push(source.clone());
        Ok(source as Arc<dyn VideoSource>)
    }

    fn create_screen_capturer(&self, _token: &ConsentToken) -> anyhow::Result<Arc<dyn Capturer>> {
        if self.fail_screen {
            anyhow::bail!("projection unavailable");
        }
        let mut capturer = FakeCapturer::screen();
        if self.fail_screen_start {
            capturer = capturer.failing_start();
        }
        let capturer = Arc::new(capturer);
        self.screen_capturers.lock().push(capturer.clone());
        Ok(capturer as Arc<dyn Capturer>)
    }

    fn create_audio_track(
        &self,
        id: &str,
        _source: Arc<dyn AudioSource>,
    ) -> anyhow::Result<Arc<dyn MediaTrack>> {
        let track = Arc::new(FakeTrack::new(id, TrackKind::Audio));
        self.tracks.lock().push(track.clone());
        Ok(track as Arc<dyn MediaTrack>)
    }

    fn create_video_track(
        &self,
        id: &str,
        _source: Arc<dyn VideoSource>,
    ) -> anyhow::Result<Arc<dyn MediaTrack>> {
        if self.fail_video_track {
            anyhow::bail!("video track rejected");
        }
        let track = Arc::new(FakeTrack::new(id, TrackKind::Video));
        self.tracks.lock().push(track.clone());
        Ok(track as Arc<dyn MediaTrack>)
    }
}

pub struct FakeAuthorization {
    denied: PermissionSet,
    prompts: AtomicUsize,
}

impl FakeAuthorization {
    pub fn grant_all() -> Self {
        Self {
            denied: PermissionSet::new(),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn deny<I: IntoIterator<Item = Permission>>(denied: I) -> Self {
        Self {
            denied: denied.into_iter().collect(),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationService for FakeAuthorization {
    async fn request_permissions(&self, permissions: &PermissionSet) -> PermissionGrant {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        PermissionGrant {
            granted: permissions.difference(&self.denied),
            denied: permissions.iter().filter(|p| self.denied.contains(*p)).collect(),
        }
    }
}

pub struct FakeScreenConsent {
    approve: bool,
    prompts: AtomicUsize,
    revoke: Mutex<Option<oneshot::Sender<()>>>,
}

impl FakeScreenConsent {
    pub fn approve() -> Self {
        Self {
            approve: true,
            prompts: AtomicUsize::new(0),
            revoke: Mutex::new(None),
        }
    }

    pub fn deny() -> Self {
        Self {
            approve: false,
            ..Self::approve()
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Revoke the last approved consent
    pub fn revoke(&self) {
        if let Some(tx) = self.revoke.lock().take() {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl ScreenConsentService for FakeScreenConsent {
    async fn request_consent(&self) -> ScreenConsent {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if !self.approve {
            return ScreenConsent::Denied;
        }
        let (tx, rx) = oneshot::channel();
        *self.revoke.lock() = Some(tx);
        ScreenConsent::Granted {
            token: ConsentToken::new("projection"),
            revoked: Some(rx),
        }
    }
}
