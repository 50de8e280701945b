//! Media pipeline interfaces
//!
//! The platform media pipeline (sources, tracks, screen capturers) is an
//! external collaborator; the orchestrator drives it through [`MediaPipeline`].

pub mod stream;

pub use stream::{LocalMediaStore, MediaStream, StreamResult, TrackDescriptor};

use crate::authorization::ConsentToken;
use crate::capture::{CaptureFormat, Capturer};
use crate::constraints::MediaConstraints;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Media kind of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// Ready state of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Live,
    Ended,
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackState::Live => f.write_str("live"),
            TrackState::Ended => f.write_str("ended"),
        }
    }
}

/// Pipeline stage feeding an audio track
pub trait AudioSource: Send + Sync {
    fn dispose(&self) {}
}

/// Pipeline stage adapting a capturer's frames for a video track
pub trait VideoSource: Send + Sync {
    /// Re-assert the output geometry after the device has started
    fn adapt_output_format(&self, format: CaptureFormat);

    fn dispose(&self) {}
}

/// A single local media feed
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    fn enabled(&self) -> bool;

    fn ready_state(&self) -> TrackState;

    /// Release the track and its pipeline resources
    fn dispose(&self);
}

/// Factory for pipeline objects
pub trait MediaPipeline: Send + Sync {
    fn create_audio_source(
        &self,
        constraints: &MediaConstraints,
    ) -> anyhow::Result<Arc<dyn AudioSource>>;

    fn create_video_source(&self, capturer: Arc<dyn Capturer>) -> anyhow::Result<Arc<dyn VideoSource>>;

    /// Screen capturer bound to a one-shot consent token
    fn create_screen_capturer(&self, token: &ConsentToken) -> anyhow::Result<Arc<dyn Capturer>>;

    fn create_audio_track(
        &self,
        id: &str,
        source: Arc<dyn AudioSource>,
    ) -> anyhow::Result<Arc<dyn MediaTrack>>;

    fn create_video_track(
        &self,
        id: &str,
        source: Arc<dyn VideoSource>,
    ) -> anyhow::Result<Arc<dyn MediaTrack>>;
}
