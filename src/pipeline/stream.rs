//! Streams and their public projection

use super::{MediaTrack, TrackKind};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Public description of a created track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub id: String,
    pub kind: TrackKind,
    pub enabled: bool,
    pub label: String,
    pub ready_state: String,
    /// Always `false` for locally captured tracks
    pub remote: bool,
}

impl TrackDescriptor {
    /// Snapshot a track; the label is the track kind
    pub fn describe(track: &dyn MediaTrack) -> Self {
        let kind = track.kind();
        Self {
            id: track.id().to_string(),
            kind,
            enabled: track.enabled(),
            label: kind.to_string(),
            ready_state: track.ready_state().to_string(),
            remote: false,
        }
    }
}

/// Result of a successful acquisition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResult {
    pub stream_id: String,
    pub tracks: Vec<TrackDescriptor>,
}

/// Ordered collection of local tracks under one id
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_track(&mut self, track: Arc<dyn MediaTrack>) {
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn to_result(&self) -> StreamResult {
        StreamResult {
            stream_id: self.id.clone(),
            tracks: self
                .tracks
                .iter()
                .map(|t| TrackDescriptor::describe(t.as_ref()))
                .collect(),
        }
    }
}

#[derive(Default)]
struct StoreInner {
    streams: HashMap<String, MediaStream>,
    tracks: HashMap<String, Arc<dyn MediaTrack>>,
}

/// Local streams and tracks handed out to the host
///
/// Shared by reference between the orchestrator and whatever later looks
/// tracks up (peer connections, renderers).
#[derive(Default)]
pub struct LocalMediaStore {
    inner: Mutex<StoreInner>,
}

impl LocalMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stream and every track in it
    pub fn insert_stream(&self, stream: MediaStream) {
        let mut inner = self.inner.lock();
        for track in stream.tracks() {
            inner.tracks.insert(track.id().to_string(), track.clone());
        }
        tracing::debug!("MediaStream id: {}", stream.id());
        inner.streams.insert(stream.id().to_string(), stream);
    }

    /// Remove a stream and its tracks, handing the stream back
    pub fn remove_stream(&self, stream_id: &str) -> Option<MediaStream> {
        let mut inner = self.inner.lock();
        let stream = inner.streams.remove(stream_id)?;
        for track in stream.tracks() {
            inner.tracks.remove(track.id());
        }
        Some(stream)
    }

    pub fn track(&self, track_id: &str) -> Option<Arc<dyn MediaTrack>> {
        self.inner.lock().tracks.get(track_id).cloned()
    }

    pub fn stream(&self, stream_id: &str) -> Option<StreamResult> {
        self.inner.lock().streams.get(stream_id).map(MediaStream::to_result)
    }

    pub fn stream_count(&self) -> usize {
        self.inner.lock().streams.len()
    }

    pub fn track_count(&self) -> usize {
        self.inner.lock().tracks.len()
    }
}
