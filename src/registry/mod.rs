//! Capturer registry
//!
//! Maps track ids to live capturers. One registry is owned per orchestrator
//! and shared by reference with everything that switches or tears down
//! capturers. Every operation takes the same lock, so creation, removal,
//! switching and frame feeding never interleave.

use crate::capture::{Capturer, CapturerKind};
use crate::utils::{AcquisitionError, AcquisitionResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

struct CapturerEntry {
    capturer: Arc<dyn Capturer>,
    registered_at: DateTime<Utc>,
}

/// Snapshot of one registered capturer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturerInfo {
    pub track_id: String,
    pub kind: CapturerKind,
    pub registered_at: DateTime<Utc>,
}

/// Track id → live capturer
#[derive(Default)]
pub struct CapturerRegistry {
    entries: Mutex<HashMap<String, CapturerEntry>>,
}

impl CapturerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capturer under a track id
    ///
    /// Fails if the id is already taken; the existing entry is left alone.
    pub fn create(&self, track_id: &str, capturer: Arc<dyn Capturer>) -> AcquisitionResult<()> {
        let mut entries = self.entries.lock();
        if entries.contains_key(track_id) {
            tracing::error!("Capturer already registered for track {}", track_id);
            return Err(AcquisitionError::DuplicateTrack(track_id.to_string()));
        }

        tracing::debug!("Registering {:?} capturer for track {}", capturer.kind(), track_id);
        entries.insert(
            track_id.to_string(),
            CapturerEntry {
                capturer,
                registered_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Stop and forget the capturer for a track; no-op if absent
    ///
    /// The entry leaves the map under the lock; the stop itself runs after,
    /// so a slow device does not hold up other callers. Stop failures are
    /// logged, never returned.
    pub fn remove(&self, track_id: &str) {
        let entry = self.entries.lock().remove(track_id);
        let Some(entry) = entry else {
            return;
        };

        if let Err(e) = entry.capturer.stop_capture() {
            tracing::warn!("Failed to stop capturer for track {}: {}", track_id, e);
        }
        tracing::debug!("Removed capturer for track {}", track_id);
    }

    /// Ask the track's capturer to flip cameras; fire-and-forget
    pub fn switch_facing(&self, track_id: &str) {
        let entries = self.entries.lock();
        let Some(entry) = entries.get(track_id) else {
            tracing::debug!("switch_facing: no capturer for track {}", track_id);
            return;
        };

        match entry.capturer.as_facing_switch() {
            Some(switch) => switch.switch_facing(),
            None => tracing::debug!("Capturer for track {} cannot switch facing", track_id),
        }
    }

    /// Feed a frame to the track's still-image capturer; no-op otherwise
    pub fn put_still_image(&self, track_id: &str, encoded: &[u8]) {
        let entries = self.entries.lock();
        let Some(entry) = entries.get(track_id) else {
            return;
        };

        if let Some(sink) = entry.capturer.as_still_image_sink() {
            sink.put_image(encoded);
        }
    }

    /// Stop every capturer; used at teardown
    pub fn clear(&self) {
        let drained: Vec<(String, CapturerEntry)> = self.entries.lock().drain().collect();
        for (track_id, entry) in drained {
            if let Err(e) = entry.capturer.stop_capture() {
                tracing::warn!("Failed to stop capturer for track {}: {}", track_id, e);
            }
        }
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.lock().contains_key(track_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn track_ids(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Describe every registered capturer
    pub fn snapshot(&self) -> Vec<CapturerInfo> {
        self.entries
            .lock()
            .iter()
            .map(|(track_id, entry)| CapturerInfo {
                track_id: track_id.clone(),
                kind: entry.capturer.kind(),
                registered_at: entry.registered_at,
            })
            .collect()
    }
}
