//! Acquisition state management
//!
//! Defines the per-call state machine and the orchestrator configuration.

use crate::capture::CaptureFormat;
use crate::utils::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// State of one acquisition call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AcquisitionState {
    /// Request parsed, nothing asked yet
    Idle,
    /// Waiting on the authorization or consent dialog
    RequiresPermission,
    /// Everything needed was granted
    Granted,
    /// Building capturers, sources and tracks
    Creating,
    /// Stream handed to the caller
    Committed,
    /// Creation failed and everything built was released
    RolledBack,
    /// Authorization refused
    Denied,
    /// Nothing was requested
    InvalidRequest,
}

impl Default for AcquisitionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl AcquisitionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Committed | Self::RolledBack | Self::Denied | Self::InvalidRequest
        )
    }

    /// Whether `next` is a legal successor
    ///
    /// `Idle -> Creating` is the still-image path, which needs no permission.
    pub fn can_transition_to(&self, next: AcquisitionState) -> bool {
        use AcquisitionState::*;
        matches!(
            (self, next),
            (Idle, RequiresPermission)
                | (Idle, InvalidRequest)
                | (Idle, Creating)
                | (RequiresPermission, Granted)
                | (RequiresPermission, Denied)
                | (Granted, Creating)
                | (Creating, Committed)
                | (Creating, RolledBack)
        )
    }
}

/// State tracker for a single call, logged under a call id
#[derive(Debug)]
pub struct AcquisitionFlow {
    call_id: Uuid,
    kind: &'static str,
    state: AcquisitionState,
}

impl AcquisitionFlow {
    pub fn new(kind: &'static str) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            kind,
            state: AcquisitionState::Idle,
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Move to `next`, logging the transition
    pub fn advance(&mut self, next: AcquisitionState) {
        if !self.state.can_transition_to(next) {
            tracing::error!(
                "Illegal {} acquisition transition {:?} -> {:?} ({})",
                self.kind,
                self.state,
                next,
                self.call_id
            );
        }
        tracing::debug!(
            "{} acquisition {}: {:?} -> {:?}",
            self.kind,
            self.call_id,
            self.state,
            next
        );
        self.state = next;
    }
}

/// Options that ship as default noise/echo handling for `audio: true`
pub const DEFAULT_AUDIO_OPTIONS: [&str; 5] = [
    "googNoiseSuppression",
    "googEchoCancellation",
    "echoCancellation",
    "googEchoCancellation2",
    "googDAEchoCancellation",
];

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcquisitionConfig {
    /// Geometry used when the request carries no numeric hints
    pub default_format: CaptureFormat,

    /// Optional audio constraints enabled when audio is requested as `true`
    pub default_audio_options: Vec<String>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            default_format: CaptureFormat {
                width: 1280,
                height: 720,
                frame_rate: 30,
            },
            default_audio_options: DEFAULT_AUDIO_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AcquisitionConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: AcquisitionConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!("Loaded acquisition config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let format = self.default_format;
        if format.width == 0 || format.height == 0 || format.frame_rate == 0 {
            return Err(ConfigError::Invalid(format!(
                "default format must be non-zero, got {}",
                format
            )));
        }
        Ok(())
    }
}
