//! Capture trait definitions
//!
//! Platform-agnostic traits for capture devices. Camera and screen capturers
//! live outside this crate and are driven through these interfaces; the
//! still-image capturer is the only in-crate implementation.

use super::image::StillFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Capture geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureFormat {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Frames per second
    pub frame_rate: u32,
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.frame_rate)
    }
}

/// Capturer variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapturerKind {
    Camera,
    Screen,
    StillImage,
}

/// An active capture-device session
pub trait Capturer: Send + Sync {
    fn kind(&self) -> CapturerKind;

    /// Start producing frames at the given geometry
    ///
    /// Devices may settle on a nearby supported mode.
    fn start_capture(&self, format: CaptureFormat) -> anyhow::Result<()>;

    fn stop_capture(&self) -> anyhow::Result<()>;

    /// Facing-switch capability, if this capturer has one
    fn as_facing_switch(&self) -> Option<&dyn FacingSwitch> {
        None
    }

    /// Still-image feed capability, if this capturer has one
    fn as_still_image_sink(&self) -> Option<&dyn StillImageSink> {
        None
    }
}

/// Capturers that can flip between front and environment cameras
pub trait FacingSwitch: Send + Sync {
    /// Request a switch; completion is not reported
    fn switch_facing(&self);
}

/// Capturers fed with externally supplied frames
pub trait StillImageSink: Send + Sync {
    /// Feed one encoded image
    fn put_image(&self, encoded: &[u8]);

    /// Frames as seen by the video source
    fn frames(&self) -> watch::Receiver<Option<Arc<StillFrame>>>;
}

/// Information about a camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Device name, also used as its source id
    pub name: String,

    /// Whether the camera faces the user
    pub front_facing: bool,
}

/// Camera enumeration backend
pub trait CameraEnumerator: Send + Sync {
    /// Backend name for logs
    fn backend_name(&self) -> &str;

    /// Platform capability probe
    fn is_supported(&self) -> bool {
        true
    }

    /// Device names in enumeration order
    fn device_names(&self) -> Vec<String>;

    fn is_front_facing(&self, name: &str) -> bool;

    /// Open a capturer for a device, `None` when the device cannot be opened
    fn create_capturer(&self, name: &str) -> Option<Arc<dyn Capturer>>;

    /// Describe every enumerable camera
    fn cameras(&self) -> Vec<CameraInfo> {
        self.device_names()
            .into_iter()
            .map(|name| CameraInfo {
                front_facing: self.is_front_facing(&name),
                name,
            })
            .collect()
    }
}
