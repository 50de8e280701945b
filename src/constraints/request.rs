//! Acquisition request
//!
//! The orchestration-relevant subset of a constraint tree, decided once at
//! parse time so the flows never re-inspect raw value types.

use super::ConstraintsMap;
use crate::capture::CaptureFormat;
use serde_json::{Map, Value};

/// `chromeMediaSource` value selecting screen capture
pub const SCREEN_SOURCE_DESKTOP: &str = "desktop";

/// `chromeMediaSource` value selecting the synthetic still-image source
pub const STILL_IMAGE_SOURCE: &str = "image";

/// `facingMode` value selecting the environment (back) camera
pub const FACING_MODE_ENVIRONMENT: &str = "environment";

/// How one media kind was requested
#[derive(Debug, Clone, PartialEq)]
pub enum MediaRequest {
    /// Key missing, null, or of a type that does not request anything
    Absent,
    /// Explicit `false`
    Disabled,
    /// Explicit `true`
    Enabled,
    /// A constraint dictionary
    Detailed(Map<String, Value>),
}

impl MediaRequest {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => MediaRequest::Enabled,
            Some(Value::Bool(false)) => MediaRequest::Disabled,
            Some(Value::Object(map)) => MediaRequest::Detailed(map.clone()),
            _ => MediaRequest::Absent,
        }
    }

    /// `true` or a dictionary
    pub fn is_requested(&self) -> bool {
        matches!(self, MediaRequest::Enabled | MediaRequest::Detailed(_))
    }

    pub fn details(&self) -> Option<ConstraintsMap<'_>> {
        match self {
            MediaRequest::Detailed(map) => Some(ConstraintsMap::new(map)),
            _ => None,
        }
    }
}

/// Which video flow a request selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSourceKind {
    Camera,
    Screen,
    StillImage,
}

/// The `video.mandatory` sub-dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMandatory {
    pub media_source: Option<String>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub min_frame_rate: Option<u32>,
}

impl VideoMandatory {
    fn parse(map: ConstraintsMap<'_>) -> Self {
        Self {
            media_source: map.get_str("chromeMediaSource").map(str::to_string),
            min_width: map.get_u32("minWidth"),
            min_height: map.get_u32("minHeight"),
            min_frame_rate: map.get_u32("minFrameRate"),
        }
    }
}

/// Parsed acquisition request; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionRequest {
    audio: MediaRequest,
    video: MediaRequest,
    mandatory: Option<VideoMandatory>,
    facing_mode: Option<String>,
    source_id: Option<String>,
}

impl AcquisitionRequest {
    /// Parse a raw constraint tree
    ///
    /// Anything that is not a dictionary parses as a request for nothing.
    pub fn parse(constraints: &Value) -> Self {
        let root = ConstraintsMap::from_value(constraints);
        let audio = MediaRequest::from_value(root.and_then(|r| r.get("audio")));
        let video = MediaRequest::from_value(root.and_then(|r| r.get("video")));

        let (mandatory, facing_mode, source_id) = match video.details() {
            Some(map) => (
                map.get_map("mandatory").map(VideoMandatory::parse),
                map.get_str("facingMode").map(str::to_string),
                source_id_constraint(map),
            ),
            None => (None, None, None),
        };

        Self {
            audio,
            video,
            mandatory,
            facing_mode,
            source_id,
        }
    }

    pub fn audio(&self) -> &MediaRequest {
        &self.audio
    }

    pub fn video(&self) -> &MediaRequest {
        &self.video
    }

    pub fn mandatory(&self) -> Option<&VideoMandatory> {
        self.mandatory.as_ref()
    }

    pub fn facing_mode(&self) -> Option<&str> {
        self.facing_mode.as_deref()
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    /// Flow selected by the `chromeMediaSource` discriminator
    pub fn video_source(&self) -> VideoSourceKind {
        match self.mandatory.as_ref().and_then(|m| m.media_source.as_deref()) {
            Some(SCREEN_SOURCE_DESKTOP) => VideoSourceKind::Screen,
            Some(STILL_IMAGE_SOURCE) => VideoSourceKind::StillImage,
            _ => VideoSourceKind::Camera,
        }
    }

    /// Front camera unless the facing hint is exactly "environment"
    pub fn prefer_front(&self) -> bool {
        self.facing_mode.as_deref() != Some(FACING_MODE_ENVIRONMENT)
    }

    /// Requested capture geometry, falling back per field to `defaults`
    pub fn capture_format(&self, defaults: CaptureFormat) -> CaptureFormat {
        let Some(mandatory) = self.mandatory.as_ref() else {
            return defaults;
        };
        CaptureFormat {
            width: mandatory.min_width.unwrap_or(defaults.width),
            height: mandatory.min_height.unwrap_or(defaults.height),
            frame_rate: mandatory.min_frame_rate.unwrap_or(defaults.frame_rate),
        }
    }
}

/// First `sourceId` string in the `optional` array, then a top-level `sourceId`
fn source_id_constraint(video: ConstraintsMap<'_>) -> Option<String> {
    let from_optional = video.get_array("optional").and_then(|optional| {
        optional
            .iter()
            .filter_map(ConstraintsMap::from_value)
            .find_map(|option| option.get_str("sourceId"))
    });

    from_optional
        .or_else(|| video.get_str("sourceId"))
        .map(str::to_string)
}
