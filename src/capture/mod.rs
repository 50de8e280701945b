//! Capture devices
//!
//! Capturer interfaces, camera selection, and the in-crate still-image capturer.

pub mod image;
pub mod selector;
pub mod traits;

pub use image::{decode_png, ImageCapturer, ImageError, StillFrame};
pub use selector::{select_capturer, CameraBackends, DeviceSelector};
pub use traits::{
    CameraEnumerator, CameraInfo, CaptureFormat, Capturer, CapturerKind, FacingSwitch,
    StillImageSink,
};
