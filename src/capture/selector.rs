//! Camera device selection
//!
//! Picks one camera and opens a capturer for it. An explicit source id wins
//! over the facing-mode hint; facing search walks devices in enumeration order.

use super::traits::{CameraEnumerator, Capturer};
use std::sync::Arc;

/// The two interchangeable enumeration backends
///
/// `preferred` is used whenever its capability probe passes, `legacy`
/// otherwise.
#[derive(Clone)]
pub struct CameraBackends {
    preferred: Arc<dyn CameraEnumerator>,
    legacy: Arc<dyn CameraEnumerator>,
}

impl CameraBackends {
    pub fn new(preferred: Arc<dyn CameraEnumerator>, legacy: Arc<dyn CameraEnumerator>) -> Self {
        Self { preferred, legacy }
    }

    /// Use one backend for both roles
    pub fn single(enumerator: Arc<dyn CameraEnumerator>) -> Self {
        Self {
            preferred: enumerator.clone(),
            legacy: enumerator,
        }
    }

    /// Probe the platform and pick a backend
    pub fn select(&self) -> Arc<dyn CameraEnumerator> {
        if self.preferred.is_supported() {
            tracing::debug!(
                "Creating video capturer using {} backend",
                self.preferred.backend_name()
            );
            self.preferred.clone()
        } else {
            tracing::debug!(
                "Creating video capturer using {} backend",
                self.legacy.backend_name()
            );
            self.legacy.clone()
        }
    }
}

/// Device selector bound to a pair of backends
#[derive(Clone)]
pub struct DeviceSelector {
    backends: CameraBackends,
}

impl DeviceSelector {
    pub fn new(backends: CameraBackends) -> Self {
        Self { backends }
    }

    /// Enumerator chosen for this call
    pub fn enumerator(&self) -> Arc<dyn CameraEnumerator> {
        self.backends.select()
    }

    /// Select a camera and open a capturer for it
    pub fn select(&self, prefer_front: bool, explicit_id: Option<&str>) -> Option<Arc<dyn Capturer>> {
        let enumerator = self.enumerator();
        select_capturer(enumerator.as_ref(), prefer_front, explicit_id)
    }
}

/// Open a capturer on `enumerator`
///
/// Returns `None` when no device matches or every matching device fails to
/// open.
pub fn select_capturer(
    enumerator: &dyn CameraEnumerator,
    prefer_front: bool,
    explicit_id: Option<&str>,
) -> Option<Arc<dyn Capturer>> {
    let device_names = enumerator.device_names();

    if let Some(source_id) = explicit_id {
        // Names are unique, so only the first match is tried
        if let Some(name) = device_names.iter().find(|name| name.as_str() == source_id) {
            match enumerator.create_capturer(name) {
                Some(capturer) => {
                    tracing::debug!("Create user specified camera {} succeeded", name);
                    return Some(capturer);
                }
                None => {
                    tracing::debug!("Create user specified camera {} failed", name);
                }
            }
        }
    }

    let facing = if prefer_front { "front" } else { "back" };
    for name in &device_names {
        if enumerator.is_front_facing(name) != prefer_front {
            continue;
        }
        match enumerator.create_capturer(name) {
            Some(capturer) => {
                tracing::debug!("Create {} camera {} succeeded", facing, name);
                return Some(capturer);
            }
            None => {
                tracing::error!("Create {} camera {} failed", facing, name);
            }
        }
    }

    tracing::debug!("No {} camera could be opened", facing);
    None
}
