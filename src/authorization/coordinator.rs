//! Authorization coordinator
//!
//! Works out which permissions a request needs and asks for all of them in a
//! single batch. Only a full grant lets the acquisition continue.

use super::{AuthorizationService, Permission, PermissionSet};
use crate::constraints::{AcquisitionRequest, VideoSourceKind};
use crate::utils::{AcquisitionError, AcquisitionResult};
use std::sync::Arc;

/// Permissions needed by the standard (camera/microphone) flow
///
/// Screen and still-image video never require the camera permission.
pub fn required_permissions(request: &AcquisitionRequest) -> PermissionSet {
    let mut required = PermissionSet::new();

    if request.audio().is_requested() {
        required.insert(Permission::Microphone);
    }

    if request.video().is_requested() && request.video_source() == VideoSourceKind::Camera {
        required.insert(Permission::Camera);
    }

    required
}

/// Resolves permission batches against the external authorization service
#[derive(Clone)]
pub struct AuthorizationCoordinator {
    service: Arc<dyn AuthorizationService>,
}

impl AuthorizationCoordinator {
    pub fn new(service: Arc<dyn AuthorizationService>) -> Self {
        Self { service }
    }

    /// Ask for every permission in `required`
    ///
    /// An empty set is an invalid request and never reaches the service. A
    /// partial grant fails with the permissions that were not granted.
    pub async fn resolve(&self, required: &PermissionSet) -> AcquisitionResult<PermissionSet> {
        if required.is_empty() {
            return Err(AcquisitionError::InvalidRequest(
                "no media types requested".to_string(),
            ));
        }

        tracing::info!("Requesting permissions: {}", required);
        let grant = self.service.request_permissions(required).await;

        let denied = required.difference(&grant.granted);
        if !denied.is_empty() {
            tracing::info!("Permissions denied: {}", denied);
            return Err(AcquisitionError::PermissionDenied { denied });
        }

        tracing::debug!("Permissions granted: {}", required);
        Ok(required.clone())
    }
}
