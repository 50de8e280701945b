//! Runtime authorization
//!
//! Permission types, the external authorization and screen-consent services,
//! and the coordinator that turns a request into a granted permission set.

pub mod callback;
pub mod coordinator;

pub use callback::{
    CallbackAuthorization, CallbackScreenConsent, ConsentCallback, PermissionCallback,
    RevocationNotifier,
};
pub use coordinator::{required_permissions, AuthorizationCoordinator};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tokio::sync::oneshot;

/// A runtime permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Microphone,
    Camera,
    Screen,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Microphone => "microphone",
            Permission::Camera => "camera",
            Permission::Screen => "screen",
        };
        f.write_str(name)
    }
}

/// Ordered set of permissions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Permissions in `self` that are not in `other`
    pub fn difference(&self, other: &PermissionSet) -> PermissionSet {
        self.0.difference(&other.0).copied().collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|p| p.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Outcome reported by the authorization service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGrant {
    pub granted: PermissionSet,
    pub denied: PermissionSet,
}

/// External service that shows runtime permission prompts
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Ask for every permission in the batch; resolves exactly once
    async fn request_permissions(&self, permissions: &PermissionSet) -> PermissionGrant;
}

/// Opaque one-shot screen-capture consent artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentToken(String);

impl ConsentToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of a screen-capture consent dialog
#[derive(Debug)]
pub enum ScreenConsent {
    Denied,
    Granted {
        token: ConsentToken,
        /// Fires if the platform later revokes the consent
        revoked: Option<oneshot::Receiver<()>>,
    },
}

/// External service that shows the screen-capture consent dialog
#[async_trait]
pub trait ScreenConsentService: Send + Sync {
    /// Ask the user for a consent token; resolves exactly once
    async fn request_consent(&self) -> ScreenConsent;
}
