//! Callback-shaped host services
//!
//! Hosts usually expose permission prompts as "request, then call me back".
//! These adapters bridge such APIs onto the async service traits through a
//! one-shot channel, so each request resumes exactly once no matter which
//! thread the host calls back on.

use super::{
    AuthorizationService, ConsentToken, PermissionGrant, PermissionSet, ScreenConsent,
    ScreenConsentService,
};
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Completion handed to the host with a permission request: `(granted, denied)`
pub type PermissionCallback = Box<dyn FnOnce(PermissionSet, PermissionSet) + Send>;

/// Completion handed to the host with a consent request
///
/// `None` means the user declined.
pub type ConsentCallback = Box<dyn FnOnce(Option<ConsentToken>) + Send>;

/// Lets the host report that an approved screen consent was revoked
pub struct RevocationNotifier {
    tx: oneshot::Sender<()>,
}

impl RevocationNotifier {
    /// Report the revocation; a no-op if nobody is listening any more
    pub fn notify(self) {
        let _ = self.tx.send(());
    }
}

/// [`AuthorizationService`] over a callback-based host API
pub struct CallbackAuthorization<F> {
    request: F,
}

impl<F> CallbackAuthorization<F>
where
    F: Fn(PermissionSet, PermissionCallback) + Send + Sync,
{
    pub fn new(request: F) -> Self {
        Self { request }
    }
}

#[async_trait]
impl<F> AuthorizationService for CallbackAuthorization<F>
where
    F: Fn(PermissionSet, PermissionCallback) + Send + Sync,
{
    async fn request_permissions(&self, permissions: &PermissionSet) -> PermissionGrant {
        let (tx, rx) = oneshot::channel();
        let callback: PermissionCallback = Box::new(move |granted, denied| {
            let _ = tx.send(PermissionGrant { granted, denied });
        });

        (self.request)(permissions.clone(), callback);

        match rx.await {
            Ok(grant) => grant,
            Err(_) => {
                tracing::warn!("Permission callback dropped without a result; treating as denied");
                PermissionGrant {
                    granted: PermissionSet::new(),
                    denied: permissions.clone(),
                }
            }
        }
    }
}

/// [`ScreenConsentService`] over a callback-based host API
pub struct CallbackScreenConsent<F> {
    request: F,
}

impl<F> CallbackScreenConsent<F>
where
    F: Fn(ConsentCallback, RevocationNotifier) + Send + Sync,
{
    pub fn new(request: F) -> Self {
        Self { request }
    }
}

#[async_trait]
impl<F> ScreenConsentService for CallbackScreenConsent<F>
where
    F: Fn(ConsentCallback, RevocationNotifier) + Send + Sync,
{
    async fn request_consent(&self) -> ScreenConsent {
        let (tx, rx) = oneshot::channel();
        let (revoke_tx, revoke_rx) = oneshot::channel();
        let callback: ConsentCallback = Box::new(move |token| {
            let _ = tx.send(token);
        });

        (self.request)(callback, RevocationNotifier { tx: revoke_tx });

        match rx.await {
            Ok(Some(token)) => ScreenConsent::Granted {
                token,
                revoked: Some(revoke_rx),
            },
            Ok(None) => ScreenConsent::Denied,
            Err(_) => {
                tracing::warn!("Screen consent callback dropped without a result; treating as denied");
                ScreenConsent::Denied
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::Permission;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_callback_on_another_thread() {
        let service = CallbackAuthorization::new(|permissions: PermissionSet, done: PermissionCallback| {
            std::thread::spawn(move || done(permissions, PermissionSet::new()));
        });
        let required: PermissionSet = [Permission::Camera].into_iter().collect();

        let grant = service.request_permissions(&required).await;
        assert_eq!(grant.granted, required);
        assert!(grant.denied.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_callback_denies_everything() {
        let service = CallbackAuthorization::new(|_: PermissionSet, done: PermissionCallback| {
            drop(done);
        });
        let required: PermissionSet = [Permission::Microphone, Permission::Camera]
            .into_iter()
            .collect();

        let grant = service.request_permissions(&required).await;
        assert!(grant.granted.is_empty());
        assert_eq!(grant.denied, required);
    }

    #[tokio::test]
    async fn test_consent_revocation_is_forwarded() {
        let notifier: Arc<Mutex<Option<RevocationNotifier>>> = Arc::new(Mutex::new(None));
        let slot = notifier.clone();
        let service = CallbackScreenConsent::new(move |done: ConsentCallback, revoke: RevocationNotifier| {
            *slot.lock() = Some(revoke);
            done(Some(ConsentToken::new("projection-1")));
        });

        let ScreenConsent::Granted { token, revoked } = service.request_consent().await else {
            panic!("expected consent");
        };
        assert_eq!(token.as_str(), "projection-1");

        notifier.lock().take().unwrap().notify();
        assert!(revoked.unwrap().await.is_ok());
    }

    #[tokio::test]
    async fn test_consent_declined() {
        let service = CallbackScreenConsent::new(|done: ConsentCallback, _: RevocationNotifier| {
            done(None);
        });

        assert!(matches!(service.request_consent().await, ScreenConsent::Denied));
    }
}
