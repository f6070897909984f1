//! Minimal contract for a popup-style federated identity provider.
//!
//! This crate defines the auth-state stream, the popup sign-in call and
//! sign-out. It excludes any concrete provider transport or token handling.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Provider id for Google federated sign-in.
pub const GOOGLE_PROVIDER_ID: &str = "google.com";

/// Well-known provider error codes.
pub mod codes {
    pub const POPUP_CLOSED_BY_USER: &str = "auth/popup-closed-by-user";
    pub const POPUP_BLOCKED: &str = "auth/popup-blocked";
    pub const UNAUTHORIZED_DOMAIN: &str = "auth/unauthorized-domain";
    pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
}

/// Signed-in principal as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Error reported by the provider, keyed by a stable `code`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Builds an error whose message embeds the code, matching how hosted
    /// providers usually phrase them.
    #[must_use]
    pub fn from_code(code: impl Into<String>) -> Self {
        let code = code.into();
        let message = format!("Error ({code}).");
        Self { code, message }
    }
}

/// Parameters for one popup sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    pub provider_id: String,
    pub custom_parameters: BTreeMap<String, String>,
}

impl SignInRequest {
    #[must_use]
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            custom_parameters: BTreeMap::new(),
        }
    }

    /// Google sign-in that always shows the account chooser.
    #[must_use]
    pub fn google_select_account() -> Self {
        Self::new(GOOGLE_PROVIDER_ID).with_parameter("prompt", "select_account")
    }

    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_parameters.insert(key.into(), value.into());
        self
    }
}

/// One notification on the auth-state stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateEvent {
    /// Current identity, `None` when signed out.
    Changed(Option<Identity>),
    Error(ProviderError),
}

/// Callback invoked for each auth-state notification.
pub type AuthStateListener = Arc<dyn Fn(AuthStateEvent) + Send + Sync>;

/// Handle returned by [`IdentityProvider::on_auth_state_changed`].
///
/// Dropping the subscription unsubscribes the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    #[must_use]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription with nothing to release.
    #[must_use]
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Identity provider seam used by the session gate.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Registers `listener` for auth-state notifications.
    ///
    /// Providers deliver the current state at some point after registration;
    /// delivery may be deferred.
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription;

    /// Runs the popup sign-in flow.
    async fn sign_in_with_popup(&self, request: SignInRequest) -> Result<Identity, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}
