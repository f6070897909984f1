//! Session gate over an [`IdentityProvider`].
//!
//! The gate owns the user session: it subscribes to the provider's auth-state
//! stream on mount, stops listening on unmount, and hands read-only
//! [`SessionHandle`]s to everything below it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use identity_provider::{
    codes, AuthStateEvent, AuthStateListener, Identity, IdentityProvider, ProviderError,
    SignInRequest, Subscription,
};
use thiserror::Error;
use tokio::sync::watch;

use crate::panel::lock_unpoisoned;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub identity: Option<Identity>,
    pub is_loading: bool,
}

impl Default for UserSession {
    fn default() -> Self {
        Self {
            identity: None,
            is_loading: true,
        }
    }
}

/// Sign-in and sign-out failures as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Sign-in was cancelled")]
    Cancelled,

    #[error("Sign-in popup was blocked by your browser")]
    PopupBlocked,

    #[error("This domain is not authorized for sign-in")]
    UnauthorizedDomain,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SessionError {
    /// Maps well-known popup failures to friendly variants.
    pub fn classify(error: ProviderError) -> Self {
        match error.code.as_str() {
            codes::POPUP_CLOSED_BY_USER => Self::Cancelled,
            codes::POPUP_BLOCKED => Self::PopupBlocked,
            codes::UNAUTHORIZED_DOMAIN => Self::UnauthorizedDomain,
            _ => Self::Provider(error),
        }
    }
}

/// Read-only view of the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    receiver: watch::Receiver<UserSession>,
}

impl SessionHandle {
    pub fn current(&self) -> UserSession {
        self.receiver.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.receiver.borrow().identity.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.receiver.borrow().is_loading
    }

    /// Waits for the next session change. Returns `false` once the gate is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

pub struct SessionGate {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<UserSession>>,
    mounted: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionGate {
    /// Subscribes to `provider` and starts in the loading state.
    pub fn mount(provider: Arc<dyn IdentityProvider>) -> Self {
        let (sender, _) = watch::channel(UserSession::default());
        let state = Arc::new(sender);
        let mounted = Arc::new(AtomicBool::new(true));

        let listener: AuthStateListener = Arc::new({
            let state = Arc::clone(&state);
            let mounted = Arc::clone(&mounted);
            move |event| {
                if !mounted.load(Ordering::SeqCst) {
                    return;
                }
                apply_auth_event(&state, event);
            }
        });
        let subscription = provider.on_auth_state_changed(listener);

        Self {
            provider,
            state,
            mounted,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// Stops listening; callbacks that arrive later are ignored.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        let subscription = lock_unpoisoned(&self.subscription).take();
        drop(subscription);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            receiver: self.state.subscribe(),
        }
    }

    pub fn session(&self) -> UserSession {
        self.state.borrow().clone()
    }

    /// Opens the provider popup with the account chooser.
    ///
    /// The session itself updates through the auth-state stream, not from the
    /// returned identity.
    pub async fn sign_in(&self) -> Result<Identity, SessionError> {
        tracing::info!("starting sign-in");
        match self
            .provider
            .sign_in_with_popup(SignInRequest::google_select_account())
            .await
        {
            Ok(identity) => {
                tracing::info!(email = ?identity.email, "sign-in successful");
                Ok(identity)
            }
            Err(error) => {
                tracing::error!(code = %error.code, %error, "sign-in error");
                Err(SessionError::classify(error))
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        match self.provider.sign_out().await {
            Ok(()) => {
                tracing::info!("signed out");
                Ok(())
            }
            Err(error) => {
                tracing::error!(code = %error.code, %error, "error signing out");
                Err(SessionError::Provider(error))
            }
        }
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn apply_auth_event(state: &watch::Sender<UserSession>, event: AuthStateEvent) {
    match event {
        AuthStateEvent::Changed(identity) => {
            tracing::info!(
                email = ?identity.as_ref().and_then(|identity| identity.email.as_deref()),
                "auth state changed"
            );
            state.send_modify(|session| {
                session.identity = identity;
                session.is_loading = false;
            });
        }
        AuthStateEvent::Error(error) => {
            tracing::error!(code = %error.code, %error, "auth state change error");
            state.send_modify(|session| session.is_loading = false);
        }
    }
}
