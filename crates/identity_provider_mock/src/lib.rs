//! Deterministic mock implementation of the `identity_provider` contract.
//!
//! Nothing here talks to a real provider. Tests script sign-in and sign-out
//! outcomes up front and drive the auth-state stream by hand.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use identity_provider::{
    AuthStateEvent, AuthStateListener, Identity, IdentityProvider, ProviderError, SignInRequest,
    Subscription,
};

/// Uid used by [`MockIdentityProvider::default_identity`].
pub const MOCK_UID: &str = "mock-uid";

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: BTreeMap<u64, AuthStateListener>,
}

/// Scriptable provider used by session and app tests.
///
/// The initial auth state is not delivered on subscription unless
/// [`MockIdentityProvider::with_immediate_state`] is set. Call
/// [`MockIdentityProvider::emit_current`] to resolve it later.
pub struct MockIdentityProvider {
    listeners: Arc<Mutex<ListenerTable>>,
    current: Mutex<Option<Identity>>,
    immediate_state: bool,
    sign_in_outcomes: Mutex<VecDeque<Result<Identity, ProviderError>>>,
    sign_out_outcomes: Mutex<VecDeque<Result<(), ProviderError>>>,
    sign_in_requests: Mutex<Vec<SignInRequest>>,
    sign_out_calls: Mutex<usize>,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(ListenerTable::default())),
            current: Mutex::new(None),
            immediate_state: false,
            sign_in_outcomes: Mutex::new(VecDeque::new()),
            sign_out_outcomes: Mutex::new(VecDeque::new()),
            sign_in_requests: Mutex::new(Vec::new()),
            sign_out_calls: Mutex::new(0),
        }
    }

    /// Starts signed in as `identity`.
    #[must_use]
    pub fn with_identity(self, identity: Identity) -> Self {
        *lock_unpoisoned(&self.current) = Some(identity);
        self
    }

    /// Delivers the current state synchronously inside `on_auth_state_changed`.
    #[must_use]
    pub fn with_immediate_state(mut self) -> Self {
        self.immediate_state = true;
        self
    }

    #[must_use]
    pub fn default_identity() -> Identity {
        Identity::new(MOCK_UID)
            .with_email("writer@example.com")
            .with_display_name("Mock Writer")
    }

    /// Queues the outcome of the next `sign_in_with_popup` call.
    ///
    /// With an empty queue, sign-in succeeds as [`Self::default_identity`].
    pub fn script_sign_in(&self, outcome: Result<Identity, ProviderError>) {
        lock_unpoisoned(&self.sign_in_outcomes).push_back(outcome);
    }

    /// Queues the outcome of the next `sign_out` call. Empty queue means success.
    pub fn script_sign_out(&self, outcome: Result<(), ProviderError>) {
        lock_unpoisoned(&self.sign_out_outcomes).push_back(outcome);
    }

    /// Delivers the current identity to every listener.
    pub fn emit_current(&self) {
        let current = lock_unpoisoned(&self.current).clone();
        self.emit(AuthStateEvent::Changed(current));
    }

    /// Delivers `event` to every listener, updating the current identity on
    /// `Changed`.
    pub fn emit(&self, event: AuthStateEvent) {
        if let AuthStateEvent::Changed(identity) = &event {
            *lock_unpoisoned(&self.current) = identity.clone();
        }

        let listeners: Vec<AuthStateListener> = lock_unpoisoned(&self.listeners)
            .entries
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    pub fn emit_error(&self, error: ProviderError) {
        self.emit(AuthStateEvent::Error(error));
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        lock_unpoisoned(&self.current).clone()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock_unpoisoned(&self.listeners).entries.len()
    }

    #[must_use]
    pub fn sign_in_requests(&self) -> Vec<SignInRequest> {
        lock_unpoisoned(&self.sign_in_requests).clone()
    }

    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        *lock_unpoisoned(&self.sign_out_calls)
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        let id = {
            let mut table = lock_unpoisoned(&self.listeners);
            let id = table.next_id;
            table.next_id += 1;
            table.entries.insert(id, Arc::clone(&listener));
            id
        };

        if self.immediate_state {
            listener(AuthStateEvent::Changed(self.current_identity()));
        }

        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                lock_unpoisoned(&listeners).entries.remove(&id);
            }
        })
    }

    async fn sign_in_with_popup(&self, request: SignInRequest) -> Result<Identity, ProviderError> {
        lock_unpoisoned(&self.sign_in_requests).push(request);

        let outcome = lock_unpoisoned(&self.sign_in_outcomes)
            .pop_front()
            .unwrap_or_else(|| Ok(Self::default_identity()));

        if let Ok(identity) = &outcome {
            self.emit(AuthStateEvent::Changed(Some(identity.clone())));
        }
        outcome
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        *lock_unpoisoned(&self.sign_out_calls) += 1;

        let outcome = lock_unpoisoned(&self.sign_out_outcomes)
            .pop_front()
            .unwrap_or(Ok(()));

        if outcome.is_ok() {
            self.emit(AuthStateEvent::Changed(None));
        }
        outcome
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
