//! Root composition: the session gate in front of the editor shell.

use std::sync::Arc;

use identity_provider::IdentityProvider;

use crate::config::EnvConfig;
use crate::preview::Preview;
use crate::proxy_client::ProxyDiagramSource;
use crate::session::{SessionError, SessionGate, SessionHandle};
use crate::shell::EditorShell;

/// What the app shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loading,
    SignIn { error: Option<String> },
    Editor { email: Option<String>, preview: Preview },
}

pub struct App {
    gate: SessionGate,
    shell: EditorShell,
    sign_in_error: Option<String>,
}

impl App {
    pub fn new(gate: SessionGate, shell: EditorShell) -> Self {
        Self {
            gate,
            shell,
            sign_in_error: None,
        }
    }

    /// Wires the proxy-backed diagram source and flowchart renderer from env
    /// configuration.
    pub fn from_config(provider: Arc<dyn IdentityProvider>, config: &EnvConfig) -> Self {
        let source = Arc::new(ProxyDiagramSource::from_config(config));
        Self::new(
            SessionGate::mount(provider),
            EditorShell::with_flowchart_renderer(source),
        )
    }

    pub fn screen(&self) -> Screen {
        let session = self.gate.session();
        if session.is_loading {
            return Screen::Loading;
        }
        match session.identity {
            None => Screen::SignIn {
                error: self.sign_in_error.clone(),
            },
            Some(identity) => Screen::Editor {
                email: identity.email,
                preview: self.shell.preview().clone(),
            },
        }
    }

    /// Runs the popup sign-in, keeping the failure message for the sign-in
    /// screen.
    pub async fn sign_in(&mut self) {
        self.sign_in_error = None;
        if let Err(error) = self.gate.sign_in().await {
            self.sign_in_error = Some(error.to_string());
        }
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.gate.sign_out().await
    }

    pub fn session(&self) -> SessionHandle {
        self.gate.handle()
    }

    /// Editor input: replaces the document text.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.shell.set_markdown(text);
    }

    pub fn shell(&self) -> &EditorShell {
        &self.shell
    }

    pub fn sign_in_error(&self) -> Option<&str> {
        self.sign_in_error.as_deref()
    }
}
