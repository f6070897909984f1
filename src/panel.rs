//! Per-section diagram panel.
//!
//! A panel is bound to a copy of one section's content. Generating a diagram
//! sends that content to a [`DiagramSource`], then parses and renders the
//! returned text with a [`DiagramRenderer`]. Panels never share state.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::diagram_text::strip_preamble;

/// Shown while an attempt is in flight.
pub const PLACEHOLDER_TEXT: &str = "Generating diagram...";

pub const IDLE_BUTTON_LABEL: &str = "Generate Diagram";
pub const BUSY_BUTTON_LABEL: &str = "Generating...";

/// Failure fetching diagram text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The endpoint answered with an error payload or a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Transport(String),

    #[error("invalid diagram response: {0}")]
    Decode(String),
}

/// Failure parsing or rendering diagram text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Produces diagram text for a block of section content.
#[async_trait]
pub trait DiagramSource: Send + Sync + 'static {
    async fn generate(&self, content: &str) -> Result<String, SourceError>;
}

/// Diagram rendering library seam.
pub trait DiagramRenderer: Send + Sync + 'static {
    /// Validates `text` without producing output.
    fn parse(&self, text: &str) -> Result<(), RenderError>;

    /// Renders `text` to inline markup whose root element carries `element_id`.
    fn render(&self, element_id: &str, text: &str) -> Result<String, RenderError>;
}

/// What the panel's diagram area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelOutput {
    #[default]
    Empty,
    Placeholder,
    /// Rendered diagram markup.
    Rendered(String),
    /// Raw diagram text, shown preformatted after a render failure.
    Fallback(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelState {
    pub output: PanelOutput,
    pub diagram_text: Option<String>,
    pub error: Option<String>,
    pub busy: bool,
}

#[derive(Clone)]
pub struct DiagramPanel {
    content: Arc<Mutex<String>>,
    state: Arc<Mutex<PanelState>>,
    source: Arc<dyn DiagramSource>,
    renderer: Arc<dyn DiagramRenderer>,
}

impl DiagramPanel {
    pub fn new(
        content: impl Into<String>,
        source: Arc<dyn DiagramSource>,
        renderer: Arc<dyn DiagramRenderer>,
    ) -> Self {
        Self {
            content: Arc::new(Mutex::new(content.into())),
            state: Arc::new(Mutex::new(PanelState::default())),
            source,
            renderer,
        }
    }

    pub fn content(&self) -> String {
        lock_unpoisoned(&self.content).clone()
    }

    /// Points the panel at new content without touching its state.
    pub fn rebind(&self, content: impl Into<String>) {
        *lock_unpoisoned(&self.content) = content.into();
    }

    pub fn snapshot(&self) -> PanelState {
        lock_unpoisoned(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        lock_unpoisoned(&self.state).busy
    }

    pub fn button_label(&self) -> &'static str {
        if self.is_busy() {
            BUSY_BUTTON_LABEL
        } else {
            IDLE_BUTTON_LABEL
        }
    }

    /// Button press: runs an attempt unless one is already in flight.
    ///
    /// Returns `false` when the press was ignored.
    pub async fn trigger(&self) -> bool {
        if !self.begin_attempt(true) {
            return false;
        }
        self.run_attempt().await;
        true
    }

    /// Runs one attempt unconditionally.
    ///
    /// Overlapping attempts are not cancelled; whichever settles last
    /// determines the final state.
    pub async fn generate(&self) {
        self.begin_attempt(false);
        self.run_attempt().await;
    }

    fn begin_attempt(&self, refuse_if_busy: bool) -> bool {
        let mut state = lock_unpoisoned(&self.state);
        if refuse_if_busy && state.busy {
            return false;
        }
        *state = PanelState {
            output: PanelOutput::Placeholder,
            diagram_text: None,
            error: None,
            busy: true,
        };
        true
    }

    async fn run_attempt(&self) {
        let content = self.content();
        tracing::debug!(content_len = content.len(), "requesting diagram");

        let settled = match self.source.generate(&content).await {
            Ok(text) => self.render_text(text),
            Err(error) => {
                tracing::warn!(%error, "diagram generation failed");
                PanelState {
                    output: PanelOutput::Empty,
                    diagram_text: None,
                    error: Some(format!("Error generating diagram: {error}")),
                    busy: false,
                }
            }
        };

        *lock_unpoisoned(&self.state) = settled;
    }

    fn render_text(&self, text: String) -> PanelState {
        if text.trim().is_empty() {
            return PanelState::default();
        }

        let cleaned = strip_preamble(&text);
        let element_id = format!("diagram-{}", Uuid::new_v4().simple());
        let rendered = self
            .renderer
            .parse(cleaned)
            .and_then(|()| self.renderer.render(&element_id, cleaned));

        match rendered {
            Ok(markup) => PanelState {
                output: PanelOutput::Rendered(markup),
                diagram_text: Some(text),
                error: None,
                busy: false,
            },
            Err(error) => {
                tracing::warn!(%error, "diagram rendering failed");
                PanelState {
                    output: PanelOutput::Fallback(text.clone()),
                    diagram_text: Some(text),
                    error: Some(format!("Error rendering diagram: {error}")),
                    busy: false,
                }
            }
        }
    }
}

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
