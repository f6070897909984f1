//! Markdown authoring core.
//!
//! A document is split into heading-keyed sections; the preview renders the
//! markdown and attaches a diagram panel after each level-1/level-2 heading.
//! Panels ask the diagram proxy for flowchart text and render it to inline
//! SVG. A session gate keeps the editor behind federated sign-in.
//!
//! # Public API Overview
//! - [`parse_sections`] and [`SectionIndex`] derive sections from raw text.
//! - [`clean_model_output`] normalizes model replies to one flowchart declaration.
//! - [`DiagramPanel`] runs generation attempts over a [`DiagramSource`] and
//!   [`DiagramRenderer`]; [`ProxyDiagramSource`] and [`FlowchartRenderer`] are
//!   the production implementations.
//! - [`EditorShell`] owns the document, the preview and one panel per preview slot.
//! - [`SessionGate`] and [`App`] put the shell behind sign-in.

pub mod app;
pub mod config;
pub mod diagram_text;
pub mod flowchart;
pub mod logging;
pub mod panel;
pub mod preview;
pub mod proxy_client;
pub mod sections;
pub mod session;
pub mod shell;

pub use crate::app::{App, Screen};
pub use crate::config::EnvConfig;
pub use crate::diagram_text::{clean_model_output, strip_preamble};
pub use crate::flowchart::FlowchartRenderer;
pub use crate::panel::{
    DiagramPanel, DiagramRenderer, DiagramSource, PanelOutput, PanelState, RenderError,
    SourceError,
};
pub use crate::preview::{render_preview, DiagramSlot, Preview, PreviewBlock};
pub use crate::proxy_client::ProxyDiagramSource;
pub use crate::sections::{parse_sections, Section, SectionId, SectionIndex};
pub use crate::session::{SessionError, SessionGate, SessionHandle, UserSession};
pub use crate::shell::EditorShell;
