//! [`DiagramRenderer`] backed by `mermaid_rs_renderer`.
//!
//! The library parses, lays out and draws the diagram. This adapter turns its
//! failures (errors, panics, empty flowcharts) into [`RenderError`]s and
//! scopes the SVG's ids under the element id so several diagrams can share
//! one page.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use mermaid_rs_renderer::{
    compute_layout, parse_mermaid, render_svg, DiagramKind, Graph, LayoutConfig, Theme,
};

use crate::panel::{DiagramRenderer, RenderError};

pub struct FlowchartRenderer {
    theme: Theme,
    layout: LayoutConfig,
}

impl FlowchartRenderer {
    pub fn new() -> Self {
        Self {
            theme: Theme::modern(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    fn parse_graph(&self, text: &str) -> Result<Graph, RenderError> {
        let parsed = guarded(|| parse_mermaid(text))?
            .map_err(|error| RenderError::new(format!("Parse error: {error}")))?;

        let graph = parsed.graph;
        if matches!(graph.kind, DiagramKind::Flowchart) && graph.nodes.is_empty() {
            return Err(RenderError::new("No diagram content detected"));
        }
        Ok(graph)
    }
}

impl Default for FlowchartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramRenderer for FlowchartRenderer {
    fn parse(&self, text: &str) -> Result<(), RenderError> {
        self.parse_graph(text).map(|_| ())
    }

    fn render(&self, element_id: &str, text: &str) -> Result<String, RenderError> {
        let graph = self.parse_graph(text)?;
        let svg = guarded(|| {
            let layout = compute_layout(&graph, &self.theme, &self.layout);
            render_svg(&layout, &self.theme, &self.layout)
        })?;
        scope_ids(element_id, &svg)
    }
}

/// Runs a library call, reporting a panic as a render failure.
fn guarded<T>(call: impl FnOnce() -> T) -> Result<T, RenderError> {
    panic::catch_unwind(AssertUnwindSafe(call)).map_err(|payload| {
        let message = panic_message(payload.as_ref());
        tracing::warn!(%message, "diagram renderer panicked");
        RenderError::new(format!("Render error: {message}"))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "renderer panicked"
    }
}

/// Prefixes every `id` and local reference with `element_id` and sets it as
/// the root id.
fn scope_ids(element_id: &str, svg: &str) -> Result<String, RenderError> {
    let id = escape_xml(element_id);
    let scoped = svg
        .replace(" id=\"", &format!(" id=\"{id}-"))
        .replace("url(#", &format!("url(#{id}-"))
        .replace("href=\"#", &format!("href=\"#{id}-"));

    let root = scoped
        .find("<svg")
        .ok_or_else(|| RenderError::new("renderer produced no <svg> element"))?;
    let open = root + "<svg".len();
    Ok(format!(
        "{}<svg id=\"{id}\"{}",
        &scoped[..root],
        &scoped[open..]
    ))
}

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
