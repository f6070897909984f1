//! Editor/preview shell: raw text in, sections, preview and panels out.

use std::collections::HashMap;
use std::sync::Arc;

use crate::flowchart::FlowchartRenderer;
use crate::panel::{DiagramPanel, DiagramRenderer, DiagramSource, PanelState};
use crate::preview::{render_preview, DiagramSlot, Preview};
use crate::sections::{parse_sections, Section, SectionIndex};

/// Panels are keyed by heading text and the slot's occurrence among
/// same-named headings.
type PanelKey = (String, usize);

/// Owns the document text and one [`DiagramPanel`] per preview slot.
pub struct EditorShell {
    markdown: String,
    sections: Vec<Section>,
    index: SectionIndex,
    preview: Preview,
    panels: HashMap<PanelKey, DiagramPanel>,
    source: Arc<dyn DiagramSource>,
    renderer: Arc<dyn DiagramRenderer>,
}

impl EditorShell {
    pub fn new(source: Arc<dyn DiagramSource>, renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            markdown: String::new(),
            sections: Vec::new(),
            index: SectionIndex::default(),
            preview: Preview::default(),
            panels: HashMap::new(),
            source,
            renderer,
        }
    }

    /// Shell that renders diagrams with [`FlowchartRenderer`].
    pub fn with_flowchart_renderer(source: Arc<dyn DiagramSource>) -> Self {
        Self::new(source, Arc::new(FlowchartRenderer::new()))
    }

    /// Replaces the document and re-derives sections, preview and panels.
    ///
    /// Panels whose slot survives keep their state and see the new content;
    /// panels for slots that vanished are dropped.
    pub fn set_markdown(&mut self, text: impl Into<String>) {
        self.markdown = text.into();
        self.sections = parse_sections(&self.markdown);
        self.index = SectionIndex::build(&self.sections);
        self.preview = render_preview(&self.markdown, &self.index);

        let mut panels = HashMap::with_capacity(self.panels.len());
        for slot in self.preview.slots() {
            let key = (slot.heading.clone(), slot.occurrence);
            let panel = match self.panels.remove(&key) {
                Some(panel) => {
                    panel.rebind(slot.content.clone());
                    panel
                }
                None => DiagramPanel::new(
                    slot.content.clone(),
                    Arc::clone(&self.source),
                    Arc::clone(&self.renderer),
                ),
            };
            panels.insert(key, panel);
        }
        self.panels = panels;

        tracing::trace!(
            sections = self.sections.len(),
            panels = self.panels.len(),
            "document re-parsed"
        );
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn index(&self) -> &SectionIndex {
        &self.index
    }

    /// Panel for the first slot titled `heading`. Cloning the returned panel
    /// shares its state.
    pub fn panel(&self, heading: &str) -> Option<&DiagramPanel> {
        self.panel_at(heading, 0)
    }

    /// Panel for the `occurrence`-th slot titled `heading`.
    pub fn panel_at(&self, heading: &str, occurrence: usize) -> Option<&DiagramPanel> {
        self.panels.get(&(heading.to_string(), occurrence))
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Preview markup with every panel's current state inlined.
    pub fn preview_html(&self) -> String {
        self.preview.to_html(|slot| self.panel_state(slot))
    }

    fn panel_state(&self, slot: &DiagramSlot) -> Option<PanelState> {
        self.panel_at(&slot.heading, slot.occurrence)
            .map(DiagramPanel::snapshot)
    }
}
