//! Markdown preview with diagram slots after level-1 and level-2 headings.

use std::collections::HashMap;
use std::fmt::Write as _;

use markdown::{mdast, to_html_with_options, to_mdast, Options, ParseOptions};

use crate::flowchart::escape_xml;
use crate::panel::{PanelOutput, PanelState, PLACEHOLDER_TEXT};
use crate::sections::SectionIndex;

/// Where a diagram panel attaches in the preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSlot {
    pub heading: String,
    pub depth: u8,
    /// How many earlier slots share this heading.
    pub occurrence: usize,
    /// Copy of the section content at render time.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewBlock {
    Html(String),
    Diagram(DiagramSlot),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Preview {
    pub blocks: Vec<PreviewBlock>,
}

impl Preview {
    pub fn slots(&self) -> impl Iterator<Item = &DiagramSlot> {
        self.blocks.iter().filter_map(|block| match block {
            PreviewBlock::Diagram(slot) => Some(slot),
            PreviewBlock::Html(_) => None,
        })
    }

    /// Full preview markup with each slot's panel state inlined.
    pub fn to_html<F>(&self, panel_state: F) -> String
    where
        F: Fn(&DiagramSlot) -> Option<PanelState>,
    {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                PreviewBlock::Html(html) => out.push_str(html),
                PreviewBlock::Diagram(slot) => {
                    let state = panel_state(slot).unwrap_or_default();
                    write_panel(&mut out, slot, &state);
                }
            }
        }
        out
    }
}

/// Renders `text` and attaches a slot after each level-1/level-2 heading whose
/// plain text is an indexed section heading.
pub fn render_preview(text: &str, index: &SectionIndex) -> Preview {
    let html = match to_html_with_options(text, &Options::gfm()) {
        Ok(html) => html,
        Err(error) => {
            tracing::debug!(%error, "gfm render failed; using commonmark");
            markdown::to_html(text)
        }
    };

    let headings = match to_mdast(text, &ParseOptions::gfm()) {
        Ok(root) => {
            let mut headings = Vec::new();
            collect_headings(&root, &mut headings);
            headings
        }
        Err(_) => Vec::new(),
    };

    let mut blocks = Vec::new();
    let mut emitted = 0;
    let mut search_from = 0;
    let mut headings = headings.into_iter();
    let mut seen: HashMap<String, usize> = HashMap::new();

    while let Some((tag_start, tag_len)) = next_heading_close(&html, search_from) {
        let block_end = tag_start + tag_len;
        search_from = block_end;

        let Some((depth, heading)) = headings.next() else {
            break;
        };
        let Some(section) = index.get(&heading) else {
            continue;
        };

        let occurrence = seen.entry(heading.clone()).or_default();
        let slot = DiagramSlot {
            occurrence: *occurrence,
            content: section.content.clone(),
            heading,
            depth,
        };
        *occurrence += 1;

        blocks.push(PreviewBlock::Html(html[emitted..block_end].to_string()));
        blocks.push(PreviewBlock::Diagram(slot));
        emitted = block_end;
    }

    if emitted < html.len() {
        blocks.push(PreviewBlock::Html(html[emitted..].to_string()));
    }

    Preview { blocks }
}

/// Depth-1/2 headings in document order, with their plain text.
fn collect_headings(node: &mdast::Node, out: &mut Vec<(u8, String)>) {
    if let mdast::Node::Heading(heading) = node {
        if heading.depth <= 2 {
            out.push((heading.depth, plain_text_from_nodes(&heading.children)));
        }
        return;
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_headings(child, out);
        }
    }
}

fn plain_text_from_nodes(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => out.push_str(&code.value),
            mdast::Node::Html(html) => out.push_str(&html.value),
            mdast::Node::Image(image) => out.push_str(&image.alt),
            mdast::Node::Break(_) => out.push('\n'),
            other => {
                if let Some(children) = other.children() {
                    out.push_str(&plain_text_from_nodes(children));
                }
            }
        }
    }
    out
}

/// Position and length of the next `</h1>` or `</h2>` at or after `from`.
///
/// Raw HTML is escaped by the renderer, so these tags only come from headings.
fn next_heading_close(html: &str, from: usize) -> Option<(usize, usize)> {
    let rest = &html[from..];
    let h1 = rest.find("</h1>");
    let h2 = rest.find("</h2>");
    let offset = match (h1, h2) {
        (Some(a), Some(b)) => a.min(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return None,
    };
    Some((from + offset, "</h1>".len()))
}

fn write_panel(out: &mut String, slot: &DiagramSlot, state: &PanelState) {
    let label = if state.busy {
        crate::panel::BUSY_BUTTON_LABEL
    } else {
        crate::panel::IDLE_BUTTON_LABEL
    };
    let disabled = if state.busy { " disabled" } else { "" };

    let _ = write!(
        out,
        "\n<div class=\"diagram-panel\" data-heading=\"{}\" data-occurrence=\"{}\">\n\
         <button type=\"button\" class=\"diagram-button\"{disabled}>{label}</button>\n",
        escape_xml(&slot.heading),
        slot.occurrence,
    );
    if let Some(error) = &state.error {
        let _ = writeln!(out, "<div class=\"diagram-error\">{}</div>", escape_xml(error));
    }

    out.push_str("<div class=\"diagram-output\">");
    match &state.output {
        PanelOutput::Empty => {}
        PanelOutput::Placeholder => out.push_str(PLACEHOLDER_TEXT),
        PanelOutput::Rendered(markup) => out.push_str(markup),
        PanelOutput::Fallback(text) => {
            let _ = write!(
                out,
                "<pre class=\"diagram-fallback\">{}</pre>",
                escape_xml(text)
            );
        }
    }
    out.push_str("</div>\n</div>\n");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{render_preview, DiagramSlot, PreviewBlock};
    use crate::panel::{PanelOutput, PanelState};
    use crate::sections::{parse_sections, SectionIndex};

    fn preview_of(text: &str) -> super::Preview {
        let index = SectionIndex::build(&parse_sections(text));
        render_preview(text, &index)
    }

    #[test]
    fn slots_follow_level_one_and_two_headings_only() {
        let preview = preview_of("# Title\nintro\n## Part\nbody\n### Detail\nmore");

        let slots: Vec<(&str, u8)> = preview
            .slots()
            .map(|slot| (slot.heading.as_str(), slot.depth))
            .collect();
        assert_eq!(slots, vec![("Title", 1), ("Part", 2)]);
    }

    #[test]
    fn slot_content_is_the_section_body() {
        let preview = preview_of("# Title\nintro line\n\n## Part\n- a\n- b");

        assert_eq!(
            preview.slots().cloned().collect::<Vec<_>>(),
            vec![
                DiagramSlot {
                    heading: "Title".to_string(),
                    depth: 1,
                    occurrence: 0,
                    content: "intro line".to_string(),
                },
                DiagramSlot {
                    heading: "Part".to_string(),
                    depth: 2,
                    occurrence: 0,
                    content: "- a\n- b".to_string(),
                },
            ]
        );
    }

    #[test]
    fn slot_is_placed_right_after_its_heading_block() {
        let preview = preview_of("# Title\nparagraph");

        match preview.blocks.as_slice() {
            [PreviewBlock::Html(head), PreviewBlock::Diagram(slot), PreviewBlock::Html(tail)] => {
                assert_eq!(head.trim(), "<h1>Title</h1>");
                assert_eq!(slot.heading, "Title");
                assert!(tail.contains("<p>paragraph</p>"));
            }
            other => panic!("unexpected blocks: {other:?}"),
        }
    }

    #[test]
    fn emphasized_heading_does_not_match_raw_section_heading() {
        // The section parser keeps the raw markup, so `**Bold**` does not
        // match the rendered plain text `Bold`.
        let preview = preview_of("# **Bold**\nbody");

        assert_eq!(preview.slots().count(), 0);
    }

    #[test]
    fn setext_headings_without_sections_get_no_slot() {
        let preview = preview_of("Title\n=====\nbody");

        assert_eq!(preview.slots().count(), 0);
        assert!(preview.to_html(|_| None).contains("<h1>Title</h1>"));
    }

    #[test]
    fn raw_html_headings_are_escaped_and_ignored() {
        let preview = preview_of("# Real\n<h2>Fake</h2>\ntext");

        assert_eq!(preview.slots().count(), 1);
    }

    #[test]
    fn to_html_inlines_panel_state() {
        let preview = preview_of("# A\nx\n## B\ny\n## C\nz");

        let html = preview.to_html(|slot| match slot.heading.as_str() {
            "A" => Some(PanelState {
                output: PanelOutput::Rendered("<svg id=\"diagram-1\"></svg>".to_string()),
                diagram_text: Some("flowchart LR".to_string()),
                error: None,
                busy: false,
            }),
            "B" => Some(PanelState {
                output: PanelOutput::Fallback("flowchart LR\nA<B".to_string()),
                diagram_text: Some("flowchart LR\nA<B".to_string()),
                error: Some("Error rendering diagram: bad".to_string()),
                busy: false,
            }),
            _ => Some(PanelState {
                output: PanelOutput::Placeholder,
                diagram_text: None,
                error: None,
                busy: true,
            }),
        });

        assert!(html.contains("<svg id=\"diagram-1\"></svg>"));
        assert!(html.contains("<pre class=\"diagram-fallback\">flowchart LR\nA&lt;B</pre>"));
        assert!(html.contains("<div class=\"diagram-error\">Error rendering diagram: bad</div>"));
        assert!(html.contains("disabled>Generating...</button>"));
        assert!(html.contains("Generating diagram..."));
        assert_eq!(html.matches("class=\"diagram-panel\"").count(), 3);
    }

    #[test]
    fn repeated_headings_get_distinct_occurrences() {
        let preview = preview_of("# Dup
first
# Other
x
# Dup
second");

        let slots: Vec<(&str, usize, &str)> = preview
            .slots()
            .map(|slot| (slot.heading.as_str(), slot.occurrence, slot.content.as_str()))
            .collect();
        assert_eq!(
            slots,
            vec![("Dup", 0, "second"), ("Other", 0, "x"), ("Dup", 1, "second")]
        );

        let html = preview.to_html(|_| None);
        assert!(html.contains("data-heading=\"Dup\" data-occurrence=\"1\""));
    }
}
