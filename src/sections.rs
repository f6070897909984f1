//! Heading-keyed sections of a markdown document.

use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

/// Opaque per-parse section token. Never stable across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(Uuid);

impl SectionId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A heading line plus the body lines up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    pub heading: String,
    pub content: String,
}

/// Splits `text` into sections, one per heading line.
///
/// A heading line is any line starting with `#`. Lines before the first
/// heading are discarded, and a whitespace-only line directly above a heading
/// is dropped from the preceding section.
pub fn parse_sections(text: &str) -> Vec<Section> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut sections = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for (index, line) in lines.iter().copied().enumerate() {
        if is_heading_line(line) {
            if let Some((heading, body)) = current.take() {
                sections.push(finish_section(heading, &body));
            }
            current = Some((heading_text(line), Vec::new()));
            continue;
        }

        let Some((_, body)) = current.as_mut() else {
            continue;
        };

        let next_is_heading = lines
            .get(index + 1)
            .is_some_and(|next| is_heading_line(next));
        if line.trim().is_empty() && next_is_heading {
            continue;
        }
        body.push(line);
    }

    if let Some((heading, body)) = current {
        sections.push(finish_section(heading, &body));
    }

    sections
}

fn is_heading_line(line: &str) -> bool {
    line.starts_with('#')
}

fn finish_section(heading: String, body: &[&str]) -> Section {
    Section {
        id: SectionId::random(),
        heading,
        content: body.join("\n"),
    }
}

/// Heading text: the `#` run and one whitespace character after it removed.
///
/// Lines like `#tag` keep their text as written; a bare `#` keeps itself so
/// headings are never empty.
fn heading_text(line: &str) -> String {
    let rest = line.trim_start_matches('#');
    let mut chars = rest.chars();
    let stripped = match chars.next() {
        Some(ch) if ch.is_whitespace() => chars.as_str(),
        _ => line,
    };

    let stripped = stripped.trim_end();
    if stripped.is_empty() {
        line.trim().to_string()
    } else {
        stripped.to_string()
    }
}

/// Heading → section lookup for the current parse.
///
/// Duplicate heading text resolves to the last section registered; earlier
/// sections with the same heading are unreachable and reported by
/// [`SectionIndex::shadowed`].
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    by_heading: HashMap<String, Section>,
    order: Vec<String>,
    shadowed: Vec<String>,
}

impl SectionIndex {
    pub fn build(sections: &[Section]) -> Self {
        let mut index = Self::default();
        for section in sections {
            let previous = index
                .by_heading
                .insert(section.heading.clone(), section.clone());
            match previous {
                Some(_) => {
                    if !index.shadowed.contains(&section.heading) {
                        index.shadowed.push(section.heading.clone());
                    }
                }
                None => index.order.push(section.heading.clone()),
            }
        }

        if !index.shadowed.is_empty() {
            tracing::debug!(
                shadowed = ?index.shadowed,
                "duplicate section headings; last occurrence wins"
            );
        }
        index
    }

    pub fn get(&self, heading: &str) -> Option<&Section> {
        self.by_heading.get(heading)
    }

    /// Headings that occurred more than once, in order of first collision.
    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }

    /// Reachable headings in document order of first occurrence.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_heading.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_heading.is_empty()
    }
}
