//! Cleanup of model output into a single flowchart declaration.

use std::sync::OnceLock;

use regex::Regex;

/// Keyword every cleaned diagram starts with.
pub const FLOWCHART_KEYWORD: &str = "flowchart";

/// Declaration used when the model omitted one.
pub const DEFAULT_DECLARATION: &str = "flowchart LR";

fn code_fence_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| Regex::new(r"`{3,}(?:mermaid)?").expect("fence regex must compile"))
}

fn preamble_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)^(?:Here is |This is |The )?(?:[a-zA-Z\s]+)?diagram:?\s*")
            .expect("preamble regex must compile")
    })
}

fn declaration_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"flowchart\s+(?:LR|RL|TB|TD|BT)\b").expect("declaration regex must compile")
    })
}

/// Turns raw model output into diagram text with exactly one leading
/// `flowchart` declaration.
///
/// Applying it twice gives the same result as applying it once.
pub fn clean_model_output(raw: &str) -> String {
    let without_fences = code_fence_regex().replace_all(raw.trim(), "");
    let text = strip_preamble(without_fences.trim());
    let text = collapse_declarations(text).trim();

    if text.is_empty() {
        DEFAULT_DECLARATION.to_string()
    } else if text.starts_with(FLOWCHART_KEYWORD) {
        text.to_string()
    } else {
        format!("{DEFAULT_DECLARATION}\n{text}")
    }
}

/// Drops a leading "Here is the diagram:"-style clause.
///
/// Text that already opens with `flowchart` is returned unchanged so node
/// names containing "diagram" survive.
pub fn strip_preamble(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with(FLOWCHART_KEYWORD) {
        return text;
    }
    match preamble_regex().find(text) {
        Some(found) => text[found.end()..].trim(),
        None => text,
    }
}

/// Keeps the final `flowchart <dir>` declaration and everything after it.
fn collapse_declarations(text: &str) -> &str {
    match declaration_regex().find_iter(text).last() {
        Some(last) => &text[last.start()..],
        None => text,
    }
}
