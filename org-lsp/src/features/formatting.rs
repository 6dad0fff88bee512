//! Document and range formatting
//!
//! Whole-document formatting parses the open text, runs the rewrite
//! pipeline and returns one edit replacing the full document; no partial
//! edits, so a failed format means no edit at all. Range formatting reuses
//! the whole-document result and slices out the requested line span.

use tower_lsp::lsp_types::{Position as LspPosition, Range as LspRange, TextEdit, Url};

use org_analysis::format_text;

use crate::session::Session;

/// Format the whole document. `None` when the document is not open; an
/// empty vector when it is already formatted.
pub fn formatting(session: &Session, uri: &Url) -> Option<Vec<TextEdit>> {
    let doc = session.get(uri)?;
    let formatted = format_text(&doc.text);
    if formatted == doc.text {
        return Some(Vec::new());
    }
    Some(vec![TextEdit {
        range: full_document_range(&doc.text),
        new_text: formatted,
    }])
}

/// Format a line span: slice the span out of the whole-document formatted
/// text and return one edit over the caller-supplied range.
pub fn range_formatting(session: &Session, uri: &Url, range: LspRange) -> Option<Vec<TextEdit>> {
    let doc = session.get(uri)?;
    let formatted = format_text(&doc.text);
    if formatted == doc.text {
        return Some(Vec::new());
    }
    let lines: Vec<&str> = formatted.lines().collect();
    if lines.is_empty() {
        return Some(Vec::new());
    }
    // A range stopping at column 0 of a later line does not include that
    // line, but it does swallow the previous line's newline; mirror both in
    // the replacement text.
    let ends_on_line_start = range.end.character == 0 && range.end.line > range.start.line;
    let mut last = range.end.line as usize;
    if ends_on_line_start {
        last -= 1;
    }
    let start = (range.start.line as usize).min(lines.len() - 1);
    let last = last.min(lines.len() - 1).max(start);
    let mut new_text = lines[start..=last].join("\n");
    if ends_on_line_start {
        new_text.push('\n');
    }
    Some(vec![TextEdit { range, new_text }])
}

fn full_document_range(text: &str) -> LspRange {
    let line_count = text.lines().count() as u32;
    LspRange {
        start: LspPosition::new(0, 0),
        end: LspPosition::new(line_count, 0),
    }
}
