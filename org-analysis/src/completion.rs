//! Context-aware completion
//!
//! Completion runs in two steps. [`detect_context`] classifies the cursor
//! from the raw line text (the AST drops partially-typed constructs, so the
//! detector never consults it except for the headline-tag rule):
//!
//! - on a headline's first line past column 1 → tag completion;
//! - after `#+begin_export_` → export block types;
//! - after `#+begin_` → block types;
//! - after `[[file:` → workspace file paths;
//! - after `[[id:` → indexed headings.
//!
//! The first rule that matches wins. [`completion_candidates`] then builds
//! protocol-agnostic candidates from the scanner's indexes; the LSP layer
//! converts them to wire items.
//!
//! A context is "already closed" only when the literal `]]` sits
//! immediately after the cursor; whitespace before the brackets counts as
//! open and completions then append their own `]]`.

use std::path::Path;

use lsp_types::CompletionItemKind;

use org_parser::ast::{Document, NodeKind, Position};

use crate::navigator::find_node_at;
use crate::scanner::{ProcessedFiles, PREVIEW_LINES};

/// Block types offered after `#+begin_`.
pub const BLOCK_TYPES: &[&str] = &["center", "comment", "example", "quote", "src", "verse"];

/// Export backends offered after `#+begin_export_`.
pub const EXPORT_TYPES: &[&str] = &["ascii", "html", "latex"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionContext {
    Id,
    Tag,
    File,
    Block,
    Export,
}

/// What the detector saw at the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedContext {
    pub context: CompletionContext,
    /// Text the user typed after the trigger, used for filtering.
    pub filter: String,
    /// Whether inserted link targets must append their own `]]`.
    pub needs_closing_bracket: bool,
    /// Column where the typed trigger begins, for contexts whose edit
    /// replaces the trigger text instead of inserting at the cursor.
    pub replace_from: Option<usize>,
}

/// A completion suggestion with display metadata. Maps to an LSP
/// `CompletionItem` but stays protocol-agnostic; the server layer converts.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCandidate {
    pub label: String,
    pub detail: Option<String>,
    pub kind: CompletionItemKind,
    pub insert_text: String,
    pub documentation: Option<String>,
}

/// Classify the cursor context from the document and the raw line text.
pub fn detect_context(document: &Document, line: &str, pos: Position) -> Option<DetectedContext> {
    // Tags live at the end of the headline's own line.
    if pos.column > 1 {
        if let Some(headline) = find_node_at(document, NodeKind::Headline, pos) {
            if headline.range().start.line == pos.line {
                return Some(DetectedContext {
                    context: CompletionContext::Tag,
                    filter: String::new(),
                    needs_closing_bracket: false,
                    replace_from: None,
                });
            }
        }
    }

    let mut cursor = pos.column.min(line.len());
    while cursor > 0 && !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let before = &line[..cursor];
    let after = &line[cursor..];
    let needs_closing_bracket = !after.starts_with("]]");

    let trimmed = before.trim_start();
    let indent = before.len() - trimmed.len();
    if let Some(filter) = trimmed.strip_prefix("#+begin_export_") {
        return Some(DetectedContext {
            context: CompletionContext::Export,
            filter: filter.to_string(),
            needs_closing_bracket: false,
            replace_from: Some(indent),
        });
    }
    if let Some(filter) = trimmed.strip_prefix("#+begin_") {
        return Some(DetectedContext {
            context: CompletionContext::Block,
            filter: filter.to_string(),
            needs_closing_bracket: false,
            replace_from: Some(indent),
        });
    }
    if let Some(idx) = before.rfind("[[file:") {
        return Some(DetectedContext {
            context: CompletionContext::File,
            filter: before[idx + "[[file:".len()..].to_string(),
            needs_closing_bracket,
            replace_from: None,
        });
    }
    if let Some(idx) = before.rfind("[[id:") {
        return Some(DetectedContext {
            context: CompletionContext::Id,
            filter: before[idx + "[[id:".len()..].to_lowercase(),
            needs_closing_bracket,
            replace_from: None,
        });
    }
    None
}

/// Build the candidate list for a detected context.
pub fn completion_candidates(
    context: &DetectedContext,
    processed: &ProcessedFiles,
    root: Option<&Path>,
) -> Vec<CompletionCandidate> {
    match context.context {
        CompletionContext::Id => id_candidates(context, processed, root),
        CompletionContext::Tag => tag_candidates(processed),
        CompletionContext::File => file_candidates(context, processed),
        CompletionContext::Block => block_candidates(context),
        CompletionContext::Export => export_candidates(context),
    }
}

fn closing(context: &DetectedContext) -> &'static str {
    if context.needs_closing_bracket {
        "]]"
    } else {
        ""
    }
}

fn id_candidates(
    context: &DetectedContext,
    processed: &ProcessedFiles,
    root: Option<&Path>,
) -> Vec<CompletionCandidate> {
    let mut items: Vec<CompletionCandidate> = processed
        .uuid_index
        .iter()
        .filter(|entry| {
            context.filter.is_empty()
                || entry.value().title.to_lowercase().contains(&context.filter)
        })
        .map(|entry| {
            let location = entry.value();
            CompletionCandidate {
                label: location.title.clone(),
                detail: Some(location.file.display().to_string()),
                kind: CompletionItemKind::REFERENCE,
                insert_text: format!("{}{}", entry.key(), closing(context)),
                documentation: root.and_then(|root| {
                    heading_window(&root.join(&location.file), location.range.start.line)
                }),
            }
        })
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

fn tag_candidates(processed: &ProcessedFiles) -> Vec<CompletionCandidate> {
    let mut tags: Vec<String> = processed
        .tag_map
        .iter()
        .map(|entry| entry.key().clone())
        .collect();
    tags.sort();
    tags.into_iter()
        .map(|tag| CompletionCandidate {
            label: tag.clone(),
            detail: Some("workspace tag".to_string()),
            kind: CompletionItemKind::KEYWORD,
            insert_text: format!("{tag}:"),
            documentation: None,
        })
        .collect()
}

fn file_candidates(
    context: &DetectedContext,
    processed: &ProcessedFiles,
) -> Vec<CompletionCandidate> {
    let filter = context.filter.to_lowercase();
    let mut items: Vec<CompletionCandidate> = processed
        .files
        .iter()
        .filter(|entry| {
            filter.is_empty()
                || entry
                    .key()
                    .display()
                    .to_string()
                    .to_lowercase()
                    .contains(&filter)
        })
        .map(|entry| {
            let path = entry.key().display().to_string();
            CompletionCandidate {
                label: path.clone(),
                detail: Some(entry.value().title.clone()),
                kind: CompletionItemKind::FILE,
                insert_text: format!("{}{}", path, closing(context)),
                documentation: Some(entry.value().preview.clone()),
            }
        })
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

fn block_candidates(context: &DetectedContext) -> Vec<CompletionCandidate> {
    BLOCK_TYPES
        .iter()
        .filter(|name| context.filter.is_empty() || name.starts_with(&context.filter))
        .map(|name| CompletionCandidate {
            // The label carries the whole trigger so client-side prefix
            // filtering against what the user typed still matches.
            label: format!("#+begin_{name}"),
            detail: Some("block".to_string()),
            kind: CompletionItemKind::SNIPPET,
            insert_text: format!("#+begin_{name}\n\n#+end_{name}"),
            documentation: None,
        })
        .collect()
}

fn export_candidates(context: &DetectedContext) -> Vec<CompletionCandidate> {
    EXPORT_TYPES
        .iter()
        .filter(|name| context.filter.is_empty() || name.starts_with(&context.filter))
        .map(|name| CompletionCandidate {
            label: format!("#+begin_export_{name}"),
            detail: Some("export block".to_string()),
            kind: CompletionItemKind::SNIPPET,
            insert_text: format!("#+begin_export_{name}\n\n#+end_export"),
            documentation: None,
        })
        .collect()
}

/// The heading line plus the next few lines of the target file.
fn heading_window(path: &Path, line: usize) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let lines: Vec<&str> = text.lines().skip(line).take(PREVIEW_LINES).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
