//! Completion request handling
//!
//! Context detection and candidate building live in `org-analysis`; this
//! module converts candidates to wire items. Two shapes of item come out:
//! plain insertions at the cursor (ids, tags, files) and range edits that
//! replace the typed `#+begin_...` trigger (blocks, exports). The candidate
//! label always carries the full typed prefix so editors that filter
//! client-side against the label keep the items visible.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionTextEdit, Documentation, Position as LspPosition, Range as LspRange,
    TextEdit, Url,
};

use org_analysis::{completion_candidates, detect_context, CompletionCandidate};
use org_parser::ast::Position;

use crate::session::Session;

/// Build the completion list for a cursor position.
pub fn completion(session: &Session, uri: &Url, pos: Position) -> Vec<CompletionItem> {
    let Some(doc) = session.get(uri) else {
        return Vec::new();
    };
    let line = doc.line(pos.line);
    let Some(context) = detect_context(&doc.document, line, pos) else {
        return Vec::new();
    };
    let processed = session.processed();
    let candidates = completion_candidates(&context, &processed, session.root());

    let replace_range = context.replace_from.map(|from| LspRange {
        start: LspPosition::new(pos.line as u32, from as u32),
        end: LspPosition::new(pos.line as u32, pos.column as u32),
    });

    candidates
        .into_iter()
        .map(|candidate| to_item(candidate, replace_range))
        .collect()
}

fn to_item(candidate: CompletionCandidate, replace_range: Option<LspRange>) -> CompletionItem {
    let CompletionCandidate {
        label,
        detail,
        kind,
        insert_text,
        documentation,
    } = candidate;
    let mut item = CompletionItem {
        label,
        detail,
        kind: Some(kind),
        documentation: documentation.map(Documentation::String),
        ..CompletionItem::default()
    };
    match replace_range {
        Some(range) => {
            item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
                range,
                new_text: insert_text,
            }));
        }
        None => item.insert_text = Some(insert_text),
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn workspace_session() -> (tempfile::TempDir, Session) {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("target.org"),
            "* Target Heading\n:PROPERTIES:\n:ID: 22222222-2222-2222-2222-222222222222\n:END:\n",
        )
        .expect("write");
        let mut session = Session::new();
        session.set_root(dir.path().to_path_buf());
        (dir, session)
    }

    fn open(session: &mut Session, dir: &std::path::Path, text: &str) -> Url {
        let uri = Url::from_file_path(dir.join("open.org")).expect("uri");
        session.open(uri.clone(), text.to_string(), 1);
        uri
    }

    #[test]
    fn id_completion_with_filter_appends_brackets() {
        let (dir, mut session) = workspace_session();
        let uri = open(&mut session, dir.path(), "[[id:Target");
        let items = completion(&session, &uri, Position::new(0, 11));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Target Heading");
        assert_eq!(
            items[0].insert_text.as_deref(),
            Some("22222222-2222-2222-2222-222222222222]]")
        );
    }

    #[test]
    fn closed_brackets_suppress_suffix() {
        let (dir, mut session) = workspace_session();
        let uri = open(&mut session, dir.path(), "[[id:]]");
        let items = completion(&session, &uri, Position::new(0, 5));
        assert!(!items.is_empty());
        for item in &items {
            let insert = item.insert_text.as_deref().expect("insert text");
            assert!(!insert.ends_with("]]"), "{insert} must not close again");
        }
    }

    #[test]
    fn block_completion_replaces_typed_prefix() {
        let (dir, mut session) = workspace_session();
        let uri = open(&mut session, dir.path(), "#+begin_sr");
        let items = completion(&session, &uri, Position::new(0, 10));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "#+begin_src");
        let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit else {
            panic!("expected range edit");
        };
        assert_eq!(edit.range.start.character, 0);
        assert_eq!(edit.range.end.character, 10);
        assert_eq!(edit.new_text, "#+begin_src\n\n#+end_src");
    }

    #[test]
    fn no_context_no_items() {
        let (dir, mut session) = workspace_session();
        let uri = open(&mut session, dir.path(), "plain words");
        assert!(completion(&session, &uri, Position::new(0, 5)).is_empty());
    }
}
