//! Hierarchical outline symbols

use tower_lsp::lsp_types::{DocumentSymbol, SymbolKind, Url};

use org_parser::ast::{Document, Section};

use crate::convert::to_lsp_range;
use crate::session::Session;

/// Map a heading level to a symbol kind so editors show a varied outline.
pub fn symbol_kind_for_level(level: usize) -> SymbolKind {
    match level {
        1 => SymbolKind::NAMESPACE,
        2 => SymbolKind::CLASS,
        3 => SymbolKind::METHOD,
        4 => SymbolKind::PROPERTY,
        _ => SymbolKind::FIELD,
    }
}

/// One symbol per outline section, nested like the sections themselves.
pub fn document_symbols(session: &Session, uri: &Url) -> Option<Vec<DocumentSymbol>> {
    let doc = session.get(uri)?;
    Some(
        doc.document
            .outline
            .iter()
            .map(|section| symbol_for(&doc.document, section))
            .collect(),
    )
}

#[allow(deprecated)]
fn symbol_for(document: &Document, section: &Section) -> DocumentSymbol {
    let headline = document.headline(&section.path);
    let name = headline
        .map(|headline| headline.title_text())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Heading".to_string());
    let detail = headline.and_then(|headline| {
        if headline.tags.is_empty() {
            None
        } else {
            Some(format!(":{}:", headline.tags.join(":")))
        }
    });
    let selection_range = headline
        .map(|headline| {
            let mut line_range = headline.range;
            line_range.end = headline
                .title
                .last()
                .map(|node| node.range().end)
                .unwrap_or(line_range.start);
            line_range.end.line = line_range.start.line;
            to_lsp_range(line_range)
        })
        .unwrap_or_else(|| to_lsp_range(section.range));
    let children: Vec<DocumentSymbol> = section
        .children
        .iter()
        .map(|child| symbol_for(document, child))
        .collect();
    DocumentSymbol {
        name,
        detail,
        kind: symbol_kind_for_level(section.level),
        tags: None,
        deprecated: None,
        range: to_lsp_range(section.range),
        selection_range,
        children: if children.is_empty() {
            None
        } else {
            Some(children)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(text: &str) -> (Session, Url) {
        let mut session = Session::new();
        let uri = Url::parse("file:///tmp/outline.org").expect("uri");
        session.open(uri.clone(), text.to_string(), 1);
        (session, uri)
    }

    #[test]
    fn builds_nested_outline() {
        let (session, uri) = session_with(
            "* Top :alpha:beta:\nbody\n** Child\n*** Grandchild\n* Second\n",
        );
        let symbols = document_symbols(&session, &uri).expect("symbols");
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].name, "Top");
        assert_eq!(symbols[0].detail.as_deref(), Some(":alpha:beta:"));
        assert_eq!(symbols[0].kind, SymbolKind::NAMESPACE);

        let child = &symbols[0].children.as_ref().expect("children")[0];
        assert_eq!(child.name, "Child");
        assert_eq!(child.kind, SymbolKind::CLASS);
        let grandchild = &child.children.as_ref().expect("grandchildren")[0];
        assert_eq!(grandchild.kind, SymbolKind::METHOD);
    }

    #[test]
    fn ranges_cover_section_and_selection_covers_headline_line() {
        let (session, uri) = session_with("* Top\nbody\nmore\n* Next\n");
        let symbols = document_symbols(&session, &uri).expect("symbols");
        let top = &symbols[0];
        assert_eq!(top.range.start.line, 0);
        assert_eq!(top.range.end.line, 2);
        assert_eq!(top.selection_range.start.line, 0);
        assert_eq!(top.selection_range.end.line, 0);
    }

    #[test]
    fn deep_levels_map_to_field() {
        assert_eq!(symbol_kind_for_level(5), SymbolKind::FIELD);
        assert_eq!(symbol_kind_for_level(9), SymbolKind::FIELD);
    }

    #[test]
    fn missing_document_yields_none() {
        let session = Session::new();
        let uri = Url::parse("file:///tmp/none.org").expect("uri");
        assert!(document_symbols(&session, &uri).is_none());
    }
}
