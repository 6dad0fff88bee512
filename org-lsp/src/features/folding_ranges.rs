//! Folding ranges for sections, blocks and drawers

use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind, Url};

use org_parser::ast::{Node, NodeKind, Section};

use crate::session::Session;

/// Sections fold from the line after their headline to the section's end;
/// fenced blocks and drawers fold over their own line span.
pub fn folding_ranges(session: &Session, uri: &Url) -> Option<Vec<FoldingRange>> {
    let doc = session.get(uri)?;
    let mut ranges = Vec::new();
    for section in &doc.document.outline {
        collect_sections(section, &mut ranges);
    }
    for node in &doc.document.nodes {
        collect_foldable_nodes(node, &mut ranges);
    }
    Some(ranges)
}

fn collect_sections(section: &Section, out: &mut Vec<FoldingRange>) {
    let start = section.range.start.line + 1;
    let end = section.range.end.line;
    if start <= end {
        out.push(region(start, end));
    }
    for child in &section.children {
        collect_sections(child, out);
    }
}

fn collect_foldable_nodes(node: &Node, out: &mut Vec<FoldingRange>) {
    if matches!(
        node.kind(),
        NodeKind::Block | NodeKind::Drawer | NodeKind::PropertyDrawer
    ) {
        let range = node.range();
        if range.start.line < range.end.line {
            out.push(region(range.start.line, range.end.line));
        }
    }
    node.visit_children(&mut |child| collect_foldable_nodes(child, out));
}

fn region(start_line: usize, end_line: usize) -> FoldingRange {
    FoldingRange {
        start_line: start_line as u32,
        start_character: None,
        end_line: end_line as u32,
        end_character: None,
        kind: Some(FoldingRangeKind::Region),
        collapsed_text: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(text: &str) -> (Session, Url) {
        let mut session = Session::new();
        let uri = Url::parse("file:///tmp/fold.org").expect("uri");
        session.open(uri.clone(), text.to_string(), 1);
        (session, uri)
    }

    #[test]
    fn sections_fold_below_their_headline() {
        let (session, uri) = session_with("* Top\nbody\nmore\n* Next\n");
        let ranges = folding_ranges(&session, &uri).expect("ranges");
        assert!(ranges
            .iter()
            .any(|range| range.start_line == 1 && range.end_line == 2));
    }

    #[test]
    fn single_line_section_does_not_fold() {
        let (session, uri) = session_with("* Lone\n* Next\nbody\n");
        let ranges = folding_ranges(&session, &uri).expect("ranges");
        assert!(!ranges.iter().any(|range| range.start_line == 1 && range.end_line == 0));
    }

    #[test]
    fn blocks_and_drawers_fold() {
        let (session, uri) = session_with(
            "* H\n:PROPERTIES:\n:ID: x\n:END:\n#+begin_src sh\necho hi\n#+end_src\n:LOGBOOK:\nnote\n:END:\n",
        );
        let ranges = folding_ranges(&session, &uri).expect("ranges");
        // Property drawer lines 1-3, block lines 4-6, drawer lines 7-9.
        assert!(ranges.iter().any(|r| r.start_line == 1 && r.end_line == 3));
        assert!(ranges.iter().any(|r| r.start_line == 4 && r.end_line == 6));
        assert!(ranges.iter().any(|r| r.start_line == 7 && r.end_line == 9));
    }

    #[test]
    fn missing_document_yields_none() {
        let session = Session::new();
        let uri = Url::parse("file:///tmp/none.org").expect("uri");
        assert!(folding_ranges(&session, &uri).is_none());
    }
}
