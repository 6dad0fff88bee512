//! AST rewrites
//!
//! [`format_nodes`] is the normalization pipeline behind document
//! formatting: document-level keywords hoisted above the first headline,
//! empty paragraphs dropped, trailing whitespace stripped from text, status
//! words and property pairs tidied, and a fresh v4 UUID injected into every
//! headline that lacks an `ID` property. Blank-line placement and table
//! alignment are the writer's concern; the combination of one format pass
//! and one serialize pass reaches a fixed point.
//!
//! [`convert`] holds the heading↔list refactoring rewrites.

pub mod convert;

use org_parser::ast::node::{Node, Paragraph, PropertyDrawer};
use org_parser::ast::Headline;
use org_parser::{parse_str, serialize};
use uuid::Uuid;

/// Parse, normalize and reserialize a whole document.
pub fn format_text(text: &str) -> String {
    let document = parse_str(text);
    serialize(&format_nodes(&document.nodes))
}

/// Normalize a document-level node sequence.
pub fn format_nodes(nodes: &[Node]) -> Vec<Node> {
    let formatted = format_children(nodes);
    let (keywords, rest): (Vec<Node>, Vec<Node>) = formatted
        .into_iter()
        .partition(|node| matches!(node, Node::Keyword(_)));
    let mut out = keywords;
    out.extend(rest);
    out
}

fn format_children(nodes: &[Node]) -> Vec<Node> {
    nodes.iter().filter_map(format_node).collect()
}

/// Normalize one node; `None` drops it.
pub fn format_node(node: &Node) -> Option<Node> {
    match node {
        Node::Paragraph(paragraph) => format_paragraph(paragraph),
        Node::Headline(headline) => Some(Node::Headline(format_headline(headline))),
        Node::PropertyDrawer(drawer) => Some(Node::PropertyDrawer(trim_drawer(drawer))),
        Node::Keyword(keyword) => {
            let mut keyword = keyword.clone();
            keyword.key = keyword.key.trim().to_string();
            keyword.value = keyword.value.trim().to_string();
            Some(Node::Keyword(keyword))
        }
        Node::Table(table) => {
            let mut table = table.clone();
            for row in &mut table.rows {
                if let Node::Row(row) = row {
                    for cell in &mut row.cells {
                        *cell = cell.trim().to_string();
                    }
                }
            }
            Some(Node::Table(table))
        }
        Node::Drawer(drawer) => {
            let mut drawer = drawer.clone();
            drawer.children = format_children(&drawer.children);
            Some(Node::Drawer(drawer))
        }
        Node::List(list) => {
            let mut list = list.clone();
            list.items = format_children(&list.items);
            Some(Node::List(list))
        }
        Node::ListItem(item) => {
            let mut item = item.clone();
            item.children = format_children(&item.children);
            Some(Node::ListItem(item))
        }
        Node::FootnoteDefinition(definition) => {
            let mut definition = definition.clone();
            definition.children = format_children(&definition.children);
            Some(Node::FootnoteDefinition(definition))
        }
        // Block content is semantic and left untouched; everything else has
        // nothing to normalize.
        other => Some(other.clone()),
    }
}

fn format_paragraph(paragraph: &Paragraph) -> Option<Node> {
    let mut children: Vec<Node> = paragraph
        .children
        .iter()
        .map(|child| match child {
            Node::Text(text) => {
                let mut text = text.clone();
                text.value = text.value.trim_end().to_string();
                Node::Text(text)
            }
            other => other.clone(),
        })
        .collect();
    children.retain(|child| !matches!(child, Node::Text(t) if t.value.is_empty()));

    let has_content = children.iter().any(|child| match child {
        Node::Text(text) => !text.value.trim().is_empty(),
        Node::LineBreak(_) => false,
        _ => true,
    });
    if !has_content {
        return None;
    }
    Some(Node::Paragraph(Paragraph {
        range: paragraph.range,
        children,
    }))
}

fn format_headline(headline: &Headline) -> Headline {
    let mut formatted = headline.clone();
    if let Some(status) = &formatted.status {
        formatted.status = Some(status.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    if let Some(Node::Text(last)) = formatted.title.last_mut() {
        last.value = last.value.trim_end().to_string();
    }
    formatted.children = format_children(&formatted.children);
    ensure_id(&mut formatted);
    formatted
}

/// Give the headline an `ID` property, creating the drawer when absent.
fn ensure_id(headline: &mut Headline) {
    if headline.id().is_some() {
        return;
    }
    let id = Uuid::new_v4().to_string();
    for child in &mut headline.children {
        if let Node::PropertyDrawer(drawer) = child {
            drawer.set("ID", id);
            return;
        }
    }
    let mut drawer = PropertyDrawer::default();
    drawer.set("ID", id);
    headline.children.insert(0, Node::PropertyDrawer(drawer));
}

fn trim_drawer(drawer: &PropertyDrawer) -> PropertyDrawer {
    PropertyDrawer {
        range: drawer.range,
        properties: drawer
            .properties
            .iter()
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use regex::Regex;

    static ID_LINE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^:ID: ([0-9a-f-]{36})$").expect("id regex"));

    fn ids_in(text: &str) -> Vec<String> {
        ID_LINE_RE
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    #[test]
    fn injects_distinct_uuids_per_heading() {
        let source = "* First Heading\nBody.\n\n* Second Heading\n";
        let formatted = format_text(source);
        let ids = ids_in(&formatted);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        for id in &ids {
            let parsed = uuid::Uuid::parse_str(id).expect("well-formed uuid");
            assert_eq!(parsed.get_version(), Some(uuid::Version::Random));
        }
    }

    #[test]
    fn existing_id_is_kept() {
        let source = "* Heading\n:PROPERTIES:\n:ID: keep-me\n:END:\n";
        let formatted = format_text(source);
        assert!(formatted.contains(":ID: keep-me"));
        assert_eq!(ids_in(&formatted).len(), 0);
    }

    #[test]
    fn formatting_is_idempotent_after_one_pass() {
        let source = "#+TITLE: T\n* A\nbody   \n\n\n\n* B\n| a | bb |\n|---+---|\n";
        let once = format_text(source);
        assert_eq!(format_text(&once), once);
    }

    #[test]
    fn keywords_hoist_above_content() {
        let source = "Intro.\n#+TITLE: Late title\n\n* H\n";
        let formatted = format_text(source);
        assert!(formatted.starts_with("#+TITLE: Late title\n"));
    }

    #[test]
    fn empty_paragraphs_are_dropped() {
        let source = "   \n\nReal text.\n";
        let formatted = format_text(source);
        assert!(formatted.starts_with("Real text."));
    }

    #[test]
    fn trailing_whitespace_stripped() {
        let source = "line with spaces   \nand more\t\n";
        let formatted = format_text(source);
        assert_eq!(formatted, "line with spaces\nand more\n");
    }

    #[test]
    fn block_content_untouched_by_format() {
        let source = "#+begin_src sh\n  spaced   out   \n#+end_src\n";
        let formatted = format_text(source);
        assert!(formatted.contains("  spaced   out   \n"));
    }
}
