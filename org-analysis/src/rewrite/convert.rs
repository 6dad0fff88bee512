//! Heading↔list refactoring rewrites
//!
//! `heading_subtree_to_list` rewrites a run of headlines into a list: each
//! headline becomes an item holding its title line and its converted
//! children. A non-heading node interrupts the run; the accumulated list is
//! flushed before it and a new list starts after. `list_to_heading_subtree`
//! is the inverse: each item's first paragraph line becomes a headline
//! title, the rest of the paragraph becomes body text, and nested lists
//! become deeper headlines.

use org_parser::ast::node::{Headline, List, ListItem, Node, Paragraph};
use org_parser::ast::{NodeKind, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// Bullet markers cycled by nesting depth for unordered lists.
const UNORDERED_BULLETS: &[&str] = &["-", "+", "*"];

/// Convert a run of sibling nodes, turning each headline subtree into a
/// list item. Non-heading nodes are kept in place between the generated
/// lists; paragraphs with no content are dropped.
pub fn heading_subtree_to_list(nodes: &[Node], kind: ListKind) -> Vec<Node> {
    convert_run(nodes, kind, 0)
}

fn convert_run(nodes: &[Node], kind: ListKind, depth: usize) -> Vec<Node> {
    let mut out = Vec::new();
    let mut pending: Vec<Node> = Vec::new();

    for node in nodes {
        match node {
            Node::Headline(headline) => pending.push(item_for(headline, kind, depth)),
            Node::Paragraph(paragraph) if paragraph_is_blank(paragraph) => {}
            Node::PropertyDrawer(_) => {}
            other => {
                flush(&mut pending, kind, depth, &mut out);
                out.push(other.clone());
            }
        }
    }
    flush(&mut pending, kind, depth, &mut out);
    out
}

fn flush(pending: &mut Vec<Node>, kind: ListKind, depth: usize, out: &mut Vec<Node>) {
    if pending.is_empty() {
        return;
    }
    let mut items = std::mem::take(pending);
    for (index, item) in items.iter_mut().enumerate() {
        if let Node::ListItem(item) = item {
            item.bullet = bullet_for(kind, depth, index);
        }
    }
    let range = items
        .first()
        .map(|first| first.range().union(items.last().expect("non-empty").range()))
        .unwrap_or_default();
    out.push(Node::List(List {
        range,
        ordered: kind == ListKind::Ordered,
        items,
    }));
}

fn bullet_for(kind: ListKind, depth: usize, index: usize) -> String {
    match kind {
        ListKind::Ordered => format!("{}.", index + 1),
        ListKind::Unordered => {
            UNORDERED_BULLETS[depth.min(UNORDERED_BULLETS.len() - 1)].to_string()
        }
    }
}

fn item_for(headline: &Headline, kind: ListKind, depth: usize) -> Node {
    let mut children = Vec::new();
    children.push(Node::Paragraph(Paragraph {
        range: Range::lines(headline.range.start.line, headline.range.start.line),
        children: headline.title.clone(),
    }));
    children.extend(convert_run(&headline.children, kind, depth + 1));
    Node::ListItem(ListItem {
        range: headline.range,
        bullet: String::new(),
        indent: 0,
        children,
    })
}

fn paragraph_is_blank(paragraph: &Paragraph) -> bool {
    paragraph.children.iter().all(|child| match child {
        Node::Text(text) => text.value.trim().is_empty(),
        Node::LineBreak(_) => true,
        _ => false,
    })
}

/// Convert a list into a run of headlines at `level`. Each item's leading
/// paragraph is split at its first line break: the first line becomes the
/// headline title, the remainder the first body paragraph. Nested lists
/// recurse one level deeper; other item content is carried over unchanged.
pub fn list_to_heading_subtree(list: &List, level: usize) -> Vec<Node> {
    let mut headlines = Vec::new();
    for item in &list.items {
        let Node::ListItem(item) = item else {
            continue;
        };
        headlines.push(headline_for(item, level));
    }
    headlines
}

fn headline_for(item: &ListItem, level: usize) -> Node {
    let mut title = Vec::new();
    let mut children: Vec<Node> = Vec::new();
    let mut rest = item.children.iter();

    if let Some(Node::Paragraph(paragraph)) = rest.clone().next() {
        rest.next();
        let (head, tail) = split_at_line_break(&paragraph.children);
        title = head;
        if !tail.is_empty() {
            children.push(Node::Paragraph(Paragraph {
                range: paragraph.range,
                children: tail,
            }));
        }
    }

    for node in rest {
        match node {
            Node::List(nested) => {
                children.extend(list_to_heading_subtree(nested, level + 1));
            }
            other => children.push(other.clone()),
        }
    }

    Node::Headline(Headline {
        range: item.range,
        level,
        status: None,
        priority: None,
        title,
        tags: Vec::new(),
        children,
    })
}

fn split_at_line_break(children: &[Node]) -> (Vec<Node>, Vec<Node>) {
    match children
        .iter()
        .position(|child| child.kind() == NodeKind::LineBreak)
    {
        Some(split) => (
            children[..split].to_vec(),
            children[split + 1..].to_vec(),
        ),
        None => (children.to_vec(), Vec::new()),
    }
}
