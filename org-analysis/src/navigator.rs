//! Position-to-node resolution
//!
//! [`find_node_at`] returns the deepest node of a requested variant whose
//! range contains the cursor, under the variant's granularity rule: block
//! nodes match on lines alone, inline nodes on full positions. The walk
//! always descends, whether or not the current node matched, because a more
//! specific match may sit deeper (a link inside a paragraph inside a list
//! item). Ties on depth keep the first match in pre-order, which also
//! resolves two inline nodes touching at the cursor in favor of the one
//! ending there.

use org_parser::ast::{Document, Node, NodeKind, Position};

/// Find the deepest node of `kind` containing `pos`.
pub fn find_node_at<'a>(document: &'a Document, kind: NodeKind, pos: Position) -> Option<&'a Node> {
    let mut best: Option<(&'a Node, usize)> = None;
    for node in &document.nodes {
        walk(node, kind, pos, 0, &mut best);
    }
    best.map(|(node, _)| node)
}

fn walk<'a>(
    node: &'a Node,
    kind: NodeKind,
    pos: Position,
    depth: usize,
    best: &mut Option<(&'a Node, usize)>,
) {
    if node.kind() == kind && node.contains(pos) {
        let deeper = match best {
            Some((_, best_depth)) => depth > *best_depth,
            None => true,
        };
        if deeper {
            *best = Some((node, depth));
        }
    }
    node.visit_children(&mut |child| walk(child, kind, pos, depth + 1, best));
}

/// Collect nodes overlapping the line span `start_line..=end_line`,
/// top-down: a node starting inside the span is taken whole (sub-nodes and
/// all), a node straddling in from above is entered instead so only the
/// covered part of its subtree is collected.
pub fn find_nodes_in_range<'a>(
    nodes: &'a [Node],
    start_line: usize,
    end_line: usize,
) -> Vec<&'a Node> {
    let mut found = Vec::new();
    collect_in_range(nodes, start_line, end_line, &mut found);
    found
}

fn collect_in_range<'a>(
    nodes: &'a [Node],
    start_line: usize,
    end_line: usize,
    found: &mut Vec<&'a Node>,
) {
    for node in nodes {
        let range = node.range();
        if !range.overlaps_lines(start_line, end_line) {
            continue;
        }
        if range.start.line >= start_line {
            found.push(node);
        } else {
            let mut children = Vec::new();
            node.visit_children(&mut |child| children.push(child));
            for child in children {
                collect_in_range(std::slice::from_ref(child), start_line, end_line, found);
            }
        }
    }
}
