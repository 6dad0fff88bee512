//! The parsed document and its derived outline
//!
//! A [`Document`] owns an ordered sequence of top-level [`Node`]s. The
//! outline is a derived view: [`Section`]s hold the index path of their
//! headline inside the node tree plus cached level and range, never the
//! headline itself, so the node tree remains the single owner.

use super::node::{Headline, Node};
use super::range::Range;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub outline: Vec<Section>,
}

/// One outline entry per headline. `path` navigates the node tree: the first
/// index selects a top-level node, each further index selects a child of the
/// headline reached so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub path: Vec<usize>,
    pub level: usize,
    pub range: Range,
    pub children: Vec<Section>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        let outline = build_outline(&nodes);
        Self { nodes, outline }
    }

    /// Resolve a section path back to its headline.
    pub fn headline(&self, path: &[usize]) -> Option<&Headline> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get(*first)? {
            Node::Headline(headline) => headline,
            _ => return None,
        };
        for index in rest {
            current = match current.children.get(*index)? {
                Node::Headline(headline) => headline,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Depth-first visit of every headline in the document.
    pub fn for_each_headline<'a>(&'a self, f: &mut dyn FnMut(&'a Headline)) {
        fn walk<'a>(nodes: &'a [Node], f: &mut dyn FnMut(&'a Headline)) {
            for node in nodes {
                if let Node::Headline(headline) = node {
                    f(headline);
                    walk(&headline.children, f);
                }
            }
        }
        walk(&self.nodes, f);
    }

    /// The first top-level headline, if any.
    pub fn first_headline(&self) -> Option<&Headline> {
        self.nodes.iter().find_map(|node| match node {
            Node::Headline(headline) => Some(headline),
            _ => None,
        })
    }

    /// The value of a top-level `#+KEY:` keyword, matched case-insensitively.
    pub fn keyword(&self, key: &str) -> Option<&str> {
        self.nodes.iter().find_map(|node| match node {
            Node::Keyword(keyword) if keyword.key.eq_ignore_ascii_case(key) => {
                Some(keyword.value.as_str())
            }
            _ => None,
        })
    }
}

fn build_outline(nodes: &[Node]) -> Vec<Section> {
    fn sections_for(children: &[Node], base: &[usize]) -> Vec<Section> {
        let mut sections = Vec::new();
        for (index, node) in children.iter().enumerate() {
            if let Node::Headline(headline) = node {
                let mut path = base.to_vec();
                path.push(index);
                let nested = sections_for(&headline.children, &path);
                sections.push(Section {
                    path,
                    level: headline.level,
                    range: headline.range,
                    children: nested,
                });
            }
        }
        sections
    }
    sections_for(nodes, &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::{Paragraph, Text};
    use crate::ast::range::Position;

    fn headline(level: usize, title: &str, range: Range, children: Vec<Node>) -> Node {
        Node::Headline(Headline {
            range,
            level,
            status: None,
            priority: None,
            title: vec![Node::Text(Text {
                range: Range::new(
                    Position::new(range.start.line, level + 1),
                    Position::new(range.start.line, level + 1 + title.len()),
                ),
                value: title.to_string(),
            })],
            tags: Vec::new(),
            children,
        })
    }

    fn sample() -> Document {
        let inner = headline(2, "Child", Range::lines(2, 3), Vec::new());
        let body = Node::Paragraph(Paragraph {
            range: Range::lines(1, 1),
            children: Vec::new(),
        });
        let top = headline(1, "Top", Range::lines(0, 3), vec![body, inner]);
        let other = headline(1, "Other", Range::lines(4, 4), Vec::new());
        Document::new(vec![top, other])
    }

    #[test]
    fn outline_mirrors_headline_nesting() {
        let document = sample();
        assert_eq!(document.outline.len(), 2);
        assert_eq!(document.outline[0].level, 1);
        assert_eq!(document.outline[0].children.len(), 1);
        assert_eq!(document.outline[0].children[0].path, vec![0, 1]);
        assert_eq!(document.outline[1].path, vec![1]);
    }

    #[test]
    fn paths_resolve_to_headlines() {
        let document = sample();
        let child = document.headline(&[0, 1]).expect("nested headline");
        assert_eq!(child.title_text(), "Child");
        assert!(document.headline(&[0, 0]).is_none());
        assert!(document.headline(&[9]).is_none());
    }

    #[test]
    fn for_each_headline_is_depth_first() {
        let document = sample();
        let mut titles = Vec::new();
        document.for_each_headline(&mut |headline| titles.push(headline.title_text()));
        assert_eq!(titles, vec!["Top", "Child", "Other"]);
    }
}
