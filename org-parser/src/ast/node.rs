//! The org AST node sum type
//!
//! Every variant carries its own [`Range`]; [`Node`] exposes a uniform
//! `kind()` / `range()` / `visit_children()` surface so traversals never
//! reach into variant internals. Variants split into two granularity groups
//! (see [`NodeKind::is_inline`]): block nodes are line-granular, inline nodes
//! are column-granular.

use super::range::{Position, Range};

/// Discriminant for [`Node`] variants, used by position lookups and walks
/// that select a single variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Block-granular
    Headline,
    Paragraph,
    Block,
    Drawer,
    PropertyDrawer,
    List,
    ListItem,
    Table,
    Row,
    Keyword,
    HorizontalRule,
    FootnoteDefinition,
    // Column-granular
    Text,
    LineBreak,
    ExplicitLineBreak,
    StatisticToken,
    Timestamp,
    Emphasis,
    InlineBlock,
    LatexFragment,
    FootnoteLink,
    RegularLink,
    Macro,
}

impl NodeKind {
    /// Whether positions of this variant are meaningful to the column.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::LineBreak
                | NodeKind::ExplicitLineBreak
                | NodeKind::StatisticToken
                | NodeKind::Timestamp
                | NodeKind::Emphasis
                | NodeKind::InlineBlock
                | NodeKind::LatexFragment
                | NodeKind::FootnoteLink
                | NodeKind::RegularLink
                | NodeKind::Macro
        )
    }
}

/// A structural heading: stars, optional status word and priority cookie,
/// inline title, trailing tag list. Its `children` hold everything in the
/// heading's subtree, in source order: the property drawer (when present,
/// always first), body content, and nested [`Headline`]s. `range` spans the
/// whole subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub range: Range,
    pub level: usize,
    pub status: Option<String>,
    pub priority: Option<char>,
    pub title: Vec<Node>,
    pub tags: Vec<String>,
    pub children: Vec<Node>,
}

impl Headline {
    /// The property drawer, when the heading carries one.
    pub fn property_drawer(&self) -> Option<&PropertyDrawer> {
        self.children.iter().find_map(|node| match node {
            Node::PropertyDrawer(drawer) => Some(drawer),
            _ => None,
        })
    }

    /// The `ID` property, when present.
    pub fn id(&self) -> Option<&str> {
        self.property_drawer().and_then(|drawer| drawer.get("ID"))
    }

    /// Renders the displayable heading name by concatenating title text.
    pub fn title_text(&self) -> String {
        let mut out = String::new();
        for node in &self.title {
            render_inline_text(node, &mut out);
        }
        out
    }
}

fn render_inline_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.value),
        Node::Emphasis(emphasis) => {
            for child in &emphasis.content {
                render_inline_text(child, out);
            }
        }
        Node::RegularLink(link) => {
            if link.description.is_empty() {
                out.push_str(&link.url);
            } else {
                for child in &link.description {
                    render_inline_text(child, out);
                }
            }
        }
        Node::Timestamp(ts) => out.push_str(&ts.raw),
        Node::StatisticToken(token) => {
            out.push('[');
            out.push_str(&token.value);
            out.push(']');
        }
        Node::Macro(mac) => {
            out.push_str("{{{");
            out.push_str(&mac.name);
            out.push_str("}}}");
        }
        _ => {}
    }
}

/// Consecutive non-blank text lines. Children are inline nodes with
/// [`LineBreak`] tokens at the original line boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub range: Range,
    pub children: Vec<Node>,
}

/// A fenced `#+begin_NAME ... #+end_NAME` block. Content lines are kept
/// verbatim: source-block content is semantic and never reparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub range: Range,
    pub name: String,
    pub parameters: Vec<String>,
    pub content: Vec<String>,
}

impl Block {
    /// The declared language of a `src` block.
    pub fn language(&self) -> Option<&str> {
        self.parameters.first().map(String::as_str)
    }
}

/// A generic `:NAME: ... :END:` drawer.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawer {
    pub range: Range,
    pub name: String,
    pub children: Vec<Node>,
}

/// A `:PROPERTIES:` drawer; key order is significant for round-tripping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyDrawer {
    pub range: Range,
    pub properties: Vec<(String, String)>,
}

impl PropertyDrawer {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: String) {
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.properties.push((key.to_string(), value)),
        }
    }
}

/// An ordered or unordered list; items are always [`ListItem`] nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub range: Range,
    pub ordered: bool,
    pub items: Vec<Node>,
}

/// One list item: bullet plus recursively parsed content.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub range: Range,
    pub bullet: String,
    pub indent: usize,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub range: Range,
    pub rows: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub range: Range,
    pub cells: Vec<String>,
    pub separator: bool,
}

/// A `#+KEY: value` line outside any block.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub range: Range,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalRule {
    pub range: Range,
}

/// A `[fn:label] ...` definition paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteDefinition {
    pub range: Range,
    pub label: String,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub range: Range,
    pub value: String,
}

/// A soft newline between the lines of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBreak {
    pub range: Range,
}

/// A `\\` hard line break at the end of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitLineBreak {
    pub range: Range,
}

/// A `[1/2]` or `[50%]` progress cookie; `value` excludes the brackets.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticToken {
    pub range: Range,
    pub value: String,
}

/// An active `<...>` or inactive `[...]` timestamp, kept raw.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    pub range: Range,
    pub raw: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emphasis {
    pub range: Range,
    pub marker: char,
    pub content: Vec<Node>,
}

/// An inline `src_lang{...}` fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineBlock {
    pub range: Range,
    pub language: String,
    pub value: String,
}

/// A raw latex fragment including its delimiters.
#[derive(Debug, Clone, PartialEq)]
pub struct LatexFragment {
    pub range: Range,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteLink {
    pub range: Range,
    pub label: String,
}

/// A `[[protocol:target][description]]` link. `url` is the full bracket
/// target including any protocol prefix; `protocol` is the parsed scheme,
/// empty when the target has none.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularLink {
    pub range: Range,
    pub protocol: String,
    pub url: String,
    pub description: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub range: Range,
    pub name: String,
    pub args: Vec<String>,
}

/// The org AST node. See the module docs for the granularity split.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Headline(Headline),
    Paragraph(Paragraph),
    Block(Block),
    Drawer(Drawer),
    PropertyDrawer(PropertyDrawer),
    List(List),
    ListItem(ListItem),
    Table(Table),
    Row(Row),
    Keyword(Keyword),
    HorizontalRule(HorizontalRule),
    FootnoteDefinition(FootnoteDefinition),
    Text(Text),
    LineBreak(LineBreak),
    ExplicitLineBreak(ExplicitLineBreak),
    StatisticToken(StatisticToken),
    Timestamp(Timestamp),
    Emphasis(Emphasis),
    InlineBlock(InlineBlock),
    LatexFragment(LatexFragment),
    FootnoteLink(FootnoteLink),
    RegularLink(RegularLink),
    Macro(Macro),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Headline(_) => NodeKind::Headline,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Block(_) => NodeKind::Block,
            Node::Drawer(_) => NodeKind::Drawer,
            Node::PropertyDrawer(_) => NodeKind::PropertyDrawer,
            Node::List(_) => NodeKind::List,
            Node::ListItem(_) => NodeKind::ListItem,
            Node::Table(_) => NodeKind::Table,
            Node::Row(_) => NodeKind::Row,
            Node::Keyword(_) => NodeKind::Keyword,
            Node::HorizontalRule(_) => NodeKind::HorizontalRule,
            Node::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
            Node::Text(_) => NodeKind::Text,
            Node::LineBreak(_) => NodeKind::LineBreak,
            Node::ExplicitLineBreak(_) => NodeKind::ExplicitLineBreak,
            Node::StatisticToken(_) => NodeKind::StatisticToken,
            Node::Timestamp(_) => NodeKind::Timestamp,
            Node::Emphasis(_) => NodeKind::Emphasis,
            Node::InlineBlock(_) => NodeKind::InlineBlock,
            Node::LatexFragment(_) => NodeKind::LatexFragment,
            Node::FootnoteLink(_) => NodeKind::FootnoteLink,
            Node::RegularLink(_) => NodeKind::RegularLink,
            Node::Macro(_) => NodeKind::Macro,
        }
    }

    pub fn range(&self) -> &Range {
        match self {
            Node::Headline(n) => &n.range,
            Node::Paragraph(n) => &n.range,
            Node::Block(n) => &n.range,
            Node::Drawer(n) => &n.range,
            Node::PropertyDrawer(n) => &n.range,
            Node::List(n) => &n.range,
            Node::ListItem(n) => &n.range,
            Node::Table(n) => &n.range,
            Node::Row(n) => &n.range,
            Node::Keyword(n) => &n.range,
            Node::HorizontalRule(n) => &n.range,
            Node::FootnoteDefinition(n) => &n.range,
            Node::Text(n) => &n.range,
            Node::LineBreak(n) => &n.range,
            Node::ExplicitLineBreak(n) => &n.range,
            Node::StatisticToken(n) => &n.range,
            Node::Timestamp(n) => &n.range,
            Node::Emphasis(n) => &n.range,
            Node::InlineBlock(n) => &n.range,
            Node::LatexFragment(n) => &n.range,
            Node::FootnoteLink(n) => &n.range,
            Node::RegularLink(n) => &n.range,
            Node::Macro(n) => &n.range,
        }
    }

    pub fn is_inline(&self) -> bool {
        self.kind().is_inline()
    }

    /// Granularity-aware containment: block nodes compare lines only,
    /// inline nodes compare full positions.
    pub fn contains(&self, pos: Position) -> bool {
        if self.is_inline() {
            self.range().contains(pos)
        } else {
            self.range().contains_line(pos.line)
        }
    }

    /// Invoke `f` on every direct child, in source order. This is the single
    /// child-iteration capability: variant-specific slots (a headline's title
    /// and subtree, a list's items, a link's description) all funnel through
    /// here so traversals stay uniform.
    pub fn visit_children<'a>(&'a self, f: &mut dyn FnMut(&'a Node)) {
        match self {
            Node::Headline(headline) => {
                for node in &headline.title {
                    f(node);
                }
                for node in &headline.children {
                    f(node);
                }
            }
            Node::Paragraph(paragraph) => {
                for node in &paragraph.children {
                    f(node);
                }
            }
            Node::Drawer(drawer) => {
                for node in &drawer.children {
                    f(node);
                }
            }
            Node::List(list) => {
                for node in &list.items {
                    f(node);
                }
            }
            Node::ListItem(item) => {
                for node in &item.children {
                    f(node);
                }
            }
            Node::Table(table) => {
                for node in &table.rows {
                    f(node);
                }
            }
            Node::FootnoteDefinition(definition) => {
                for node in &definition.children {
                    f(node);
                }
            }
            Node::Emphasis(emphasis) => {
                for node in &emphasis.content {
                    f(node);
                }
            }
            Node::RegularLink(link) => {
                for node in &link.description {
                    f(node);
                }
            }
            Node::Block(_)
            | Node::PropertyDrawer(_)
            | Node::Row(_)
            | Node::Keyword(_)
            | Node::HorizontalRule(_)
            | Node::Text(_)
            | Node::LineBreak(_)
            | Node::ExplicitLineBreak(_)
            | Node::StatisticToken(_)
            | Node::Timestamp(_)
            | Node::InlineBlock(_)
            | Node::LatexFragment(_)
            | Node::FootnoteLink(_)
            | Node::Macro(_) => {}
        }
    }
}
