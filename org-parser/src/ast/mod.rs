//! AST data model: nodes, positions, and the document outline.

pub mod document;
pub mod node;
pub mod range;

pub use document::{Document, Section};
pub use node::{
    Block, Drawer, Emphasis, ExplicitLineBreak, FootnoteDefinition, FootnoteLink, Headline,
    HorizontalRule, InlineBlock, Keyword, LatexFragment, LineBreak, List, ListItem, Macro, Node,
    NodeKind, Paragraph, PropertyDrawer, RegularLink, Row, StatisticToken, Table, Text, Timestamp,
};
pub use range::{Position, Range};
