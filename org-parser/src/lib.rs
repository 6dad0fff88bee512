//! org-parser: AST, parser and writer for org-mode documents
//!
//! The parser turns document text into a [`Document`](ast::Document): an
//! ordered tree of [`Node`](ast::Node)s plus a derived outline of sections.
//! The writer serializes a tree back to canonical org text. Everything a
//! language server needs downstream (position lookups, workspace indexing,
//! rewrites) builds on these two operations.
//!
//! Positions are 0-based lines and columns throughout. Block-level nodes are
//! line-granular; inline nodes are column-granular. See [`ast::range`].

pub mod ast;
pub mod parse;
pub mod writer;

pub use ast::{Document, Node, NodeKind, Position, Range, Section};
pub use parse::{parse_bytes, parse_file, parse_str, ParseError};
pub use writer::{serialize, serialize_document};
