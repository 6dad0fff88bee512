//! org-analysis: protocol-agnostic language intelligence for org workspaces
//!
//! Builds on [`org_parser`] with the pieces a language server composes:
//!
//! - [`navigator`]: position-to-node resolution on a document's AST;
//! - [`scanner`]: workspace walking, parallel parsing and the file/UUID/tag
//!   indexes;
//! - [`resolver`]: link target resolution (`file` and `id` protocols);
//! - [`references`]: workspace-wide `id:` link collection;
//! - [`completion`]: cursor context detection and candidate building;
//! - [`rewrite`]: formatting normalization and heading↔list conversions.

pub mod completion;
pub mod navigator;
pub mod references;
pub mod resolver;
pub mod rewrite;
pub mod scanner;

pub use completion::{
    completion_candidates, detect_context, CompletionCandidate, CompletionContext, DetectedContext,
};
pub use navigator::{find_node_at, find_nodes_in_range};
pub use references::{find_id_references, ReferenceLocation};
pub use resolver::{resolve_link, ResolveError, ResolvedTarget};
pub use rewrite::convert::{heading_subtree_to_list, list_to_heading_subtree, ListKind};
pub use rewrite::{format_nodes, format_text};
pub use scanner::{FileInfo, HeaderLocation, ProcessedFiles, ScanError, Scanner};
