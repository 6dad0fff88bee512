//! Workspace-wide heading symbols drawn from the UUID index

use tower_lsp::lsp_types::{Location, SymbolInformation, Url};

use crate::convert::to_lsp_range;
use crate::features::document_symbols::symbol_kind_for_level;
use crate::session::Session;

/// Flat symbol list over every indexed heading; the query matches the
/// rendered title case-insensitively, and an empty query matches all.
pub fn workspace_symbols(session: &Session, query: &str) -> Vec<SymbolInformation> {
    let Some(root) = session.root() else {
        return Vec::new();
    };
    let needle = query.to_lowercase();
    let processed = session.processed();
    let mut symbols: Vec<SymbolInformation> = processed
        .uuid_index
        .iter()
        .filter(|entry| needle.is_empty() || entry.value().title.to_lowercase().contains(&needle))
        .filter_map(|entry| {
            let location = entry.value();
            let uri = Url::from_file_path(root.join(&location.file)).ok()?;
            #[allow(deprecated)]
            Some(SymbolInformation {
                name: location.title.clone(),
                kind: symbol_kind_for_level(location.level),
                tags: None,
                deprecated: None,
                location: Location {
                    uri,
                    range: to_lsp_range(location.range),
                },
                container_name: Some(location.file.display().to_string()),
            })
        })
        .collect();
    symbols.sort_by(|a, b| a.name.cmp(&b.name));
    symbols
}
