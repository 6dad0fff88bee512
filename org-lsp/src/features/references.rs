//! Find-references for UUID-carrying headings and their links

use tower_lsp::lsp_types::{Location, Url};

use org_analysis::{find_id_references, find_node_at};
use org_parser::ast::{Node, NodeKind, Position};

use crate::convert::to_lsp_range;
use crate::session::Session;

/// Collect every workspace link to the UUID under the cursor. The cursor
/// may sit on an `id:` link or anywhere in a heading that carries an `ID`
/// property; the link wins when both apply.
pub fn references(session: &Session, uri: &Url, pos: Position) -> Vec<Location> {
    let Some(doc) = session.get(uri) else {
        return Vec::new();
    };
    let Some(uuid) = uuid_at(&doc.document, pos) else {
        return Vec::new();
    };
    let Some(root) = session.root() else {
        return Vec::new();
    };
    let processed = session.processed();
    find_id_references(&processed, &uuid)
        .into_iter()
        .filter_map(|reference| {
            let uri = Url::from_file_path(root.join(&reference.file)).ok()?;
            Some(Location {
                uri,
                range: to_lsp_range(reference.range),
            })
        })
        .collect()
}

fn uuid_at(document: &org_parser::ast::Document, pos: Position) -> Option<String> {
    if let Some(Node::RegularLink(link)) = find_node_at(document, NodeKind::RegularLink, pos) {
        if link.protocol == "id" {
            return Some(link.url.strip_prefix("id:").unwrap_or(&link.url).to_string());
        }
    }
    if let Some(Node::Headline(headline)) = find_node_at(document, NodeKind::Headline, pos) {
        return headline.id().map(str::to_string);
    }
    None
}
