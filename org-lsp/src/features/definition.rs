//! Go-to-definition for links

use tower_lsp::lsp_types::{Location, Url};
use tracing::debug;

use org_analysis::{find_node_at, resolve_link};
use org_parser::ast::{Node, NodeKind, Position};

use crate::convert::point_range;
use crate::session::Session;

/// Resolve the link under the cursor to a target location.
pub fn definition(session: &Session, uri: &Url, pos: Position) -> Option<Location> {
    let doc = session.get(uri)?;
    let Node::RegularLink(link) = find_node_at(&doc.document, NodeKind::RegularLink, pos)? else {
        return None;
    };
    let current = Session::path_of(uri);
    let processed = session.processed();
    let target = match resolve_link(link, &current, session.root(), &processed) {
        Ok(target) => target,
        Err(err) => {
            debug!(url = %link.url, error = %err, "link did not resolve");
            return None;
        }
    };
    let target_uri = Url::from_file_path(&target.path).ok()?;
    Some(Location {
        uri: target_uri,
        range: point_range(target.range.start),
    })
}
