//! Hover previews for link targets

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Url};
use tracing::debug;

use org_analysis::scanner::PREVIEW_LINES;
use org_analysis::{find_node_at, resolve_link};
use org_parser::ast::{Node, NodeKind, Position};

use crate::convert::to_lsp_range;
use crate::session::Session;

/// Preview the target of the link under the cursor: a header naming the
/// protocol and target file, then the first lines at the target position.
pub fn hover(session: &Session, uri: &Url, pos: Position) -> Option<Hover> {
    let doc = session.get(uri)?;
    let Node::RegularLink(link) = find_node_at(&doc.document, NodeKind::RegularLink, pos)? else {
        return None;
    };
    let current = Session::path_of(uri);
    let processed = session.processed();
    let target = match resolve_link(link, &current, session.root(), &processed) {
        Ok(target) => target,
        Err(err) => {
            debug!(url = %link.url, error = %err, "hover target did not resolve");
            return None;
        }
    };

    let text = std::fs::read_to_string(&target.path).ok()?;
    let window: Vec<&str> = text
        .lines()
        .skip(target.range.start.line)
        .take(PREVIEW_LINES)
        .collect();
    let file_name = target
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.path.display().to_string());
    let protocol = if link.protocol.is_empty() {
        "file"
    } else {
        link.protocol.as_str()
    };
    let contents = format!(
        "**{protocol}** link → {file_name}\n```org\n{}\n```",
        window.join("\n")
    );

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: contents,
        }),
        range: Some(to_lsp_range(link.range)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn previews_file_link_target() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("target.org"),
            "* Target\nline one\nline two\n",
        )
        .expect("write");
        let mut session = Session::new();
        session.set_root(dir.path().to_path_buf());
        let uri = Url::from_file_path(dir.path().join("source.org")).expect("uri");
        session.open(
            uri.clone(),
            "See [[file:target.org][target]].\n".to_string(),
            1,
        );

        let hover = hover(&session, &uri, Position::new(0, 10)).expect("hover");
        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup");
        };
        assert!(markup.value.contains("**file** link → target.org"));
        assert!(markup.value.contains("* Target"));
        assert!(markup.value.contains("line two"));

        let range = hover.range.expect("range covers link");
        assert_eq!(range.start.line, 0);
        assert_eq!(range.start.character, 4);
    }

    #[test]
    fn id_link_window_starts_at_heading() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("a.org"),
            "intro\n* A\n:PROPERTIES:\n:ID: xyz\n:END:\nbody\n",
        )
        .expect("write");
        let mut session = Session::new();
        session.set_root(dir.path().to_path_buf());
        let uri = Url::from_file_path(dir.path().join("b.org")).expect("uri");
        session.open(uri.clone(), "Ref [[id:xyz]].\n".to_string(), 1);

        let hover = hover(&session, &uri, Position::new(0, 8)).expect("hover");
        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup");
        };
        assert!(markup.value.contains("* A"));
        assert!(!markup.value.contains("intro"));
    }

    #[test]
    fn missing_target_file_yields_none() {
        let dir = tempdir().expect("tempdir");
        let mut session = Session::new();
        session.set_root(dir.path().to_path_buf());
        let uri = Url::from_file_path(dir.path().join("source.org")).expect("uri");
        session.open(uri.clone(), "See [[file:gone.org]].\n".to_string(), 1);
        assert!(hover(&session, &uri, Position::new(0, 8)).is_none());
    }
}
