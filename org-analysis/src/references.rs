//! Cross-file reference search
//!
//! Collects every `id:` link in the workspace pointing at a given UUID by
//! walking the AST of each indexed file.

use std::path::PathBuf;

use org_parser::ast::{Document, Node, Range};

use crate::scanner::ProcessedFiles;

/// A link occurrence: workspace-relative file plus the link node's range.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLocation {
    pub file: PathBuf,
    pub range: Range,
}

/// Find every `[[id:<uuid>]]` link across the indexed workspace.
pub fn find_id_references(processed: &ProcessedFiles, uuid: &str) -> Vec<ReferenceLocation> {
    let needle = format!("id:{uuid}");
    let mut found = Vec::new();
    for entry in processed.files.iter() {
        let info = entry.value();
        collect_links(&info.document, &needle, &mut |range| {
            found.push(ReferenceLocation {
                file: info.path.clone(),
                range,
            });
        });
    }
    // Deterministic order for clients regardless of map iteration order.
    found.sort_by(|a, b| {
        (&a.file, a.range.start).cmp(&(&b.file, b.range.start))
    });
    found
}

fn collect_links(document: &Document, needle: &str, sink: &mut dyn FnMut(Range)) {
    fn walk(node: &Node, needle: &str, sink: &mut dyn FnMut(Range)) {
        if let Node::RegularLink(link) = node {
            if link.url == needle {
                sink(link.range);
            }
        }
        node.visit_children(&mut |child| walk(child, needle, sink));
    }
    for node in &document.nodes {
        walk(node, needle, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_links_across_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join("a.org"),
            "* A\n:PROPERTIES:\n:ID: aaaa\n:END:\n",
        )
        .expect("write a.org");
        fs::write(
            dir.path().join("b.org"),
            "See [[id:aaaa][link]].\nAnd again [[id:aaaa]].\n",
        )
        .expect("write b.org");
        fs::write(dir.path().join("c.org"), "- item ref [[id:aaaa]]\n")
            .expect("write c.org");
        fs::write(dir.path().join("d.org"), "No match [[id:zzzz]]\n").expect("write d.org");

        let mut scanner = Scanner::new(dir.path());
        scanner.process().expect("scan");
        let refs = find_id_references(&scanner.processed_files(), "aaaa");

        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].file, PathBuf::from("b.org"));
        assert_eq!(refs[1].file, PathBuf::from("b.org"));
        assert_eq!(refs[2].file, PathBuf::from("c.org"));
        assert!(refs[0].range.start < refs[1].range.start);
    }

    #[test]
    fn no_references_yields_empty() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.org"), "plain text\n").expect("write");
        let mut scanner = Scanner::new(dir.path());
        scanner.process().expect("scan");
        assert!(find_id_references(&scanner.processed_files(), "aaaa").is_empty());
    }
}
