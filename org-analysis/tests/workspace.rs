//! Cross-component workspace flows: scan, resolve, reference, complete.

use std::fs;
use std::path::{Path, PathBuf};

use org_analysis::completion::{completion_candidates, detect_context, CompletionContext};
use org_analysis::navigator::find_node_at;
use org_analysis::references::find_id_references;
use org_analysis::resolver::resolve_link;
use org_analysis::scanner::Scanner;
use org_parser::ast::{Node, NodeKind, Position};
use org_parser::parse_str;
use tempfile::tempdir;

const HUB_UUID: &str = "11111111-2222-3333-4444-555555555555";

fn build_workspace(root: &Path) {
    fs::write(
        root.join("hub.org"),
        format!(
            "#+TITLE: Hub\n\n* Hub Heading :core:\n:PROPERTIES:\n:ID: {HUB_UUID}\n:END:\nCentral notes.\n"
        ),
    )
    .expect("write hub.org");
    fs::create_dir_all(root.join("daily")).expect("mkdir daily");
    fs::write(
        root.join("daily/monday.org"),
        format!("* Monday :log:\nLink back to [[id:{HUB_UUID}][the hub]].\n"),
    )
    .expect("write monday.org");
    fs::write(
        root.join("daily/tuesday.org"),
        format!("Quick ref [[id:{HUB_UUID}]] and a file link [[file:../hub.org]].\n"),
    )
    .expect("write tuesday.org");
}

#[test]
fn scan_resolve_and_reference_roundtrip() {
    let dir = tempdir().expect("tempdir");
    build_workspace(dir.path());

    let mut scanner = Scanner::new(dir.path());
    scanner.process().expect("scan succeeds");
    let processed = scanner.processed_files();

    // The hub heading landed in the UUID index with its file and line.
    let location = processed.uuid_index.get(HUB_UUID).expect("uuid indexed");
    assert_eq!(location.file, PathBuf::from("hub.org"));
    assert_eq!(location.title, "Hub Heading");
    assert_eq!(location.range.start.line, 2);
    drop(location);

    // An id link in an open buffer resolves through the index.
    let monday_text =
        fs::read_to_string(dir.path().join("daily/monday.org")).expect("read monday");
    let monday = parse_str(&monday_text);
    let link = find_node_at(&monday, NodeKind::RegularLink, Position::new(1, 20))
        .expect("link under cursor");
    let Node::RegularLink(link) = link else {
        panic!("expected a link node");
    };
    let target = resolve_link(
        link,
        &dir.path().join("daily/monday.org"),
        Some(dir.path()),
        &processed,
    )
    .expect("id link resolves");
    assert_eq!(target.path, dir.path().join("hub.org"));
    assert_eq!(target.range.start.line, 2);

    // Every workspace link to the hub is found, in deterministic order.
    let refs = find_id_references(&processed, HUB_UUID);
    let files: Vec<&Path> = refs.iter().map(|r| r.file.as_path()).collect();
    assert_eq!(
        files,
        vec![Path::new("daily/monday.org"), Path::new("daily/tuesday.org")]
    );
}

#[test]
fn completion_sees_scanned_headings_and_tags() {
    let dir = tempdir().expect("tempdir");
    build_workspace(dir.path());
    let mut scanner = Scanner::new(dir.path());
    scanner.process().expect("scan succeeds");
    let processed = scanner.processed_files();

    let line = "[[id:hub";
    let document = parse_str(line);
    let context = detect_context(&document, line, Position::new(0, line.len()))
        .expect("id context detected");
    assert_eq!(context.context, CompletionContext::Id);

    let items = completion_candidates(&context, &processed, Some(dir.path()));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].label, "Hub Heading");
    assert_eq!(items[0].insert_text, format!("{HUB_UUID}]]"));
    let docs = items[0].documentation.as_deref().expect("preview window");
    assert!(docs.contains("* Hub Heading"));

    let tag_context = detect_context(
        &parse_str("* New note :"),
        "* New note :",
        Position::new(0, 12),
    )
    .expect("tag context detected");
    assert_eq!(tag_context.context, CompletionContext::Tag);
    let tags: Vec<String> = completion_candidates(&tag_context, &processed, None)
        .into_iter()
        .map(|item| item.label)
        .collect();
    assert_eq!(tags, vec!["core", "log"]);
}

#[test]
fn rescan_picks_up_new_files_and_forgets_deleted_ids() {
    let dir = tempdir().expect("tempdir");
    build_workspace(dir.path());
    let mut scanner = Scanner::new(dir.path());
    scanner.process().expect("first scan");
    assert_eq!(scanner.processed_files().files.len(), 3);

    fs::write(
        dir.path().join("extra.org"),
        "* Extra\n:PROPERTIES:\n:ID: extra-id\n:END:\n",
    )
    .expect("write extra");
    fs::remove_file(dir.path().join("hub.org")).expect("remove hub");
    scanner.process().expect("second scan");

    let processed = scanner.processed_files();
    assert_eq!(processed.files.len(), 3);
    assert!(processed.uuid_index.get("extra-id").is_some());
    assert!(processed.uuid_index.get(HUB_UUID).is_none());
}
