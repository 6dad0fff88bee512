//! Server session state
//!
//! One [`Session`] holds everything a request handler may touch: the
//! workspace root, the scanner with its index snapshot, and the open
//! document store. The server guards the whole session with a single
//! read-write lock: queries share it, document sync and rescans take it
//! exclusively, so handlers never see a half-updated workspace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tracing::{info, warn};

use org_analysis::scanner::{ProcessedFiles, Scanner};
use org_parser::ast::Document;
use org_parser::parse_str;

/// An open editor document: parsed AST plus the exact text it came from.
/// The raw text is kept because completion context detection scans the
/// line left of the cursor, which the AST does not always preserve.
#[derive(Debug)]
pub struct OpenDocument {
    pub document: Document,
    pub version: i32,
    pub text: String,
}

impl OpenDocument {
    /// The raw text of one line, without its newline.
    pub fn line(&self, line: usize) -> &str {
        self.text.lines().nth(line).unwrap_or("")
    }
}

#[derive(Debug, Default)]
pub struct Session {
    root: Option<PathBuf>,
    scanner: Option<Scanner>,
    docs: HashMap<Url, OpenDocument>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Configure the workspace root and run the initial scan.
    pub fn set_root(&mut self, root: PathBuf) {
        info!(root = %root.display(), "workspace root configured");
        let mut scanner = Scanner::new(&root);
        if let Err(err) = scanner.process() {
            warn!(error = %err, "initial workspace scan failed");
        }
        self.scanner = Some(scanner);
        self.root = Some(root);
    }

    /// Current index snapshot; empty when no root was configured.
    pub fn processed(&self) -> Arc<ProcessedFiles> {
        match &self.scanner {
            Some(scanner) => scanner.processed_files(),
            None => Arc::new(ProcessedFiles::default()),
        }
    }

    /// Re-run the workspace scan, typically from the save handler.
    pub fn rescan(&mut self) {
        if let Some(scanner) = &mut self.scanner {
            if let Err(err) = scanner.process() {
                warn!(error = %err, "workspace rescan failed");
            }
        }
    }

    pub fn open(&mut self, uri: Url, text: String, version: i32) {
        let document = parse_str(&text);
        self.docs.insert(
            uri,
            OpenDocument {
                document,
                version,
                text,
            },
        );
    }

    /// Replace a document with new full text. Incremental changes are not
    /// supported; the caller warns and skips them before getting here.
    pub fn replace(&mut self, uri: &Url, text: String, version: i32) {
        self.open(uri.clone(), text, version);
    }

    pub fn close(&mut self, uri: &Url) {
        self.docs.remove(uri);
    }

    pub fn get(&self, uri: &Url) -> Option<&OpenDocument> {
        self.docs.get(uri)
    }

    /// Filesystem path of a document URI.
    pub fn path_of(uri: &Url) -> PathBuf {
        uri.to_file_path()
            .unwrap_or_else(|_| PathBuf::from(uri.path()))
    }
}
