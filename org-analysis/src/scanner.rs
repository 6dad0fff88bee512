//! Workspace scanner and secondary indexes
//!
//! `Scanner::process` walks the workspace root, parses every org file in
//! parallel, and rebuilds three indexes: relative path → file info, UUID →
//! heading location, tag → files. The rebuild is atomic by construction: a
//! fresh [`ProcessedFiles`] is populated off to the side and swapped in as a
//! whole, so readers hold either the previous snapshot or the new one,
//! never a mix. Inside the snapshot the maps are concurrent so the parallel
//! parse workers can insert without a coordinating lock.
//!
//! A file that cannot be read or parsed is logged and skipped; only an
//! unwalkable root fails the scan.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use ignore::WalkBuilder;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use org_parser::ast::{Document, Range};
use org_parser::parse_str;

/// File extension the scanner indexes.
pub const ORG_EXTENSION: &str = "org";

/// How many non-empty lines go into a file preview.
pub const PREVIEW_LINES: usize = 8;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("workspace root {path} is not walkable")]
    RootUnwalkable {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

/// Where a UUID-carrying heading lives: workspace-relative file, rendered
/// title, heading level and the headline's range. A plain value that stays
/// meaningful after the snapshot it came from is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLocation {
    pub file: PathBuf,
    pub title: String,
    pub level: usize,
    pub range: Range,
}

/// Everything the scanner derives from one parsed file.
#[derive(Debug)]
pub struct FileInfo {
    /// Path relative to the workspace root.
    pub path: PathBuf,
    pub document: Document,
    pub title: String,
    pub tags: Vec<String>,
    pub uuids: Vec<String>,
    pub preview: String,
}

/// One scan round's indexes.
#[derive(Debug, Default)]
pub struct ProcessedFiles {
    pub files: DashMap<PathBuf, Arc<FileInfo>>,
    pub uuid_index: DashMap<String, HeaderLocation>,
    pub tag_map: DashMap<String, Vec<Arc<FileInfo>>>,
}

#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    processed: Arc<ProcessedFiles>,
    last_scan: Option<Instant>,
}

impl Scanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            processed: Arc::new(ProcessedFiles::default()),
            last_scan: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Monotonic timestamp of the last completed scan.
    pub fn last_scan_time(&self) -> Option<Instant> {
        self.last_scan
    }

    /// The current index snapshot. The returned `Arc` stays valid across
    /// later scans; it simply stops receiving updates.
    pub fn processed_files(&self) -> Arc<ProcessedFiles> {
        Arc::clone(&self.processed)
    }

    /// Walk the root, parse every org file and republish the indexes.
    pub fn process(&mut self) -> Result<(), ScanError> {
        let paths = self.discover()?;
        let snapshot = Arc::new(ProcessedFiles::default());

        paths.par_iter().for_each(|path| {
            match self.index_file(path) {
                Some(info) => insert_file(&snapshot, info),
                None => debug!(path = %path.display(), "skipped unreadable file"),
            };
        });

        self.processed = snapshot;
        self.last_scan = Some(Instant::now());
        Ok(())
    }

    fn discover(&self) -> Result<Vec<PathBuf>, ScanError> {
        let mut paths = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .hidden(true)
            .follow_links(true)
            .build();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if paths.is_empty() && !self.root.is_dir() {
                        return Err(ScanError::RootUnwalkable {
                            path: self.root.clone(),
                            source: err,
                        });
                    }
                    warn!(error = %err, "workspace walk error");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false)
                && path.extension().map(|ext| ext == ORG_EXTENSION).unwrap_or(false)
            {
                paths.push(path.to_path_buf());
            }
        }
        Ok(paths)
    }

    fn index_file(&self, path: &Path) -> Option<FileInfo> {
        let text = match std::fs::read(path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(path = %path.display(), "workspace file is not valid UTF-8");
                    return None;
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read workspace file");
                return None;
            }
        };
        let document = parse_str(&text);
        let relative = pathdiff::diff_paths(path, &self.root)
            .unwrap_or_else(|| path.to_path_buf());
        Some(derive_file_info(relative, path, document, &text))
    }
}

fn insert_file(snapshot: &Arc<ProcessedFiles>, info: FileInfo) {
    let info = Arc::new(info);

    info.document.for_each_headline(&mut |headline| {
        if let Some(id) = headline.id() {
            snapshot.uuid_index.insert(
                id.to_string(),
                HeaderLocation {
                    file: info.path.clone(),
                    title: headline.title_text(),
                    level: headline.level,
                    range: headline.range,
                },
            );
        }
    });

    for tag in &info.tags {
        snapshot
            .tag_map
            .entry(tag.clone())
            .or_default()
            .push(Arc::clone(&info));
    }

    snapshot.files.insert(info.path.clone(), info);
}

fn derive_file_info(relative: PathBuf, path: &Path, document: Document, text: &str) -> FileInfo {
    let title = document
        .keyword("TITLE")
        .map(str::to_string)
        .filter(|title| !title.is_empty())
        .or_else(|| document.first_headline().map(|h| h.title_text()))
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    let mut tags: Vec<String> = Vec::new();
    if let Some(filetags) = document.keyword("FILETAGS") {
        for tag in filetags.split(':').filter(|tag| !tag.trim().is_empty()) {
            push_unique(&mut tags, tag.trim());
        }
    }
    let mut uuids = Vec::new();
    document.for_each_headline(&mut |headline| {
        for tag in &headline.tags {
            push_unique(&mut tags, tag);
        }
        if let Some(id) = headline.id() {
            uuids.push(id.to_string());
        }
    });

    let preview = preview_of(text);

    FileInfo {
        path: relative,
        document,
        title,
        tags,
        uuids,
        preview,
    }
}

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    if !tags.iter().any(|existing| existing == tag) {
        tags.push(tag.to_string());
    }
}

fn preview_of(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}
