//! Link target resolution
//!
//! Turns a link node's `(url, protocol)` into an absolute file path and a
//! position inside that file. `file` links (and bare paths) resolve against
//! the linking document's directory with `~`, `$VAR` and `.`/`..` expansion;
//! `id` links go through the scanner's UUID index. Every other protocol is
//! reported as unsupported and treated by handlers as "no target".

use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use org_parser::ast::{Range, RegularLink};

use crate::scanner::ProcessedFiles;

static ENV_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("env var regex"));

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unsupported link protocol {0:?}")]
    UnsupportedProtocol(String),
    #[error("no heading with id {0}")]
    UnknownId(String),
    #[error("no workspace root configured")]
    NoWorkspaceRoot,
}

/// A resolved link target: absolute path plus the position to land on.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub path: PathBuf,
    pub range: Range,
}

/// Resolve `link` relative to the document that contains it.
///
/// `root` is the workspace root (required for `id` links), `processed` the
/// current index snapshot.
pub fn resolve_link(
    link: &RegularLink,
    current_doc: &Path,
    root: Option<&Path>,
    processed: &ProcessedFiles,
) -> Result<ResolvedTarget, ResolveError> {
    match link.protocol.as_str() {
        "" | "file" => resolve_file_target(&link.url, current_doc),
        "id" => resolve_id_target(&link.url, root, processed),
        other => Err(ResolveError::UnsupportedProtocol(other.to_string())),
    }
}

fn resolve_file_target(url: &str, current_doc: &Path) -> Result<ResolvedTarget, ResolveError> {
    let raw = url.strip_prefix("file:").unwrap_or(url);
    let home_expanded = expand_home(raw);
    let expanded = expand_env(&home_expanded);
    let mut path = PathBuf::from(expanded.as_ref());
    if path.is_relative() {
        let base = current_doc.parent().unwrap_or_else(|| Path::new("."));
        path = base.join(path);
    }
    Ok(ResolvedTarget {
        path: normalize(&path),
        range: Range::default(),
    })
}

fn resolve_id_target(
    url: &str,
    root: Option<&Path>,
    processed: &ProcessedFiles,
) -> Result<ResolvedTarget, ResolveError> {
    let root = root.ok_or(ResolveError::NoWorkspaceRoot)?;
    let uuid = url.strip_prefix("id:").unwrap_or(url);
    let location = processed
        .uuid_index
        .get(uuid)
        .ok_or_else(|| ResolveError::UnknownId(uuid.to_string()))?;
    Ok(ResolvedTarget {
        path: normalize(&root.join(&location.file)),
        range: location.range,
    })
}

fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => match std::env::var("HOME") {
            Ok(home) => format!("{}/{}", home.trim_end_matches('/'), rest),
            Err(_) => path.to_string(),
        },
        None => path.to_string(),
    }
}

fn expand_env(path: &str) -> std::borrow::Cow<'_, str> {
    ENV_VAR_RE.replace_all(path, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
}

/// Lexically fold `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                match parts.last() {
                    Some(Component::Normal(_)) => {
                        parts.pop();
                    }
                    _ => parts.push(component),
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().map(|component| component.as_os_str()).collect()
}
