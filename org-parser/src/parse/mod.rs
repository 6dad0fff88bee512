//! Line-oriented org parser
//!
//! Org's grammar is line-anchored: every structural element is recognized by
//! the shape of its first line. The parser classifies lines in one pass,
//! recursing into list items and drawers with an adjusted margin so the
//! nodes inside them keep their original columns, then folds the flat
//! headline sequence into a tree by level.
//!
//! Headlines own their whole subtree: the property drawer (first child when
//! present), body content, and nested headlines. Their range spans the
//! subtree; all other block nodes span exactly the lines they were read
//! from.

pub mod inline;

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ast::node::{
    Block, Drawer, FootnoteDefinition, Headline, HorizontalRule, Keyword, LineBreak, List,
    ListItem, Node, Paragraph, PropertyDrawer, Row, Table,
};
use crate::ast::range::{Position, Range};
use crate::ast::Document;
use inline::parse_inline;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    Utf8 { path: PathBuf },
}

static HEADLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*+)[ \t]+(.*)$").expect("headline regex"));
static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\+([A-Za-z_][A-Za-z0-9_-]*):[ \t]*(.*)$").expect("keyword regex"));
static BLOCK_BEGIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#\+begin_([A-Za-z0-9_-]+)[ \t]*(.*)$").expect("block begin regex")
});
static DRAWER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([A-Za-z][A-Za-z0-9_-]*):[ \t]*$").expect("drawer regex"));
static PROPERTY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:([A-Za-z0-9_@#%-]+):[ \t]*(.*?)[ \t]*$").expect("property regex"));
static HR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{5,}[ \t]*$").expect("rule regex"));
static FOOTNOTE_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[fn:([A-Za-z0-9_-]+)\][ \t]*(.*)$").expect("footnote regex"));
static LIST_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([ \t]*)([-+*]|\d+[.)])(?:([ \t]+)(.*))?$").expect("list item regex")
});
static TAGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+((?::[A-Za-z0-9_@#%]+)+:)[ \t]*$").expect("tags regex"));
static STATUS_WORDS: &[&str] = &["TODO", "DONE"];

/// Parse document text. Parsing is total: malformed constructs degrade to
/// paragraphs rather than failing.
pub fn parse_str(text: &str) -> Document {
    let lines: Vec<&str> = text.lines().collect();
    let flat = parse_blocks(&lines, 0, 0);
    Document::new(nest_headlines(flat))
}

/// Parse a byte stream, reporting the filename on encoding failures.
pub fn parse_bytes(bytes: &[u8], path: &Path) -> Result<Document, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::Utf8 {
        path: path.to_path_buf(),
    })?;
    Ok(parse_str(text))
}

/// Read and parse a file from disk.
pub fn parse_file(path: &Path) -> Result<Document, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes, path)
}

/// Content of `raw` after the margin, or `None` when the line is blank at
/// this margin.
fn content_at<'a>(raw: &'a str, margin: usize) -> Option<&'a str> {
    let text = raw.get(margin..).unwrap_or("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn indent_of(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

/// `lines` are the full original lines of the document; `first` is the index
/// of the first line to consider and `margin` the number of leading bytes
/// that belong to an enclosing construct.
fn parse_blocks(lines: &[&str], first: usize, margin: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut i = first;
    while i < lines.len() {
        let Some(text) = content_at(lines[i], margin) else {
            i += 1;
            continue;
        };
        let indent = indent_of(text);
        let trimmed = text.trim();

        if margin == 0 && indent == 0 {
            if let Some(caps) = HEADLINE_RE.captures(text) {
                nodes.push(parse_headline(&caps, i));
                i += 1;
                continue;
            }
        }
        if let Some(caps) = BLOCK_BEGIN_RE.captures(trimmed) {
            let (node, next) = parse_block(lines, i, margin, &caps);
            nodes.push(node);
            i = next;
            continue;
        }
        if trimmed.starts_with("#+") {
            if let Some(caps) = KEYWORD_RE.captures(trimmed) {
                nodes.push(Node::Keyword(Keyword {
                    range: Range::lines(i, i),
                    key: caps[1].to_string(),
                    value: caps[2].trim_end().to_string(),
                }));
                i += 1;
                continue;
            }
        }
        if HR_RE.is_match(trimmed) {
            nodes.push(Node::HorizontalRule(HorizontalRule {
                range: Range::lines(i, i),
            }));
            i += 1;
            continue;
        }
        if let Some(caps) = DRAWER_RE.captures(trimmed) {
            if !caps[1].eq_ignore_ascii_case("END") {
                if let Some((node, next)) = parse_drawer(lines, i, margin, &caps[1]) {
                    nodes.push(node);
                    i = next;
                    continue;
                }
            }
        }
        if margin == 0 && indent == 0 {
            if let Some(caps) = FOOTNOTE_DEF_RE.captures(text) {
                let (node, next) = parse_footnote_definition(lines, i, &caps);
                nodes.push(node);
                i = next;
                continue;
            }
        }
        if trimmed.starts_with('|') {
            let (node, next) = parse_table(lines, i, margin);
            nodes.push(node);
            i = next;
            continue;
        }
        if let Some(caps) = LIST_ITEM_RE.captures(text) {
            let bullet = caps.get(2).expect("bullet").as_str();
            // An unindented asterisk is a headline, never a bullet.
            if bullet != "*" || margin + indent > 0 {
                let (node, next) = parse_list(lines, i, margin);
                nodes.push(node);
                i = next;
                continue;
            }
        }
        let (node, next) = parse_paragraph(lines, i, margin);
        nodes.push(node);
        i = next;
    }
    nodes
}

fn parse_headline(caps: &regex::Captures<'_>, line_no: usize) -> Node {
    let stars = caps.get(1).expect("stars").as_str();
    let level = stars.len();
    let rest_match = caps.get(2).expect("headline rest");
    let mut rest = rest_match.as_str();
    let mut offset = rest_match.start();

    let mut tags = Vec::new();
    if let Some(tag_caps) = TAGS_RE.captures(rest) {
        let tag_match = tag_caps.get(1).expect("tag list");
        tags = tag_match
            .as_str()
            .split(':')
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        rest = &rest[..tag_caps.get(0).expect("tag span").start()];
    }

    let mut status = None;
    for word in STATUS_WORDS {
        if let Some(after) = rest.strip_prefix(word) {
            if after.is_empty() || after.starts_with(' ') || after.starts_with('\t') {
                status = Some(word.to_string());
                let skip = rest.len() - after.trim_start().len();
                offset += skip;
                rest = after.trim_start();
                break;
            }
        }
    }

    let mut priority = None;
    if rest.len() >= 4 && rest.starts_with("[#") && rest.as_bytes()[3] == b']' {
        let cookie = rest.as_bytes()[2] as char;
        if cookie.is_ascii_uppercase() {
            priority = Some(cookie);
            let after = rest[4..].trim_start();
            offset += rest.len() - after.len();
            rest = after;
        }
    }

    let title_text = rest.trim_end();
    let title = parse_inline(title_text, line_no, offset);

    Node::Headline(Headline {
        range: Range::lines(line_no, line_no),
        level,
        status,
        priority,
        title,
        tags,
        children: Vec::new(),
    })
}

fn parse_block(
    lines: &[&str],
    start: usize,
    margin: usize,
    caps: &regex::Captures<'_>,
) -> (Node, usize) {
    let name = caps[1].to_string();
    let end_marker = format!("#+end_{}", name.to_lowercase());
    let parameters: Vec<String> = caps[2].split_whitespace().map(str::to_string).collect();

    let mut content = Vec::new();
    let mut i = start + 1;
    let mut end_line = lines.len().saturating_sub(1);
    while i < lines.len() {
        let text = lines[i].get(margin..).unwrap_or("");
        if text.trim().to_lowercase() == end_marker {
            end_line = i;
            i += 1;
            break;
        }
        content.push(text.to_string());
        end_line = i;
        i += 1;
    }
    let node = Node::Block(Block {
        range: Range::lines(start, end_line),
        name,
        parameters,
        content,
    });
    (node, i)
}

fn parse_drawer(lines: &[&str], start: usize, margin: usize, name: &str) -> Option<(Node, usize)> {
    let mut end = None;
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        let text = line.get(margin..).unwrap_or("");
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case(":END:") {
            end = Some(i);
            break;
        }
        // A new structural line means the drawer was never closed.
        if margin == 0 && HEADLINE_RE.is_match(text) {
            break;
        }
    }
    let end = end?;
    let range = Range::lines(start, end);
    let drawer_node = if name.eq_ignore_ascii_case("PROPERTIES") {
        let mut properties = Vec::new();
        for line in &lines[start + 1..end] {
            let text = line.get(margin..).unwrap_or("").trim();
            if let Some(caps) = PROPERTY_RE.captures(text) {
                properties.push((caps[1].to_uppercase(), caps[2].to_string()));
            }
        }
        Node::PropertyDrawer(PropertyDrawer { range, properties })
    } else {
        let children = parse_blocks(&lines[..end], start + 1, margin);
        Node::Drawer(Drawer {
            range,
            name: name.to_string(),
            children,
        })
    };
    Some((drawer_node, end + 1))
}

fn parse_footnote_definition(
    lines: &[&str],
    start: usize,
    caps: &regex::Captures<'_>,
) -> (Node, usize) {
    let label = caps[1].to_string();
    let body_match = caps.get(2).expect("footnote body");
    let mut children = parse_inline(body_match.as_str(), start, body_match.start());
    let mut i = start + 1;
    let mut end_line = start;
    while i < lines.len() {
        let Some(text) = content_at(lines[i], 0) else {
            break;
        };
        if is_structural(text) {
            break;
        }
        children.push(line_break(i - 1, lines[i - 1].len()));
        children.extend(parse_inline(text, i, 0));
        end_line = i;
        i += 1;
    }
    let node = Node::FootnoteDefinition(FootnoteDefinition {
        range: Range::lines(start, end_line),
        label,
        children: vec![Node::Paragraph(Paragraph {
            range: Range::lines(start, end_line),
            children,
        })],
    });
    (node, i)
}

fn parse_table(lines: &[&str], start: usize, margin: usize) -> (Node, usize) {
    let mut rows = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let Some(text) = content_at(lines[i], margin) else {
            break;
        };
        let trimmed = text.trim();
        if !trimmed.starts_with('|') {
            break;
        }
        rows.push(parse_row(trimmed, i));
        i += 1;
    }
    let end = i.saturating_sub(1).max(start);
    let node = Node::Table(Table {
        range: Range::lines(start, end),
        rows,
    });
    (node, i)
}

fn parse_row(trimmed: &str, line_no: usize) -> Node {
    let separator = trimmed
        .chars()
        .all(|ch| matches!(ch, '|' | '-' | '+' | ' '))
        && trimmed.contains('-');
    let mut inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    inner = inner.strip_suffix('|').unwrap_or(inner);
    let cells = if separator {
        Vec::new()
    } else {
        inner.split('|').map(|cell| cell.trim().to_string()).collect()
    };
    Node::Row(Row {
        range: Range::lines(line_no, line_no),
        cells,
        separator,
    })
}

fn parse_list(lines: &[&str], start: usize, margin: usize) -> (Node, usize) {
    let first_caps = LIST_ITEM_RE
        .captures(content_at(lines[start], margin).expect("list start line"))
        .expect("list item shape");
    let item_indent = first_caps[1].len();
    let ordered = first_caps[2].chars().next().map(|c| c.is_ascii_digit()) == Some(true);

    let mut items = Vec::new();
    let mut i = start;
    while i < lines.len() {
        let Some(text) = content_at(lines[i], margin) else {
            // One blank line keeps the list open when an item or deeper
            // content follows; a longer gap ends it.
            match next_content(lines, i, margin) {
                Some((next_i, indent))
                    if next_i - i < 2
                        && (indent > item_indent
                            || (indent == item_indent
                                && LIST_ITEM_RE.is_match(
                                    content_at(lines[next_i], margin).unwrap_or(""),
                                ))) =>
                {
                    i += 1;
                    continue;
                }
                _ => break,
            }
        };
        let indent = indent_of(text);
        if indent < item_indent {
            break;
        }
        if indent == item_indent {
            let Some(caps) = LIST_ITEM_RE.captures(text) else {
                break;
            };
            if caps[1].len() != item_indent {
                break;
            }
            let (item, next) = parse_list_item(lines, i, margin, &caps);
            items.push(item);
            i = next;
            continue;
        }
        // Deeper than the bullet but no enclosing item claimed it; bail out
        // and let the paragraph parser have it.
        break;
    }
    let end_line = items
        .last()
        .map(|item: &Node| item.range().end.line)
        .unwrap_or(start);
    let node = Node::List(List {
        range: Range::lines(start, end_line),
        ordered,
        items,
    });
    (node, i)
}

fn parse_list_item(
    lines: &[&str],
    start: usize,
    margin: usize,
    caps: &regex::Captures<'_>,
) -> (Node, usize) {
    let indent = caps[1].len();
    let bullet = caps[2].to_string();
    let gap = caps.get(3).map(|m| m.len()).unwrap_or(1);
    let content_margin = margin + indent + bullet.len() + gap;

    let mut end_line = start;
    let mut i = start + 1;
    while i < lines.len() {
        match content_at(lines[i], margin) {
            None => match next_content(lines, i, margin) {
                Some((next_i, next_indent)) if next_i - i < 2 && next_indent > indent => {
                    i += 1;
                    continue;
                }
                _ => break,
            },
            Some(text) => {
                if indent_of(text) <= indent {
                    break;
                }
                end_line = i;
                i += 1;
            }
        }
    }

    let children = parse_blocks(&lines[..i.min(lines.len())], start, content_margin);
    let node = Node::ListItem(ListItem {
        range: Range::lines(start, end_line),
        bullet,
        indent: margin + indent,
        children,
    });
    (node, i)
}

fn next_content(lines: &[&str], from: usize, margin: usize) -> Option<(usize, usize)> {
    for (i, line) in lines.iter().enumerate().skip(from) {
        if let Some(text) = content_at(line, margin) {
            return Some((i, indent_of(text)));
        }
    }
    None
}

fn parse_paragraph(lines: &[&str], start: usize, margin: usize) -> (Node, usize) {
    let mut children = Vec::new();
    let mut i = start;
    let mut end_line = start;
    while i < lines.len() {
        let Some(text) = content_at(lines[i], margin) else {
            break;
        };
        if i > start && is_structural(text) {
            break;
        }
        if i > start {
            children.push(line_break(i - 1, lines[i - 1].len()));
        }
        children.extend(parse_inline(text, i, margin));
        end_line = i;
        i += 1;
    }
    let node = Node::Paragraph(Paragraph {
        range: Range::lines(start, end_line),
        children,
    });
    (node, i)
}

fn line_break(line_no: usize, line_len: usize) -> Node {
    Node::LineBreak(LineBreak {
        range: Range::new(Position::new(line_no, line_len), Position::new(line_no + 1, 0)),
    })
}

/// Whether a line starts a non-paragraph construct and therefore terminates
/// paragraph accumulation.
fn is_structural(text: &str) -> bool {
    let trimmed = text.trim();
    HEADLINE_RE.is_match(text)
        || trimmed.starts_with("#+")
        || HR_RE.is_match(trimmed)
        || DRAWER_RE.is_match(trimmed)
        || FOOTNOTE_DEF_RE.is_match(text)
        || trimmed.starts_with('|')
        || LIST_ITEM_RE
            .captures(text)
            .map(|caps| &caps[2] != "*" || indent_of(text) > 0)
            .unwrap_or(false)
}

/// Fold the flat node sequence into a headline tree: each headline collects
/// everything up to the next headline of the same or a shallower level, and
/// its range grows to cover the collected subtree.
fn nest_headlines(flat: Vec<Node>) -> Vec<Node> {
    let mut top = Vec::new();
    let mut stack: Vec<Headline> = Vec::new();

    fn close_one(stack: &mut Vec<Headline>, top: &mut Vec<Node>) {
        let mut done = stack.pop().expect("non-empty stack");
        if let Some(last) = done.children.last() {
            done.range.end = done.range.end.max(last.range().end);
        }
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Headline(done)),
            None => top.push(Node::Headline(done)),
        }
    }

    for node in flat {
        match node {
            Node::Headline(headline) => {
                while stack
                    .last()
                    .map(|open| open.level >= headline.level)
                    .unwrap_or(false)
                {
                    close_one(&mut stack, &mut top);
                }
                stack.push(headline);
            }
            other => match stack.last_mut() {
                Some(open) => open.children.push(other),
                None => top.push(other),
            },
        }
    }
    while !stack.is_empty() {
        close_one(&mut stack, &mut top);
    }
    top
}
