//! Inline scanner
//!
//! Turns the content of a single source line into column-accurate inline
//! nodes. The scanner walks the line byte-wise, trying the bracketed forms
//! first (links, footnotes, cookies, timestamps), then macros, inline source
//! fragments, latex and emphasis, and accumulates everything else into text
//! runs. Columns are byte offsets within the original line; `col_offset`
//! shifts them when the content sits inside an indented construct.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::node::{
    Emphasis, ExplicitLineBreak, FootnoteLink, InlineBlock, LatexFragment, Macro, Node,
    RegularLink, StatisticToken, Text, Timestamp,
};
use crate::ast::range::{Position, Range};

static PROTOCOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*):").expect("protocol regex"));
static STATISTIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(\d+%|\d+/\d+)\]").expect("statistic regex"));
static ACTIVE_TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<\d{4}-\d{2}-\d{2}[^>\n]*>").expect("timestamp regex"));
static INACTIVE_TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\d{4}-\d{2}-\d{2}[^\]\n]*\]").expect("timestamp regex"));
static FOOTNOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[fn:([A-Za-z0-9_-]+)\]").expect("footnote regex"));
static MACRO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{\{([A-Za-z][A-Za-z0-9_-]*)(?:\(([^)]*)\))?\}\}\}")
        .expect("macro regex"));
static INLINE_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^src_([A-Za-z0-9-]+)\{([^}\n]*)\}").expect("inline src regex"));
static LATEX_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\\\((?s).*?\\\)").expect("latex regex"));

const EMPHASIS_MARKERS: &[char] = &['*', '/', '_', '=', '~', '+'];

/// Parse one line of content into inline nodes.
pub fn parse_inline(line: &str, line_no: usize, col_offset: usize) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut text_start = 0usize;
    let mut i = 0usize;
    let bytes = line.as_bytes();

    while i < line.len() {
        if let Some((node, consumed)) = match_at(line, i, line_no, col_offset) {
            flush_text(line, text_start, i, line_no, col_offset, &mut nodes);
            nodes.push(node);
            i += consumed;
            text_start = i;
            continue;
        }
        // Advance one whole character so multi-byte sequences stay intact.
        i += match bytes[i] {
            b if b < 0x80 => 1,
            _ => line[i..].chars().next().map(char::len_utf8).unwrap_or(1),
        };
    }
    flush_text(line, text_start, line.len(), line_no, col_offset, &mut nodes);

    // A trailing backslash pair is a hard line break, not text.
    let break_start = match nodes.last_mut() {
        Some(Node::Text(last)) if last.value.ends_with("\\\\") => {
            let start_col = last.range.end.column - 2;
            last.value.truncate(last.value.len() - 2);
            last.range.end = Position::new(line_no, start_col);
            Some(start_col)
        }
        _ => None,
    };
    if let Some(start_col) = break_start {
        if matches!(nodes.last(), Some(Node::Text(t)) if t.value.is_empty()) {
            nodes.pop();
        }
        nodes.push(Node::ExplicitLineBreak(ExplicitLineBreak {
            range: Range::new(
                Position::new(line_no, start_col),
                Position::new(line_no, start_col + 2),
            ),
        }));
    }

    nodes
}

fn flush_text(
    line: &str,
    start: usize,
    end: usize,
    line_no: usize,
    col_offset: usize,
    nodes: &mut Vec<Node>,
) {
    if end > start {
        nodes.push(Node::Text(Text {
            range: Range::new(
                Position::new(line_no, col_offset + start),
                Position::new(line_no, col_offset + end),
            ),
            value: line[start..end].to_string(),
        }));
    }
}

fn match_at(line: &str, i: usize, line_no: usize, col_offset: usize) -> Option<(Node, usize)> {
    let rest = &line[i..];
    let start = Position::new(line_no, col_offset + i);

    if rest.starts_with("[[") {
        if let Some(result) = match_link(rest, start, line_no) {
            return Some(result);
        }
    }
    if rest.starts_with("[fn:") {
        if let Some(caps) = FOOTNOTE_RE.captures(rest) {
            let whole = caps.get(0).expect("whole match");
            let node = Node::FootnoteLink(FootnoteLink {
                range: span(start, whole.len()),
                label: caps[1].to_string(),
            });
            return Some((node, whole.len()));
        }
    }
    if rest.starts_with('[') {
        if let Some(caps) = STATISTIC_RE.captures(rest) {
            let whole = caps.get(0).expect("whole match");
            let node = Node::StatisticToken(StatisticToken {
                range: span(start, whole.len()),
                value: caps[1].to_string(),
            });
            return Some((node, whole.len()));
        }
        if let Some(found) = INACTIVE_TIMESTAMP_RE.find(rest) {
            let node = Node::Timestamp(Timestamp {
                range: span(start, found.len()),
                raw: found.as_str().to_string(),
                active: false,
            });
            return Some((node, found.len()));
        }
    }
    if rest.starts_with('<') {
        if let Some(found) = ACTIVE_TIMESTAMP_RE.find(rest) {
            let node = Node::Timestamp(Timestamp {
                range: span(start, found.len()),
                raw: found.as_str().to_string(),
                active: true,
            });
            return Some((node, found.len()));
        }
    }
    if rest.starts_with("{{{") {
        if let Some(caps) = MACRO_RE.captures(rest) {
            let whole = caps.get(0).expect("whole match");
            let args = caps
                .get(2)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(|arg| arg.trim().to_string())
                        .collect()
                })
                .unwrap_or_default();
            let node = Node::Macro(Macro {
                range: span(start, whole.len()),
                name: caps[1].to_string(),
                args,
            });
            return Some((node, whole.len()));
        }
    }
    if rest.starts_with("src_") && boundary_before(line, i) {
        if let Some(caps) = INLINE_SRC_RE.captures(rest) {
            let whole = caps.get(0).expect("whole match");
            let node = Node::InlineBlock(InlineBlock {
                range: span(start, whole.len()),
                language: caps[1].to_string(),
                value: caps[2].to_string(),
            });
            return Some((node, whole.len()));
        }
    }
    if rest.starts_with("\\(") {
        if let Some(found) = LATEX_PAREN_RE.find(rest) {
            let node = Node::LatexFragment(LatexFragment {
                range: span(start, found.len()),
                value: found.as_str().to_string(),
            });
            return Some((node, found.len()));
        }
    }
    if rest.starts_with('$') {
        if let Some(len) = match_dollar_fragment(rest) {
            let node = Node::LatexFragment(LatexFragment {
                range: span(start, len),
                value: rest[..len].to_string(),
            });
            return Some((node, len));
        }
    }
    let first = rest.chars().next()?;
    if EMPHASIS_MARKERS.contains(&first) && boundary_before(line, i) {
        if let Some(result) = match_emphasis(rest, first, start, line_no) {
            return Some(result);
        }
    }
    None
}

fn span(start: Position, len: usize) -> Range {
    Range::new(start, Position::new(start.line, start.column + len))
}

fn match_link(rest: &str, start: Position, line_no: usize) -> Option<(Node, usize)> {
    let close = rest.find("]]")?;
    let inner = &rest[2..close];
    if inner.is_empty() {
        return None;
    }
    let total = close + 2;
    let (url, description) = match inner.find("][") {
        Some(split) => {
            let desc_text = &inner[split + 2..];
            let desc_col = start.column + 2 + split + 2;
            let description = parse_inline(desc_text, line_no, desc_col);
            (&inner[..split], description)
        }
        None => (inner, Vec::new()),
    };
    let protocol = PROTOCOL_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();
    let node = Node::RegularLink(RegularLink {
        range: span(start, total),
        protocol,
        url: url.to_string(),
        description,
    });
    Some((node, total))
}

fn match_dollar_fragment(rest: &str) -> Option<usize> {
    let inner = &rest[1..];
    let close = inner.find('$')?;
    if close == 0 {
        return None;
    }
    let body = &inner[..close];
    if body.starts_with(char::is_whitespace) || body.ends_with(char::is_whitespace) {
        return None;
    }
    Some(close + 2)
}

fn match_emphasis(
    rest: &str,
    marker: char,
    start: Position,
    line_no: usize,
) -> Option<(Node, usize)> {
    let marker_len = marker.len_utf8();
    let inner = &rest[marker_len..];
    let close = find_emphasis_close(inner, marker)?;
    let body = &inner[..close];
    if body.starts_with(char::is_whitespace) || body.ends_with(char::is_whitespace) {
        return None;
    }
    let total = marker_len + close + marker_len;
    // The byte after the closing marker must not continue a word.
    if let Some(after) = rest[total..].chars().next() {
        if after.is_alphanumeric() {
            return None;
        }
    }
    let content = if marker == '=' || marker == '~' {
        // Verbatim and code bodies stay literal.
        vec![Node::Text(Text {
            range: Range::new(
                Position::new(line_no, start.column + marker_len),
                Position::new(line_no, start.column + marker_len + body.len()),
            ),
            value: body.to_string(),
        })]
    } else {
        parse_inline(body, line_no, start.column + marker_len)
    };
    let node = Node::Emphasis(Emphasis {
        range: span(start, total),
        marker,
        content,
    });
    Some((node, total))
}

fn find_emphasis_close(inner: &str, marker: char) -> Option<usize> {
    let mut candidate = None;
    for (idx, ch) in inner.char_indices() {
        if ch == marker && idx > 0 {
            candidate = Some(idx);
            break;
        }
    }
    candidate
}

/// Emphasis and inline-src openers only count after a word boundary.
fn boundary_before(line: &str, i: usize) -> bool {
    if i == 0 {
        return true;
    }
    line[..i]
        .chars()
        .next_back()
        .map(|ch| ch.is_whitespace() || matches!(ch, '(' | '[' | '{' | '\'' | '"' | '-' | ':'))
        .unwrap_or(true)
}
