//! Conversions between AST positions and LSP wire types
//!
//! The AST is 0-based lines and byte columns; so are `lsp_types` positions
//! (modulo the UTF-16 caveat, which this server shares with its column
//! convention). Conversions live here and nowhere else.

use tower_lsp::lsp_types::{Position as LspPosition, Range as LspRange};

use org_parser::ast::{Position, Range};

pub fn to_lsp_position(position: Position) -> LspPosition {
    LspPosition::new(position.line as u32, position.column as u32)
}

pub fn to_lsp_range(range: Range) -> LspRange {
    LspRange {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}

/// Zero-length range at a position, for definition targets.
pub fn point_range(position: Position) -> LspRange {
    let point = to_lsp_position(position);
    LspRange {
        start: point,
        end: point,
    }
}

pub fn from_lsp_position(position: LspPosition) -> Position {
    Position::new(position.line as usize, position.character as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_positions() {
        let pos = Position::new(3, 14);
        assert_eq!(from_lsp_position(to_lsp_position(pos)), pos);
    }

    #[test]
    fn point_range_is_zero_length() {
        let range = point_range(Position::new(2, 0));
        assert_eq!(range.start, range.end);
        assert_eq!(range.start.line, 2);
    }
}
