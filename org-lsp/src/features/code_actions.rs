//! Refactoring and quick-fix code actions
//!
//! Three families, judged independently from the selection and cursor:
//!
//! - headlines in the selection → convert the subtree to an ordered or
//!   bullet list;
//! - cursor inside a list → convert the list to headings one level below
//!   the enclosing heading;
//! - cursor inside a `src` block → evaluate it through the
//!   `executeCodeBlock` command.

use std::collections::HashMap;

use serde_json::json;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Command, Position as LspPosition,
    Range as LspRange, TextEdit, Url, WorkspaceEdit,
};

use org_analysis::{
    find_node_at, find_nodes_in_range, heading_subtree_to_list, list_to_heading_subtree, ListKind,
};
use org_parser::ast::{Node, NodeKind, Position};
use org_parser::serialize;

use crate::convert::from_lsp_position;
use crate::features::commands::COMMAND_EXECUTE_CODE_BLOCK;
use crate::session::Session;

pub fn code_actions(session: &Session, uri: &Url, range: LspRange) -> Vec<CodeActionOrCommand> {
    let Some(doc) = session.get(uri) else {
        return Vec::new();
    };
    let mut actions = Vec::new();
    let cursor = from_lsp_position(range.start);

    heading_conversion_actions(&doc.document.nodes, uri, range, &mut actions);
    list_conversion_action(&doc.document, uri, cursor, &mut actions);
    evaluate_block_action(&doc.document, uri, cursor, &mut actions);
    actions
}

fn heading_conversion_actions(
    nodes: &[Node],
    uri: &Url,
    range: LspRange,
    actions: &mut Vec<CodeActionOrCommand>,
) {
    let selected = find_nodes_in_range(nodes, range.start.line as usize, range.end.line as usize);
    if !selected.iter().any(|node| node.kind() == NodeKind::Headline) {
        return;
    }
    let start_line = selected
        .iter()
        .map(|node| node.range().start.line)
        .min()
        .unwrap_or(0);
    let end_line = selected
        .iter()
        .map(|node| node.range().end.line)
        .max()
        .unwrap_or(start_line);
    let cloned: Vec<Node> = selected.into_iter().cloned().collect();

    for (title, kind) in [
        ("Convert headings to ordered list", ListKind::Ordered),
        ("Convert headings to bullet list", ListKind::Unordered),
    ] {
        let converted = heading_subtree_to_list(&cloned, kind);
        let mut new_text = serialize(&converted);
        new_text.push('\n');
        actions.push(replace_lines_action(
            title, uri, start_line, end_line, new_text,
        ));
    }
}

fn list_conversion_action(
    document: &org_parser::ast::Document,
    uri: &Url,
    cursor: Position,
    actions: &mut Vec<CodeActionOrCommand>,
) {
    let Some(Node::List(list)) = find_node_at(document, NodeKind::List, cursor) else {
        return;
    };
    let level = match find_node_at(document, NodeKind::Headline, cursor) {
        Some(Node::Headline(headline)) => headline.level + 1,
        _ => 1,
    };
    let new_text = serialize(&list_to_heading_subtree(list, level));
    actions.push(replace_lines_action(
        "Convert list to headings",
        uri,
        list.range.start.line,
        list.range.end.line,
        new_text,
    ));
}

fn evaluate_block_action(
    document: &org_parser::ast::Document,
    uri: &Url,
    cursor: Position,
    actions: &mut Vec<CodeActionOrCommand>,
) {
    let Some(Node::Block(block)) = find_node_at(document, NodeKind::Block, cursor) else {
        return;
    };
    if !block.name.eq_ignore_ascii_case("src") {
        return;
    }
    actions.push(CodeActionOrCommand::CodeAction(CodeAction {
        title: "Evaluate source block".to_string(),
        kind: Some(CodeActionKind::QUICKFIX),
        command: Some(Command {
            title: "Evaluate source block".to_string(),
            command: COMMAND_EXECUTE_CODE_BLOCK.to_string(),
            arguments: Some(vec![
                json!(uri.to_string()),
                json!(block.range.start.line),
                json!(block.range.start.column),
            ]),
        }),
        ..CodeAction::default()
    }));
}

/// A refactor action replacing whole lines `start_line..=end_line`.
fn replace_lines_action(
    title: &str,
    uri: &Url,
    start_line: usize,
    end_line: usize,
    new_text: String,
) -> CodeActionOrCommand {
    let edit = TextEdit {
        range: LspRange {
            start: LspPosition::new(start_line as u32, 0),
            end: LspPosition::new(end_line as u32 + 1, 0),
        },
        new_text,
    };
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![edit]);
    CodeActionOrCommand::CodeAction(CodeAction {
        title: title.to_string(),
        kind: Some(CodeActionKind::REFACTOR_REWRITE),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            ..WorkspaceEdit::default()
        }),
        ..CodeAction::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(text: &str) -> (Session, Url) {
        let mut session = Session::new();
        let uri = Url::parse("file:///tmp/actions.org").expect("uri");
        session.open(uri.clone(), text.to_string(), 1);
        (session, uri)
    }

    fn line_range(start: u32, end: u32) -> LspRange {
        LspRange {
            start: LspPosition::new(start, 0),
            end: LspPosition::new(end, 0),
        }
    }

    fn edit_text(action: &CodeActionOrCommand) -> &str {
        let CodeActionOrCommand::CodeAction(action) = action else {
            panic!("expected code action");
        };
        let changes = action
            .edit
            .as_ref()
            .expect("edit")
            .changes
            .as_ref()
            .expect("changes");
        &changes.values().next().expect("one uri")[0].new_text
    }

    #[test]
    fn heading_selection_offers_both_list_conversions() {
        let (session, uri) = session_with("* First\nContent.\n");
        let actions = code_actions(&session, &uri, line_range(0, 1));
        let titles: Vec<&str> = actions
            .iter()
            .map(|action| match action {
                CodeActionOrCommand::CodeAction(action) => action.title.as_str(),
                CodeActionOrCommand::Command(command) => command.title.as_str(),
            })
            .collect();
        assert!(titles.contains(&"Convert headings to ordered list"));
        assert!(titles.contains(&"Convert headings to bullet list"));

        let ordered = actions
            .iter()
            .find(|action| matches!(action, CodeActionOrCommand::CodeAction(a) if a.title.contains("ordered")))
            .expect("ordered action");
        assert_eq!(edit_text(ordered), "1. First\n   Content.\n\n");
    }

    #[test]
    fn heading_edit_covers_subtree_lines() {
        let (session, uri) = session_with("* First\nContent.\nMore.\n");
        let actions = code_actions(&session, &uri, line_range(0, 0));
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected action");
        };
        let edit = &action.edit.as_ref().expect("edit").changes.as_ref().expect("changes")
            [&uri][0];
        assert_eq!(edit.range.start.line, 0);
        assert_eq!(edit.range.end.line, 3);
    }

    #[test]
    fn list_cursor_offers_heading_conversion_below_parent() {
        let (session, uri) = session_with("* Parent\n- alpha\n- beta\n");
        let actions = code_actions(&session, &uri, line_range(1, 1));
        let convert = actions
            .iter()
            .find(|action| matches!(action, CodeActionOrCommand::CodeAction(a) if a.title == "Convert list to headings"))
            .expect("list conversion offered");
        assert_eq!(edit_text(convert), "** alpha\n\n** beta\n");
    }

    #[test]
    fn top_level_list_converts_to_level_one() {
        let (session, uri) = session_with("- alpha\n");
        let actions = code_actions(&session, &uri, line_range(0, 0));
        let convert = actions
            .iter()
            .find(|action| matches!(action, CodeActionOrCommand::CodeAction(a) if a.title == "Convert list to headings"))
            .expect("list conversion offered");
        assert_eq!(edit_text(convert), "* alpha\n");
    }

    #[test]
    fn src_block_cursor_offers_evaluation_command() {
        let (session, uri) = session_with("#+begin_src sh\necho hi\n#+end_src\n");
        let actions = code_actions(&session, &uri, line_range(1, 1));
        let CodeActionOrCommand::CodeAction(action) = actions
            .iter()
            .find(|action| matches!(action, CodeActionOrCommand::CodeAction(a) if a.title == "Evaluate source block"))
            .expect("evaluate action")
        else {
            panic!("expected code action");
        };
        let command = action.command.as_ref().expect("command");
        assert_eq!(command.command, COMMAND_EXECUTE_CODE_BLOCK);
        let args = command.arguments.as_ref().expect("arguments");
        assert_eq!(args[1], json!(0));
        assert_eq!(args[2], json!(0));
    }

    #[test]
    fn quote_block_gets_no_evaluation() {
        let (session, uri) = session_with("#+begin_quote\nwords\n#+end_quote\n");
        let actions = code_actions(&session, &uri, line_range(1, 1));
        assert!(actions.is_empty());
    }

    #[test]
    fn plain_paragraph_has_no_actions() {
        let (session, uri) = session_with("just text\n");
        let actions = code_actions(&session, &uri, line_range(0, 0));
        assert!(actions.is_empty());
    }
}
