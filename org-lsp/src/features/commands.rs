//! Server command dispatch
//!
//! One command is recognized: `executeCodeBlock (uri, line, col)`. It
//! re-locates the source block at that position in the open document,
//! hands its content to the executor for the block's declared language,
//! and returns the captured output. Unknown commands and malformed
//! arguments are protocol-visible failures, unlike query handlers which
//! collapse to empty results.

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::Url;
use tracing::info;

use org_analysis::find_node_at;
use org_parser::ast::{Node, NodeKind, Position};

use crate::session::Session;

pub const COMMAND_EXECUTE_CODE_BLOCK: &str = "executeCodeBlock";

pub fn execute_command(
    session: &Session,
    command: &str,
    arguments: &[Value],
) -> Result<Option<Value>> {
    match command {
        COMMAND_EXECUTE_CODE_BLOCK => execute_code_block(session, arguments),
        _ => Err(Error::invalid_request()),
    }
}

fn execute_code_block(session: &Session, arguments: &[Value]) -> Result<Option<Value>> {
    let (uri, pos) = parse_arguments(arguments)?;
    let doc = session
        .get(&uri)
        .ok_or_else(|| invalid_params(format!("document not open: {uri}")))?;
    let Some(Node::Block(block)) = find_node_at(&doc.document, NodeKind::Block, pos) else {
        return Err(invalid_params(format!("no source block at {pos}")));
    };
    if !block.name.eq_ignore_ascii_case("src") {
        return Err(invalid_params(format!(
            "block at {pos} is {:?}, not src",
            block.name
        )));
    }
    let language = block
        .language()
        .ok_or_else(|| invalid_params("source block has no language".to_string()))?;

    info!(language, line = pos.line, "executing source block");
    let code = block.content.join("\n");
    match org_babel::execute(language, &code) {
        Ok(output) => Ok(Some(Value::String(output))),
        Err(err) => Err(Error {
            code: ErrorCode::InternalError,
            message: err.to_string().into(),
            data: None,
        }),
    }
}

fn parse_arguments(arguments: &[Value]) -> Result<(Url, Position)> {
    let [uri, line, col] = arguments else {
        return Err(invalid_params(format!(
            "executeCodeBlock expects (uri, line, col), got {} arguments",
            arguments.len()
        )));
    };
    let uri = uri
        .as_str()
        .and_then(|raw| Url::parse(raw).ok())
        .ok_or_else(|| invalid_params("first argument must be a document URI".to_string()))?;
    let line = line
        .as_u64()
        .ok_or_else(|| invalid_params("second argument must be a line number".to_string()))?;
    let col = col
        .as_u64()
        .ok_or_else(|| invalid_params("third argument must be a column number".to_string()))?;
    Ok((uri, Position::new(line as usize, col as usize)))
}

fn invalid_params(message: String) -> Error {
    Error {
        code: ErrorCode::InvalidParams,
        message: message.into(),
        data: None,
    }
}
