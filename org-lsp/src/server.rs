//! Main language server implementation
//!
//! Thin protocol layer over the feature modules: every handler converts
//! wire types, takes the session lock in the right mode (shared for
//! queries, exclusive for document sync and rescans) and delegates. A
//! panicking handler is caught at this boundary and collapses to an empty
//! response so one bad document cannot take the server down.

use std::panic::AssertUnwindSafe;

use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionParams, CodeActionProviderCapability, CodeActionResponse, CompletionOptions,
    CompletionParams, CompletionResponse, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, DocumentFormattingParams,
    DocumentRangeFormattingParams, DocumentSymbolParams, DocumentSymbolResponse,
    ExecuteCommandOptions, ExecuteCommandParams, FoldingRange, FoldingRangeParams,
    FoldingRangeProviderCapability, GotoDefinitionParams, GotoDefinitionResponse, Hover,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    Location, OneOf, ReferenceParams, SaveOptions, ServerCapabilities, ServerInfo,
    SymbolInformation, TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions,
    TextDocumentSyncSaveOptions, TextEdit, WillSaveTextDocumentParams, WorkspaceSymbolParams,
};
use tower_lsp::Client;
use tracing::{error, warn};

use crate::convert::from_lsp_position;
use crate::features::commands::{execute_command, COMMAND_EXECUTE_CODE_BLOCK};
use crate::features::{
    code_actions, completion, definition, document_symbols, folding_ranges, formatting, hover,
    references, workspace_symbols,
};
use crate::session::Session;

pub trait LspClient: Send + Sync + 'static {}
impl LspClient for Client {}

pub struct OrgLanguageServer<C = Client> {
    _client: C,
    session: RwLock<Session>,
}

impl OrgLanguageServer<Client> {
    pub fn new(client: Client) -> Self {
        Self::with_session(client, Session::new())
    }
}

impl<C: LspClient> OrgLanguageServer<C> {
    pub fn with_session(client: C, session: Session) -> Self {
        Self {
            _client: client,
            session: RwLock::new(session),
        }
    }
}

/// Run a handler body, converting a panic into `None` at the boundary.
fn catch<T>(handler: &'static str, body: impl FnOnce() -> T) -> Option<T> {
    match std::panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            let backtrace = std::backtrace::Backtrace::force_capture();
            error!(handler, message = %message, backtrace = %backtrace, "handler panicked");
            None
        }
    }
}

fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: None,
                will_save_wait_until: Some(true),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(false),
                })),
            },
        )),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        workspace_symbol_provider: Some(OneOf::Left(true)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![":".to_string(), "_".to_string()]),
            ..CompletionOptions::default()
        }),
        code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: vec![COMMAND_EXECUTE_CODE_BLOCK.to_string()],
            ..ExecuteCommandOptions::default()
        }),
        document_formatting_provider: Some(OneOf::Left(true)),
        document_range_formatting_provider: Some(OneOf::Left(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        ..ServerCapabilities::default()
    }
}

#[async_trait]
impl<C: LspClient> tower_lsp::LanguageServer for OrgLanguageServer<C> {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());
        if let Some(root) = root {
            self.session.write().await.set_root(root);
        }
        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "org-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {}

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.session
            .write()
            .await
            .open(doc.uri, doc.text, doc.version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let mut full_text = None;
        for change in params.content_changes {
            if change.range.is_some() {
                warn!(%uri, "incremental change events are not supported; ignoring");
            } else {
                full_text = Some(change.text);
            }
        }
        if let Some(text) = full_text {
            self.session.write().await.replace(&uri, text, version);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.session.write().await.close(&params.text_document.uri);
    }

    async fn did_save(&self, _: DidSaveTextDocumentParams) {
        self.session.write().await.rescan();
    }

    async fn will_save_wait_until(
        &self,
        params: WillSaveTextDocumentParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let session = self.session.read().await;
        Ok(catch("willSaveWaitUntil", || {
            formatting::formatting(&session, &params.text_document.uri)
        })
        .flatten())
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position_params = params.text_document_position_params;
        let session = self.session.read().await;
        let found = catch("definition", || {
            definition::definition(
                &session,
                &position_params.text_document.uri,
                from_lsp_position(position_params.position),
            )
        })
        .flatten();
        Ok(found.map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let position_params = params.text_document_position;
        let session = self.session.read().await;
        let found = catch("references", || {
            references::references(
                &session,
                &position_params.text_document.uri,
                from_lsp_position(position_params.position),
            )
        })
        .unwrap_or_default();
        Ok(if found.is_empty() { None } else { Some(found) })
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position_params = params.text_document_position_params;
        let session = self.session.read().await;
        Ok(catch("hover", || {
            hover::hover(
                &session,
                &position_params.text_document.uri,
                from_lsp_position(position_params.position),
            )
        })
        .flatten())
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position_params = params.text_document_position;
        let session = self.session.read().await;
        let items = catch("completion", || {
            completion::completion(
                &session,
                &position_params.text_document.uri,
                from_lsp_position(position_params.position),
            )
        })
        .unwrap_or_default();
        Ok(if items.is_empty() {
            None
        } else {
            Some(CompletionResponse::Array(items))
        })
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let session = self.session.read().await;
        let symbols = catch("documentSymbol", || {
            document_symbols::document_symbols(&session, &params.text_document.uri)
        })
        .flatten();
        Ok(symbols.map(DocumentSymbolResponse::Nested))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let session = self.session.read().await;
        let symbols = catch("workspaceSymbol", || {
            workspace_symbols::workspace_symbols(&session, &params.query)
        })
        .unwrap_or_default();
        Ok(Some(symbols))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let session = self.session.read().await;
        Ok(catch("foldingRange", || {
            folding_ranges::folding_ranges(&session, &params.text_document.uri)
        })
        .flatten())
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let session = self.session.read().await;
        let actions = catch("codeAction", || {
            code_actions::code_actions(&session, &params.text_document.uri, params.range)
        })
        .unwrap_or_default();
        Ok(if actions.is_empty() {
            None
        } else {
            Some(actions)
        })
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let session = self.session.read().await;
        Ok(catch("formatting", || {
            formatting::formatting(&session, &params.text_document.uri)
        })
        .flatten())
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let session = self.session.read().await;
        Ok(catch("rangeFormatting", || {
            formatting::range_formatting(&session, &params.text_document.uri, params.range)
        })
        .flatten())
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let session = self.session.read().await;
        execute_command(&session, &params.command, &params.arguments)
    }
}
