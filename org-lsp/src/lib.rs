//! org-lsp: language server for org-mode workspaces
//!
//! The server keeps one [`session::Session`] (workspace root, scanner
//! indexes, open documents) behind a single read-write lock. Queries
//! (definition, references, hover, completion, symbols, folding, code
//! actions, formatting) take it shared; document sync and the save-time
//! rescan take it exclusively. Feature logic lives in [`features`]; the
//! [`server`] module is the thin tower-lsp surface that converts wire
//! types and holds the lock.
//!
//! Binary usage:
//!
//!     $ org-lsp
//!
//! starts the server on stdin/stdout for editor integration. The log level
//! comes from the ORG_LSP_LOG environment variable (DEBUG, INFO, WARN,
//! ERROR); logs go to stderr, stdout carries the protocol.

pub mod convert;
pub mod features;
pub mod server;
pub mod session;

pub use server::OrgLanguageServer;
pub use session::Session;

/// Environment variable holding the log level.
pub const LOG_ENV_VAR: &str = "ORG_LSP_LOG";

/// Resolve the configured log level to a tracing filter directive.
pub fn log_filter_from_env() -> &'static str {
    match std::env::var(LOG_ENV_VAR).ok().as_deref() {
        Some("DEBUG") => "debug",
        Some("INFO") => "info",
        Some("WARN") => "warn",
        Some("ERROR") => "error",
        _ => "info",
    }
}
