use org_lsp::{log_filter_from_env, OrgLanguageServer};
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout belongs to the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter_from_env()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let stdin = stdin();
    let stdout = stdout();
    let (service, socket) = LspService::new(OrgLanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
