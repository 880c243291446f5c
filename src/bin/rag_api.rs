use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jyotir_rag::config::ServiceArgs;
use jyotir_rag::logging::{init_tracing, LogArgs};
use jyotir_rag::pipeline::{Pipeline, DEFAULT_TOP_K};
use jyotir_rag::prompt::{PromptComposer, DEFAULT_PERSONA};
use jyotir_rag::server::{router, AppState};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "jyotir-api",
    about = "HTTP API answering questions from embedded lecture units with checked citations"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "JYOTIR_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    /// Units retrieved per question.
    #[arg(long, env = "JYOTIR_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Persona line opening every generation prompt.
    #[arg(long, env = "JYOTIR_PERSONA", default_value = DEFAULT_PERSONA)]
    persona: String,

    #[command(flatten)]
    services: ServiceArgs,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> Result<()> {
    let cli = ApiCli::parse();
    init_tracing(&cli.log);

    // Blocking HTTP clients are built outside the async runtime.
    let pipeline = Pipeline::new(
        cli.services.embedder()?,
        Arc::new(cli.services.store()?),
        cli.services.generator()?,
    )
    .with_composer(PromptComposer::new(cli.persona))
    .with_top_k(cli.top_k);
    let app = router(AppState::new(pipeline));
    let collection = cli.services.qdrant.collection.clone();

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!(%addr, %collection, "jyotir-api listening");
        axum::serve(listener, app)
            .await
            .context("server shutdown")
    })
}
