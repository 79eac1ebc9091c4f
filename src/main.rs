use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use portfolio_rag::api;
use portfolio_rag::config::Config;
use portfolio_rag::state::AppState;

#[derive(Parser)]
#[command(version, about = "Retrieval-augmented chatbot backend for a portfolio site")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Index the content directory, then serve HTTP (default)
    Serve,
    /// Run one indexing pass and exit
    Index {
        /// Re-embed files even if unchanged
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the real environment may carry everything.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    config.apply_env();
    config.validate().context("invalid configuration")?;

    let state = AppState::from_config(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Index { force } => {
            let report = state
                .reindex(force)
                .await
                .context("GEMINI_API_KEY is required for indexing")??;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Serve => serve(state).await,
    }
}

async fn serve(state: AppState) -> Result<()> {
    // Startup indexing: failures are logged, the server still comes up.
    match state.reindex(false).await {
        Some(Ok(_)) => {}
        Some(Err(e)) => error!("Startup indexing failed: {e:#}"),
        None => warn!("Skipping startup indexing: Gemini is not configured"),
    }

    let bind_addr = state.config.bind_addr.clone();
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Server listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
