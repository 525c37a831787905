//! Shiritori server - Unified CLI
//!
//! Serves the game over HTTP or plays it in the terminal.

use anyhow::Result;
use clap::Parser;
use shiritori::Referee;
use shiritori_server::ServerConfig;
use shiritori_server::cli::{Cli, Command};
use std::sync::Arc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Play));

    let referee = ServerConfig::load(&cli.config)?.referee()?;

    match cli.command {
        Command::Serve { port, host } => run_http_server(referee, host, port).await,
        Command::Play => run_play(referee).await,
    }
}

/// Installs the tracing subscriber; terminal play logs to stderr quietly.
fn init_tracing(quiet: bool) {
    let default = if quiet {
        "warn"
    } else {
        "info,shiritori=debug,shiritori_server=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the HTTP game server
#[instrument(skip(referee))]
async fn run_http_server(referee: Referee, host: String, port: u16) -> Result<()> {
    let app = shiritori_server::router(Arc::new(referee));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Server ready at http://{}:{}/", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Run a terminal game
async fn run_play(referee: Referee) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    shiritori_server::play(&referee, stdin, tokio::io::stdout()).await?;
    Ok(())
}
