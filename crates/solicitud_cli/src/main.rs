mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solicitud_intake::{build_router, AppState};
use solicitud_mailer::SmtpMailer;
use solicitud_storage::SqliteSubmissionStore;
use tracing::{info, warn};

use crate::config::RuntimeConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Document intake service for certificate requests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Serve {
        /// Reads variables from this file instead of `./.env`.
        #[arg(long)]
        env_file: Option<PathBuf>,
        /// Overrides `PORT`.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve { env_file, port } => {
            load_env(env_file.as_deref())?;
            init_tracing();
            serve(port).await
        }
    }
}

fn load_env(env_file: Option<&std::path::Path>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenv::from_path(path)
                .with_context(|| format!("failed to read env file {}", path.display()))?;
        }
        None => {
            dotenv::dotenv().ok();
        }
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn,lettre=warn".into()),
        )
        .init();
}

async fn serve(port_override: Option<u16>) -> Result<()> {
    let mut config = RuntimeConfig::from_env()?;
    if let Some(port) = port_override {
        config.port = port;
    }

    let store = SqliteSubmissionStore::connect(&config.storage)
        .await
        .context("failed to open the submissions database")?;

    let mailer = SmtpMailer::new(&config.smtp).context("invalid SMTP configuration")?;
    match mailer.test_connection().await {
        Ok(true) => info!(host = %config.smtp.host, "SMTP relay reachable"),
        Ok(false) => warn!(host = %config.smtp.host, "SMTP relay did not accept the probe"),
        Err(err) => warn!(host = %config.smtp.host, error = %err, "SMTP relay unreachable at start-up"),
    }

    let socket = config.socket_addr();
    let state = AppState::new(Arc::new(store), Arc::new(mailer), config.intake);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(socket)
        .await
        .with_context(|| format!("failed to bind {socket}"))?;

    info!(bind = %socket, "solicitudd listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
