use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use teklif_api::config::{AppConfig, StoreBackend};
use teklif_api::database::DatabaseManager;
use teklif_api::{app, AppContext};

#[derive(Parser)]
#[command(name = "teklif-api")]
#[command(about = "Supplier and construction catalog API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides API_PORT")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and the token secrets are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    tracing::info!("Starting teklif-api in {:?} mode", config.environment);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.api.port = port;
            }
            serve(config).await
        }
        Command::Migrate => migrate(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let port = config.api.port;
    let ctx = AppContext::from_config(config)
        .await
        .context("failed to initialise application context")?;
    let database = ctx.database.clone();

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    if config.store.backend != StoreBackend::Postgres {
        anyhow::bail!("migrations only apply to the postgres backend");
    }
    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    database.migrate().await.context("migration failed")?;
    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
