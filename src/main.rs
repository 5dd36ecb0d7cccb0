use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use workdesk_api::auth::JwtIdentityProvider;
use workdesk_api::config::config;
use workdesk_api::database::{MemoryStore, PgStore, Store};
use workdesk_api::{app, is_production, AppState};

#[derive(Parser, Debug)]
#[command(name = "workdesk-api", version, about = "Task, contact and sales backend")]
struct Cli {
    /// Port to listen on (overrides API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep all data in memory instead of connecting to Postgres
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config();

    let default_filter = if config.api.enable_request_logging {
        "info,tower_http=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    tracing::info!("Starting workdesk API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set");
    }
    let identity = JwtIdentityProvider::new(&config.security.jwt_secret).context("invalid JWT configuration")?;

    let store: Arc<dyn Store> = if cli.in_memory {
        if is_production!() {
            tracing::warn!("Running production configuration against the in-memory store");
        }
        tracing::info!("Using in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let pg = PgStore::connect(&config.database)
            .await
            .context("failed to connect to the database")?;
        pg.migrate().await.context("failed to apply schema")?;
        Arc::new(pg)
    };

    let state = AppState::new(store.clone(), Arc::new(identity), config.clone());

    let port = cli.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
