use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use todo_api_rust::app::{self, AppState};
use todo_api_rust::config::{self, StoreBackend};
use todo_api_rust::database::{DatabaseManager, PgTodoStore, PgUserStore};

#[derive(Parser)]
#[command(name = "todo-api-rust")]
#[command(about = "Todo REST API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Address to bind (overrides HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides TODO_API_PORT / PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Persistence backend: postgres or memory (overrides TODO_API_STORE)")]
    store: Option<StoreBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("todo_api_rust=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(store) = args.store {
        config.database.backend = store;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    tracing::info!(
        "Starting Todo API in {:?} mode with {:?} store",
        config.environment,
        config.database.backend
    );

    let (state, pool) = match config.database.backend {
        StoreBackend::Memory => (AppState::in_memory(&config), None),
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::ensure_schema(&pool).await?;
            let state = AppState::new(
                Arc::new(PgTodoStore::new(pool.clone())),
                Arc::new(PgUserStore::new(pool.clone())),
                &config,
            );
            (state, Some(pool))
        }
    };

    let router = app::router(state, &config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Todo API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pool) = pool {
        DatabaseManager::close(&pool).await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
