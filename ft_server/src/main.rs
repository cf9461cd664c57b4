//! Football tournament server.
//!
//! Serves the tournament API and live WebSocket views on top of either the
//! in-memory store or PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use football_tournament::{
    db::{Database, PgPlayerRepository, PgTournamentStore},
    stats::{MemoryPlayerRepository, PlayerRepository},
    sync::{MemoryRemoteStore, RemoteStore, SyncCoordinator},
    tournament::{AdminSecretHasher, TournamentManager},
};
use ft_server::{
    api,
    config::{ServerConfig, StorageBackend},
    logging, metrics,
};
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a football tournament server

USAGE:
  ft_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --backend    NAME        memory or postgres          [default: env STORAGE_BACKEND or memory]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  ADMIN_SECRET_PEPPER      Pepper for admin secret hashes (required, 16+ characters)
  STORAGE_BACKEND          memory or postgres
  DATABASE_URL             PostgreSQL connection string
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  SHARE_BASE_URL           Page share links point at
  SYNC_POLL_INTERVAL_MS    Poll interval when push notifications are unavailable
  SYNC_CACHE_PATH          Local cache file (in memory when unset)
  TOURNAMENT_KNOCKOUT_QUALIFIERS, TOURNAMENT_THIRD_PLACE_MATCH, TOURNAMENT_AUTO_ADVANCE
  A .env file in the working directory is loaded on startup
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    backend: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        backend: pargs.opt_value_from_str("--backend")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.backend)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let (remote, players, database) = match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on shutdown");
            let remote: Arc<dyn RemoteStore> = Arc::new(MemoryRemoteStore::new());
            let players: Arc<dyn PlayerRepository> = Arc::new(MemoryPlayerRepository::new());
            (remote, players, None)
        }
        StorageBackend::Postgres => {
            info!("Connecting to PostgreSQL");
            let db = Database::new(&config.database)
                .await
                .context("Failed to connect to database")?;
            db.ensure_schema()
                .await
                .context("Failed to apply database schema")?;
            info!("Database connected successfully");
            let remote: Arc<dyn RemoteStore> =
                Arc::new(PgTournamentStore::new(db.pool().clone()));
            let players: Arc<dyn PlayerRepository> =
                Arc::new(PgPlayerRepository::new(db.pool().clone()));
            (remote, players, Some(db))
        }
    };

    let sync = SyncCoordinator::with_config(remote, config.sync.clone());
    let manager = TournamentManager::new(
        Arc::new(sync),
        players,
        AdminSecretHasher::new(config.security.admin_secret_pepper.clone()),
        config.tournament.clone(),
    );

    let state = api::AppState {
        manager: Arc::new(manager),
        database: database.clone(),
        share_base_url: config.share_base_url.clone(),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
