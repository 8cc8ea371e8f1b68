//! Cookie-session authentication server.
//!
//! Serves the register/login/logout/me API over a SQLite-backed user and
//! session store, plus the static UI.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error};
use brick_auth::{
    AuthManager, CredentialHasher, Database,
    db::{SqliteSessionRepository, SqliteUserRepository},
};
use brick_server::{api, config::ServerConfig, logging, metrics, session_gc};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the cookie-session authentication server

USAGE:
  brick_server [OPTIONS]

OPTIONS:
  --bind         IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url       URL       Database connection string  [default: env DATABASE_URL or sqlite://brick.db]
  --static-dir   PATH      Static UI directory         [default: env STATIC_DIR or ./web/ui/public]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:3000)
  DATABASE_URL             SQLite connection string
  PASSWORD_PEPPER          Password hashing pepper (optional)
  SESSION_TTL_HOURS        Session lifetime in hours [default: 24]
  SESSION_COOKIE_SECURE    Set the Secure cookie attribute [default: false]
  CORS_ALLOWED_ORIGINS     Comma-separated origin allow-list
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  (See .env.example for all configuration options)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    static_dir: Option<PathBuf>,
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
        static_dir: pargs.opt_value_from_str("--static-dir")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.static_dir)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{}/metrics", metrics_bind);
    }

    info!("Connecting to database: {}", config.database.database_url);
    let db = Database::new(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.database_url))?;
    db.migrate().await.context("Failed to create schema")?;
    info!("Database ready");

    let query_timeout = Duration::from_secs(config.database.query_timeout_secs);
    let users = Arc::new(
        SqliteUserRepository::new(db.pool().clone()).with_query_timeout(query_timeout),
    );
    let sessions = Arc::new(
        SqliteSessionRepository::new(db.pool().clone(), config.session.ttl())
            .with_query_timeout(query_timeout),
    );

    if config.security.password_pepper.is_empty() {
        info!("PASSWORD_PEPPER not set; hashing without a pepper");
    }
    let hasher = CredentialHasher::new(config.security.password_pepper.clone());
    let auth_manager = Arc::new(AuthManager::new(users, sessions.clone(), hasher));

    let gc = session_gc::spawn_session_gc(
        sessions,
        Duration::from_secs(config.session.gc_interval_secs),
    );

    let state = api::AppState {
        auth_manager,
        database: db.clone(),
        session: Arc::new(config.session.clone()),
        http: Arc::new(config.http.clone()),
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
    gc.abort();
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
