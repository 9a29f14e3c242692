use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{http::HeaderValue, middleware};
use clap::Parser;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing::{error, info};

use stock_ledger as app;

/// Stock ledger HTTP server
#[derive(Debug, Parser)]
#[command(name = "stock-ledger", version, about)]
struct Cli {
    /// Configuration profile to load from config/<profile>.toml (overrides RUN_ENV)
    #[arg(long)]
    profile: Option<String>,

    /// Apply pending database migrations and exit
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = app::config::load_config_for_profile(cli.profile.as_deref())
        .context("failed to load configuration")?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = app::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    if cli.migrate_only || cfg.auto_migrate {
        app::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    if cli.migrate_only {
        info!("Migrations applied; exiting");
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    let cors_layer = build_cors(&cfg)?;
    let access_log = Arc::new(app::logging::LoggingState::new(
        app::logging::setup_logger(app::logging::LoggerConfig::default()),
    ));

    let state = app::AppState::new(Arc::new(db_pool), cfg);

    let router = app::app_router(state)
        .merge(app::openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(app::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .layer(middleware::from_fn_with_state(
            access_log,
            app::logging::logging_middleware,
        ));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("stock-ledger listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

fn build_cors(cfg: &app::config::AppConfig) -> anyhow::Result<CorsLayer> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    if cfg.is_development() {
        info!("Using permissive CORS because explicit origins were not configured (development environment)");
        return Ok(CorsLayer::permissive());
    }
    anyhow::bail!("Missing CORS configuration: set APP__CORS_ALLOWED_ORIGINS")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
