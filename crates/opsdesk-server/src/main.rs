mod config;

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use opsdesk_api::state::{AppStateInner, JwtSettings};
use opsdesk_db::Database;
use opsdesk_incidents::IncidentDesk;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opsdesk=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.has_placeholder_secret() {
        warn!("JWT_SECRET is unset or still a placeholder; tokens can be forged. Set it in .env.");
    }

    let db = Database::open(&config.database_path)?;
    let desk = IncidentDesk::seeded(chrono::Utc::now());
    info!(
        "Incident desk seeded with {} incidents and {} users",
        desk.incidents().len(),
        desk.users().len()
    );

    let state = AppStateInner::new(
        db,
        desk,
        JwtSettings {
            secret: config.jwt_secret.clone(),
            ttl: config.jwt_ttl,
        },
    );

    let app = opsdesk_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Opsdesk server listening on {}", addr);
    info!("Database: {}", config.database_path.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
