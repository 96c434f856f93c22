//! # Chorus API Server
//!
//! This is the API server for Chorus, a music-sharing backend providing
//! account management, audio upload, likes, and playlists over a JSON REST
//! API.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/chorus \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p chorus-api
//! ```

use chorus_api::app::{build_router, AppState};
use chorus_api::config::Config;
use chorus_shared::db::{migrations, pool};
use chorus_shared::storage::MediaStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chorus_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Chorus API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database pool and run migrations
    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    // Initialize media storage
    let media = MediaStore::new(&config.media.root);
    media.init().await?;

    // Build Axum application
    let bind_address = config.bind_address();
    let state = AppState::new(db, config, media);
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, exiting...");

    Ok(())
}

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
