//! Learnboard - admin dashboard backend for an ed-tech learning platform

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnboard::{
    api::{self, AppState},
    config::Config,
    db,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Learnboard...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");
    if config.auth.uses_default_secret() {
        tracing::warn!("auth.jwt_secret is the built-in default; set LEARNBOARD_AUTH_JWT_SECRET");
    }

    // Initialize database
    let pool = db::global_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    let state = AppState::new(pool, &config)?;

    // Prune login rate limiter entries every 5 minutes
    {
        let auth = state.auth.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                auth.limiter().cleanup().await;
            }
        });
    }

    // Drop expired verification and reset tokens hourly
    {
        let auth = state.auth.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match auth.cleanup_expired_tokens().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!("Removed {} expired auth tokens", removed),
                    Err(e) => tracing::warn!("Auth token cleanup failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
