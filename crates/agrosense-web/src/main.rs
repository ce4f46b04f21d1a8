//! AgroSense API server entry point.
//!
//! Run with: cargo run -p agrosense-web

use tracing::info;
use tracing_subscriber::EnvFilter;

use agrosense_web::config::Config;
use agrosense_web::router::build_router;
use agrosense_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agrosense_web=debug,info")),
        )
        .init();

    info!("🌱 AgroSense starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;

    let state = AppState::new(&config);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("🌐 API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
