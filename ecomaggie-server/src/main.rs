//! ecomaggie-server: BSF maggot marketplace backend
//!
//! Long-running service that:
//! - Serves the buyer / farmer / producer REST API (JWT authenticated)
//! - Creates payment gateway transactions at checkout
//! - Reconciles orders from payment and courier webhooks
//! - Sends WhatsApp notifications on order and supply changes

mod api;
mod auth;
mod config;
mod db;
mod error;
mod notify;
mod payment;
mod region;
mod services;
mod shipping;
mod state;

use std::net::SocketAddr;

use config::Config;
use error::BoxError;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecomaggie_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting ecomaggie-server (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    // Periodic rate limiter and region cache cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    let regions = state.regions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup();
            regions.cleanup();
        }
    });

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("ecomaggie-server HTTP listening on {http_addr}");

    // ConnectInfo feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
