//! Application state for the EcoMaggie API server

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::error::BoxError;
use crate::notify::{Notifier, WhatsAppNotifier};
use crate::payment::MidtransClient;
use crate::region::RegionClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Reused HTTP client for third-party APIs
    pub http: reqwest::Client,
    /// Payment gateway (Snap transactions + notification signature key)
    pub midtrans: MidtransClient,
    /// WhatsApp notifications
    pub notifier: Arc<dyn Notifier>,
    /// Regional address lookup with in-process cache
    pub regions: RegionClient,
    /// Rate limiter for checkout and auth callback
    pub rate_limiter: RateLimiter,
    /// HS256 secret for identity provider access tokens
    pub jwt_secret: String,
    /// Courier webhook HMAC secret
    pub shipping_webhook_secret: String,
    /// Public site URL, no trailing slash
    pub site_url: String,
    /// Identity provider base URL, no trailing slash
    pub auth_url: String,
    pub auth_anon_key: String,
    /// Flat platform fee per order (Rupiah)
    pub service_fee: i64,
    /// Mark session cookies `Secure`
    pub secure_cookies: bool,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self::with_pool(pool, http, config))
    }

    /// Assemble state around an existing pool (tests use a lazy pool)
    pub fn with_pool(pool: PgPool, http: reqwest::Client, config: &Config) -> Self {
        let notifier = WhatsAppNotifier::new(
            http.clone(),
            config.whatsapp_api_url.clone(),
            config.whatsapp_api_token.clone(),
        );
        Self {
            pool,
            midtrans: MidtransClient::new(
                http.clone(),
                config.midtrans_server_key.clone(),
                config.midtrans_is_production,
            ),
            notifier: Arc::new(notifier),
            regions: RegionClient::new(http.clone(), config.region_api_url.clone()),
            rate_limiter: RateLimiter::new(config.trust_proxy),
            jwt_secret: config.jwt_secret.clone(),
            shipping_webhook_secret: config.shipping_webhook_secret.clone(),
            site_url: config.site_url.clone(),
            auth_url: config.auth_url.clone(),
            auth_anon_key: config.auth_anon_key.clone(),
            service_fee: config.service_fee,
            secure_cookies: config.environment != "development",
            http,
        }
    }
}
