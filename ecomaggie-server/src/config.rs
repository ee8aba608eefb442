//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, read once from the environment at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Public site URL (sitemap links, payment finish redirect)
    pub site_url: String,
    /// Identity provider base URL (email verification / OAuth code exchange)
    pub auth_url: String,
    /// Identity provider public API key
    pub auth_anon_key: String,
    /// HS256 secret the identity provider signs access tokens with
    pub jwt_secret: String,
    /// Payment gateway server key (Snap API auth + notification signature)
    pub midtrans_server_key: String,
    /// Use the gateway's production endpoints
    pub midtrans_is_production: bool,
    /// Shared secret for courier webhook HMAC
    pub shipping_webhook_secret: String,
    /// WhatsApp gateway endpoint
    pub whatsapp_api_url: String,
    /// WhatsApp gateway token (empty disables sending)
    pub whatsapp_api_token: String,
    /// Regional address lookup base URL
    pub region_api_url: String,
    /// Flat platform fee added to every order (Rupiah)
    pub service_fee: i64,
    /// A reverse proxy fronts the server, so `X-Forwarded-For` identifies clients
    pub trust_proxy: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            site_url: std::env::var("SITE_URL")
                .unwrap_or_else(|_| "https://ecomaggie.id".into())
                .trim_end_matches('/')
                .to_string(),
            auth_url: std::env::var("AUTH_URL")
                .unwrap_or_else(|_| "http://localhost:54321".into())
                .trim_end_matches('/')
                .to_string(),
            auth_anon_key: std::env::var("AUTH_ANON_KEY").unwrap_or_default(),
            jwt_secret: Self::require_secret("AUTH_JWT_SECRET", &environment)?,
            midtrans_server_key: Self::require_secret("MIDTRANS_SERVER_KEY", &environment)?,
            midtrans_is_production: std::env::var("MIDTRANS_IS_PRODUCTION")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            shipping_webhook_secret: Self::require_secret("SHIPPING_WEBHOOK_SECRET", &environment)?,
            whatsapp_api_url: std::env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| "https://api.fonnte.com/send".into()),
            whatsapp_api_token: std::env::var("WHATSAPP_API_TOKEN").unwrap_or_default(),
            region_api_url: std::env::var("REGION_API_URL")
                .unwrap_or_else(|_| "https://www.emsifa.com/api-wilayah-indonesia/api".into())
                .trim_end_matches('/')
                .to_string(),
            service_fee: std::env::var("SERVICE_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2_000),
            trust_proxy: std::env::var("TRUST_PROXY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            environment,
        })
    }
}
