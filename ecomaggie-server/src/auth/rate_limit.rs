//! Per-client fixed-window limits for checkout and the auth callback
//!
//! Clients are keyed by the TCP peer address. `X-Forwarded-For` is only
//! consulted when `TRUST_PROXY` says a reverse proxy fronts the server.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use shared::error::{AppError, ErrorCode};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::state::AppState;

/// Request allowance for one route
#[derive(Debug, Clone, Copy)]
pub struct RateRule {
    pub name: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

pub const CHECKOUT: RateRule = RateRule {
    name: "checkout",
    max_requests: 10,
    window: Duration::from_secs(60),
};

pub const AUTH_CALLBACK: RateRule = RateRule {
    name: "auth_callback",
    max_requests: 20,
    window: Duration::from_secs(60),
};

/// Windows untouched for this long are dropped by `cleanup`
const IDLE_AFTER: Duration = Duration::from_secs(300);

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<(&'static str, IpAddr), Window>>,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(trust_proxy: bool) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            trust_proxy,
        }
    }

    /// Count one request from `client`; `false` once the window is used up
    pub fn allow(&self, rule: &RateRule, client: IpAddr) -> bool {
        let now = Instant::now();
        let mut window = self.windows.entry((rule.name, client)).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.duration_since(window.started) >= rule.window {
            window.count = 0;
            window.started = now;
        }
        window.count = window.count.saturating_add(1);
        window.count <= rule.max_requests
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < IDLE_AFTER);
    }

    fn client_ip(&self, request: &Request) -> IpAddr {
        if self.trust_proxy
            && let Some(ip) = forwarded_for(request)
        {
            return ip;
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Last `X-Forwarded-For` hop, the one our own proxy appended
fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .rsplit(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

async fn enforce(state: &AppState, rule: &RateRule, request: Request, next: Next) -> Result<Response, Response> {
    let client = state.rate_limiter.client_ip(&request);
    if !state.rate_limiter.allow(rule, client) {
        tracing::warn!(route = rule.name, %client, "Rate limit exceeded");
        return Err(AppError::new(ErrorCode::TooManyRequests).into_response());
    }
    Ok(next.run(request).await)
}

pub async fn checkout_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, &CHECKOUT, request, next).await
}

pub async fn auth_callback_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, &AUTH_CALLBACK, request, next).await
}
