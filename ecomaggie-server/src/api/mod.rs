//! API routes for the EcoMaggie server

pub mod address;
pub mod auth_callback;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod health;
pub mod order;
pub mod payment_webhook;
pub mod product;
pub mod profile;
pub mod region;
pub mod shipping_webhook;
pub mod sitemap;
pub mod supply;

use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{auth_callback_rate_limit, checkout_rate_limit};
use crate::auth::user_auth::{require_farmer, user_auth_middleware};
use crate::error::ServiceError;
use crate::state::AppState;

/// Handler result: JSON body or a mapped error response
pub type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public catalog, region lookup, sitemap
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/sitemap.xml", get(sitemap::sitemap))
        .route("/api/products", get(product::list_products))
        .route("/api/products/{id}", get(product::get_product))
        .route("/api/regions/provinces", get(region::provinces))
        .route("/api/regions/regencies/{id}", get(region::regencies))
        .route("/api/regions/districts/{id}", get(region::districts))
        .route("/api/regions/villages/{id}", get(region::villages));

    // Identity provider redirect
    let auth = Router::new()
        .route("/auth/callback", get(auth_callback::auth_callback))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_callback_rate_limit,
        ));

    // Vendor webhooks (signature-verified, raw body)
    let webhooks = Router::new()
        .route("/webhooks/payment", post(payment_webhook::handle_webhook))
        .route(
            "/webhooks/shipping",
            get(shipping_webhook::probe).post(shipping_webhook::handle_webhook),
        );

    let checkout = Router::new()
        .route("/api/checkout", post(checkout::checkout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            checkout_rate_limit,
        ));

    // Any signed-in user
    let user = Router::new()
        .route(
            "/api/profile",
            get(profile::get_profile).put(profile::upsert_profile),
        )
        .route(
            "/api/addresses",
            get(address::list_addresses).post(address::create_address),
        )
        .route("/api/addresses/{id}", put(address::update_address))
        .route("/api/addresses/{id}/default", post(address::set_default_address))
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_item))
        .route(
            "/api/cart/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .merge(checkout)
        .route("/api/orders", get(order::list_orders))
        .route("/api/orders/{id}", get(order::get_order))
        .route("/api/orders/{id}/cancel", post(order::cancel_order))
        .route("/api/orders/{id}/complete", post(order::complete_order))
        .route(
            "/api/supplies",
            get(supply::list_supplies).post(supply::create_supply),
        )
        .route("/api/supplies/{id}/cancel", post(supply::cancel_supply))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    // Farmer role (profile lookup after token verification)
    let farmer = Router::new()
        .route("/api/farmer/dashboard", get(dashboard::farmer_dashboard))
        .route(
            "/api/farmer/products",
            get(product::list_own_products).post(product::create_product),
        )
        .route("/api/farmer/products/{id}", put(product::update_product))
        .route(
            "/api/farmer/products/{id}/deactivate",
            post(product::deactivate_product),
        )
        .route("/api/farmer/orders", get(order::list_farmer_orders))
        .route("/api/farmer/orders/{id}", get(order::get_farmer_order))
        .route("/api/farmer/orders/{id}/ship", post(order::ship_order))
        .route("/api/farmer/orders/{id}/cancel", post(order::cancel_farmer_order))
        .route("/api/farmer/supplies", get(supply::list_farmer_supplies))
        .route("/api/farmer/supplies/{id}", get(supply::get_farmer_supply))
        .route("/api/farmer/supplies/{id}/accept", post(supply::accept_supply))
        .route("/api/farmer/supplies/{id}/reject", post(supply::reject_supply))
        .route("/api/farmer/supplies/{id}/complete", post(supply::complete_supply))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_farmer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(auth)
        .merge(webhooks)
        .merge(user)
        .merge(farmer)
        .layer(cors_layer(&state.site_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser access from the storefront origin only
fn cors_layer(site_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    match site_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(site_url, "Invalid site URL, CORS disabled");
            layer
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::auth::user_auth::testing::token_for;
    use crate::state::testing::{JWT_SECRET, lazy_state};

    async fn status_of(req: Request<Body>) -> StatusCode {
        create_router(lazy_state()).oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_user_routes_require_token() {
        for path in ["/api/cart", "/api/orders", "/api/profile", "/api/farmer/dashboard"] {
            let req = Request::get(path).body(Body::empty()).unwrap();
            assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let token = token_for("user-1", JWT_SECRET, -120, "authenticated");
        let req = Request::get("/api/cart")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_callback_limit_ignores_forwarded_for() {
        let app = create_router(lazy_state());
        let mut statuses = Vec::new();
        for i in 0..21 {
            let req = Request::get("/auth/callback")
                .header("x-forwarded-for", format!("1.2.3.{i}"))
                .body(Body::empty())
                .unwrap();
            statuses.push(app.clone().oneshot(req).await.unwrap().status());
        }
        assert!(statuses[..20].iter().all(|s| *s == StatusCode::SEE_OTHER));
        assert_eq!(statuses[20], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_checkout_requires_token_before_rate_limit() {
        let req = Request::post("/api/checkout")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"address_id":1}"#))
            .unwrap();
        assert_eq!(status_of(req).await, StatusCode::UNAUTHORIZED);
    }
}
