//! Identity provider redirect target
//!
//! GET /auth/callback?code=..&next=..: exchanges the PKCE code for a session
//! and sets the `eco_session` cookie

use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::state::AppState;

pub const SESSION_COOKIE: &str = "eco_session";
/// Set by the browser client when it starts the PKCE flow
const CODE_VERIFIER_COOKIE: &str = "eco_code_verifier";
const ERROR_PATH: &str = "/auth/error";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

pub async fn auth_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("Auth callback without code");
        return Redirect::to(ERROR_PATH).into_response();
    };
    let verifier = cookie_value(&headers, CODE_VERIFIER_COOKIE).unwrap_or_default();

    let token = match exchange_code(&state, &code, verifier).await {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(%e, "Auth code exchange failed");
            return Redirect::to(ERROR_PATH).into_response();
        }
    };

    let cookie = session_cookie(&token.access_token, token.expires_in, state.secure_cookies);
    let target = safe_next(query.next.as_deref());
    ([(header::SET_COOKIE, cookie)], Redirect::to(target)).into_response()
}

async fn exchange_code(state: &AppState, code: &str, verifier: &str) -> Result<TokenResponse, reqwest::Error> {
    state
        .http
        .post(format!("{}/auth/v1/token", state.auth_url))
        .query(&[("grant_type", "pkce")])
        .header("apikey", &state.auth_anon_key)
        .json(&serde_json::json!({ "auth_code": code, "code_verifier": verifier }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// Redirect target: same-site relative paths only, anything else goes home
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::create_router;
    use crate::state::testing::lazy_state;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/orders/12")), "/orders/12");
        assert_eq!(safe_next(Some("/dashboard?tab=orders")), "/dashboard?tab=orders");
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("orders")), "/");
    }

    #[test]
    fn test_session_cookie_flags() {
        let c = session_cookie("tok", 3600, true);
        assert_eq!(c, "eco_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure");
        assert!(!session_cookie("tok", 60, false).contains("Secure"));
    }

    #[test]
    fn test_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; eco_code_verifier=abc123; other=1"),
        );
        assert_eq!(cookie_value(&headers, CODE_VERIFIER_COOKIE), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn test_missing_code_redirects_to_error() {
        let resp = create_router(lazy_state())
            .oneshot(Request::get("/auth/callback?next=/orders").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/auth/error");
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }
}
