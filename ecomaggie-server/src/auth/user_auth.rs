//! Identity provider JWT authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::UserRole;

use crate::state::AppState;

/// Audience the identity provider puts on signed-in users' access tokens
const AUDIENCE: &str = "authenticated";

/// Access token claims (subset)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id (UUID)
    pub sub: String,
    pub aud: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

/// Authenticated user extracted from the access token
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: Option<String>,
}

/// Verify an HS256 access token
pub fn verify_token(token: &str, secret: &str) -> Result<UserIdentity, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUDIENCE]);

    let data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    if data.claims.sub.is_empty() {
        return Err(AppError::new(ErrorCode::TokenInvalid));
    }
    Ok(UserIdentity {
        user_id: data.claims.sub,
        email: data.claims.email,
    })
}

/// Middleware that verifies `Authorization: Bearer <jwt>` and stores [`UserIdentity`]
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let identity = verify_token(token, &state.jwt_secret).map_err(IntoResponse::into_response)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Middleware for `/api/farmer/*`: the caller's profile must have the farmer role.
///
/// Must run AFTER user_auth_middleware.
pub async fn require_farmer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let identity = request
        .extensions()
        .get::<UserIdentity>()
        .cloned()
        .ok_or_else(|| AppError::new(ErrorCode::InternalError).into_response())?;

    match crate::db::profiles::role_of(&state.pool, &identity.user_id).await {
        Ok(Some(UserRole::Farmer)) => Ok(next.run(request).await),
        Ok(_) => Err(AppError::new(ErrorCode::FarmerRequired).into_response()),
        Err(e) => {
            tracing::error!(%e, "Failed to load profile role");
            Err(AppError::new(ErrorCode::DatabaseError).into_response())
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    /// Sign a token the way the identity provider does
    pub fn token_for(user_id: &str, secret: &str, expires_in_secs: i64, aud: &str) -> String {
        let claims = UserClaims {
            sub: user_id.to_string(),
            aud: aud.to_string(),
            exp: (chrono::Utc::now().timestamp() + expires_in_secs) as usize,
            email: Some("siti@example.com".into()),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::token_for;
    use super::*;

    const SECRET: &str = "super-secret-jwt-token";

    #[test]
    fn test_valid_token() {
        let token = token_for("6f1c-user", SECRET, 3600, AUDIENCE);
        let identity = verify_token(&token, SECRET).unwrap();
        assert_eq!(identity.user_id, "6f1c-user");
        assert_eq!(identity.email.as_deref(), Some("siti@example.com"));
    }

    #[test]
    fn test_expired_token() {
        let token = token_for("u", SECRET, -3600, AUDIENCE);
        assert_eq!(verify_token(&token, SECRET).unwrap_err().code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_wrong_secret_or_audience() {
        let token = token_for("u", SECRET, 3600, AUDIENCE);
        assert_eq!(verify_token(&token, "other").unwrap_err().code, ErrorCode::TokenInvalid);

        let anon = token_for("u", SECRET, 3600, "anon");
        assert_eq!(verify_token(&anon, SECRET).unwrap_err().code, ErrorCode::TokenInvalid);

        assert_eq!(verify_token("garbage", SECRET).unwrap_err().code, ErrorCode::TokenInvalid);
    }
}
