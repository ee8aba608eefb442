use shared::models::{ProfileUpdate, UserProfile, UserRole};
use sqlx::PgPool;

pub async fn find(pool: &PgPool, user_id: &str) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Create or replace the caller's profile
pub async fn upsert(
    pool: &PgPool,
    user_id: &str,
    update: &ProfileUpdate,
    phone: Option<&str>,
    now: i64,
) -> Result<UserProfile, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO profiles (user_id, full_name, phone, role, business_name, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         ON CONFLICT (user_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            phone = EXCLUDED.phone,
            role = EXCLUDED.role,
            business_name = EXCLUDED.business_name,
            updated_at = EXCLUDED.updated_at
         RETURNING *",
    )
    .bind(user_id)
    .bind(update.full_name.trim())
    .bind(phone)
    .bind(update.role.as_db())
    .bind(update.business_name.as_deref())
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn role_of(pool: &PgPool, user_id: &str) -> Result<Option<UserRole>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT role FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.and_then(|(r,)| UserRole::from_db(&r)))
}

pub async fn phone_of(pool: &PgPool, user_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT phone FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(p,)| p))
}

pub async fn display_name(pool: &PgPool, user_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String, Option<String>)> =
        sqlx::query_as("SELECT full_name, business_name FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(name, business)| business.filter(|b| !b.is_empty()).unwrap_or(name)))
}
