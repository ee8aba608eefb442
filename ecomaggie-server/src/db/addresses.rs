use shared::models::{Address, AddressInput};
use sqlx::PgPool;

pub async fn list(pool: &PgPool, user_id: &str) -> Result<Vec<Address>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, user_id: &str, id: i64) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Look up an address by id only (farmers viewing a pickup location)
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Insert an address; the user's first address becomes the default
pub async fn create(
    pool: &PgPool,
    id: i64,
    user_id: &str,
    input: &AddressInput,
    now: i64,
) -> Result<Address, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO addresses (id, user_id, label, recipient_name, phone, street,
            province_id, province, regency_id, regency, district_id, district,
            village, postal_code, is_default, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            NOT EXISTS (SELECT 1 FROM addresses WHERE user_id = $2), $15)
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(input.label.trim())
    .bind(input.recipient_name.trim())
    .bind(input.phone.trim())
    .bind(input.street.trim())
    .bind(&input.province_id)
    .bind(&input.province)
    .bind(&input.regency_id)
    .bind(&input.regency)
    .bind(&input.district_id)
    .bind(&input.district)
    .bind(input.village.as_deref())
    .bind(input.postal_code.trim())
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    user_id: &str,
    id: i64,
    input: &AddressInput,
) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE addresses SET label = $3, recipient_name = $4, phone = $5, street = $6,
            province_id = $7, province = $8, regency_id = $9, regency = $10,
            district_id = $11, district = $12, village = $13, postal_code = $14
         WHERE id = $1 AND user_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(input.label.trim())
    .bind(input.recipient_name.trim())
    .bind(input.phone.trim())
    .bind(input.street.trim())
    .bind(&input.province_id)
    .bind(&input.province)
    .bind(&input.regency_id)
    .bind(&input.regency)
    .bind(&input.district_id)
    .bind(&input.district)
    .bind(input.village.as_deref())
    .bind(input.postal_code.trim())
    .fetch_optional(pool)
    .await
}

/// Make `id` the only default address. `false` when the address is not the user's.
pub async fn set_default(pool: &PgPool, user_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let owned: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM addresses WHERE id = $1 AND user_id = $2 FOR UPDATE")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if owned.is_none() {
        return Ok(false);
    }

    sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE addresses SET is_default = TRUE WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}
