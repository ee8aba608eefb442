use shared::models::{Supply, SupplyCreate, SupplyStatus};
use sqlx::PgPool;

pub async fn create(
    pool: &PgPool,
    id: i64,
    producer_id: &str,
    input: &SupplyCreate,
    now: i64,
) -> Result<Supply, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO supplies (id, producer_id, waste_type, weight_kg, pickup_address_id,
            pickup_date, notes, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $8)
         RETURNING *",
    )
    .bind(id)
    .bind(producer_id)
    .bind(input.waste_type.trim())
    .bind(input.weight_kg)
    .bind(input.pickup_address_id)
    .bind(input.pickup_date)
    .bind(input.notes.as_deref())
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Supply>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM supplies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_producer(pool: &PgPool, producer_id: &str) -> Result<Vec<Supply>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM supplies WHERE producer_id = $1 ORDER BY created_at DESC")
        .bind(producer_id)
        .fetch_all(pool)
        .await
}

/// Open requests any farmer may take, plus the ones this farmer has taken
pub async fn list_for_farmer(pool: &PgPool, farmer_id: &str) -> Result<Vec<Supply>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM supplies
         WHERE status = 'pending' OR (farmer_id = $1 AND status IN ('accepted', 'completed'))
         ORDER BY pickup_date, created_at",
    )
    .bind(farmer_id)
    .fetch_all(pool)
    .await
}

/// Compare-and-set status change; `farmer_id` is stored when given.
/// `None` when the request was no longer in `from`.
pub async fn transition(
    pool: &PgPool,
    id: i64,
    from: SupplyStatus,
    to: SupplyStatus,
    farmer_id: Option<&str>,
    now: i64,
) -> Result<Option<Supply>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE supplies SET status = $3, farmer_id = COALESCE($4, farmer_id), updated_at = $5
         WHERE id = $1 AND status = $2
         RETURNING *",
    )
    .bind(id)
    .bind(from.as_db())
    .bind(to.as_db())
    .bind(farmer_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn pending_count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM supplies WHERE status = 'pending'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
