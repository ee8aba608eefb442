//! Processed webhook deliveries (idempotency keys)

use sqlx::PgPool;

/// Record a delivery. `false` when it was already processed.
///
/// INSERT first and check rows_affected, so two concurrent deliveries cannot both pass.
pub async fn record(pool: &PgPool, event_key: &str, source: &str, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_key, source, processed_at)
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(event_key)
    .bind(source)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn forget(pool: &PgPool, event_key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM processed_webhook_events WHERE event_key = $1")
        .bind(event_key)
        .execute(pool)
        .await?;
    Ok(())
}
