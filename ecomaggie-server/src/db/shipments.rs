use serde::Serialize;
use sqlx::PgPool;

/// Courier tracking row, one per shipped order
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Shipment {
    pub order_id: i64,
    pub courier_order_id: String,
    pub courier_company: Option<String>,
    pub waybill_id: Option<String>,
    pub status: Option<String>,
    pub price: Option<i64>,
    pub updated_at: i64,
}

/// Courier tracking fields (absent fields keep their stored value)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingUpdate {
    pub courier_order_id: String,
    pub courier_company: Option<String>,
    pub waybill_id: Option<String>,
    pub status: Option<String>,
    pub price: Option<i64>,
}

pub async fn find(pool: &PgPool, order_id: i64) -> Result<Option<Shipment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shipments WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await
}

/// Upsert tracking for an order and mirror the waybill onto the order row
pub async fn upsert_tracking(
    pool: &PgPool,
    order_id: i64,
    update: &TrackingUpdate,
    now: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO shipments (order_id, courier_order_id, courier_company, waybill_id, status, price, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (order_id) DO UPDATE SET
            courier_company = COALESCE(EXCLUDED.courier_company, shipments.courier_company),
            waybill_id = COALESCE(EXCLUDED.waybill_id, shipments.waybill_id),
            status = COALESCE(EXCLUDED.status, shipments.status),
            price = COALESCE(EXCLUDED.price, shipments.price),
            updated_at = EXCLUDED.updated_at",
    )
    .bind(order_id)
    .bind(&update.courier_order_id)
    .bind(update.courier_company.as_deref())
    .bind(update.waybill_id.as_deref())
    .bind(update.status.as_deref())
    .bind(update.price)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if update.waybill_id.is_some() || update.courier_company.is_some() {
        sqlx::query(
            "UPDATE orders SET waybill_id = COALESCE($2, waybill_id),
                courier = COALESCE(courier, $3), updated_at = $4
             WHERE id = $1",
        )
        .bind(order_id)
        .bind(update.waybill_id.as_deref())
        .bind(update.courier_company.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
