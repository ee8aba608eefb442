use shared::models::CartLine;
use sqlx::PgPool;

const LINE_SELECT: &str = "SELECT c.id, c.product_id, p.name AS product_name, p.farmer_id, p.price,
        p.unit, p.stock, p.image_url, p.is_active, c.quantity
     FROM cart_items c JOIN products p ON p.id = c.product_id";

pub async fn list(pool: &PgPool, user_id: &str) -> Result<Vec<CartLine>, sqlx::Error> {
    let sql = format!("{LINE_SELECT} WHERE c.user_id = $1 ORDER BY c.created_at");
    sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn find_line(pool: &PgPool, user_id: &str, id: i64) -> Result<Option<CartLine>, sqlx::Error> {
    let sql = format!("{LINE_SELECT} WHERE c.user_id = $1 AND c.id = $2");
    sqlx::query_as(&sql)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Current quantity of `product_id` in the cart (0 when absent)
pub async fn quantity_of(pool: &PgPool, user_id: &str, product_id: i64) -> Result<i32, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(q,)| q).unwrap_or(0))
}

/// Insert or overwrite the quantity for `product_id`
pub async fn upsert(
    pool: &PgPool,
    id: i64,
    user_id: &str,
    product_id: i64,
    quantity: i32,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cart_items (id, user_id, product_id, quantity, created_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(id)
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_quantity(pool: &PgPool, user_id: &str, id: i64, quantity: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove(pool: &PgPool, user_id: &str, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
