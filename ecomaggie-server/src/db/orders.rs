use serde::Serialize;
use shared::models::{Order, OrderItem, OrderStatus, ShippingAddress};
use sqlx::PgPool;

/// Extra column writes that ride along with a status change
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TransitionEffect {
    #[default]
    None,
    /// Stores `paid_at` and `payment_method`, decrements stock
    Paid { payment_method: Option<String> },
    /// Stores courier and waybill on the order
    Shipped {
        courier: Option<String>,
        waybill_id: Option<String>,
    },
}

/// Order row to insert at checkout
pub struct NewOrder<'a> {
    pub id: i64,
    pub order_number: &'a str,
    pub buyer_id: &'a str,
    pub farmer_id: &'a str,
    pub shipping_address: &'a ShippingAddress,
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub service_fee: i64,
    pub total: i64,
    pub courier: Option<&'a str>,
    pub now: i64,
}

/// Insert the order with its items and remove the purchased cart lines, atomically
pub async fn create(
    pool: &PgPool,
    order: &NewOrder<'_>,
    items: &[OrderItem],
    cart_item_ids: &[i64],
) -> Result<Order, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let row: Order = sqlx::query_as(
        "INSERT INTO orders (id, order_number, buyer_id, farmer_id, shipping_address, status,
            subtotal, shipping_cost, service_fee, total, courier, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, 'unpaid', $6, $7, $8, $9, $10, $11, $11)
         RETURNING *",
    )
    .bind(order.id)
    .bind(order.order_number)
    .bind(order.buyer_id)
    .bind(order.farmer_id)
    .bind(sqlx::types::Json(order.shipping_address))
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.service_fee)
    .bind(order.total)
    .bind(order.courier)
    .bind(order.now)
    .fetch_one(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, product_name, price, quantity)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.id)
        .bind(order.id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
        .bind(order.buyer_id)
        .bind(cart_item_ids)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn set_payment(
    pool: &PgPool,
    id: i64,
    token: &str,
    redirect_url: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET payment_token = $2, payment_redirect_url = $3, updated_at = $4 WHERE id = $1",
    )
    .bind(id)
    .bind(token)
    .bind(redirect_url)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_for_buyer(pool: &PgPool, buyer_id: &str, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND buyer_id = $2")
        .bind(id)
        .bind(buyer_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_for_farmer(pool: &PgPool, farmer_id: &str, id: i64) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND farmer_id = $2")
        .bind(id)
        .bind(farmer_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_number(pool: &PgPool, order_number: &str) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number)
        .fetch_optional(pool)
        .await
}

/// Order booked under `courier_order_id`, else the order carrying `waybill_id`
pub async fn find_by_courier_order(
    pool: &PgPool,
    courier_order_id: &str,
    waybill_id: Option<&str>,
) -> Result<Option<Order>, sqlx::Error> {
    let by_booking: Option<Order> = sqlx::query_as(
        "SELECT o.* FROM orders o JOIN shipments s ON s.order_id = o.id WHERE s.courier_order_id = $1",
    )
    .bind(courier_order_id)
    .fetch_optional(pool)
    .await?;
    if by_booking.is_some() {
        return Ok(by_booking);
    }
    let Some(waybill_id) = waybill_id.filter(|w| !w.is_empty()) else {
        return Ok(None);
    };
    sqlx::query_as("SELECT * FROM orders WHERE waybill_id = $1 ORDER BY created_at DESC LIMIT 1")
        .bind(waybill_id)
        .fetch_optional(pool)
        .await
}

pub async fn items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

pub async fn list_for_buyer(
    pool: &PgPool,
    buyer_id: &str,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders WHERE buyer_id = $1 AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC",
    )
    .bind(buyer_id)
    .bind(status.map(|s| s.as_db()))
    .fetch_all(pool)
    .await
}

pub async fn list_for_farmer(
    pool: &PgPool,
    farmer_id: &str,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM orders WHERE farmer_id = $1 AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC",
    )
    .bind(farmer_id)
    .bind(status.map(|s| s.as_db()))
    .fetch_all(pool)
    .await
}

/// Compare-and-set status change with its side writes.
///
/// Returns `false` (and writes nothing) when the order is no longer in `from`.
/// Paying decrements stock; cancelling a paid order puts the stock back.
pub async fn transition(
    pool: &PgPool,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    effect: &TransitionEffect,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = match effect {
        TransitionEffect::None => {
            sqlx::query("UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2")
                .bind(id)
                .bind(from.as_db())
                .bind(to.as_db())
                .bind(now)
                .execute(&mut *tx)
                .await?
        }
        TransitionEffect::Paid { payment_method } => {
            sqlx::query(
                "UPDATE orders SET status = $3, paid_at = $4, payment_method = $5, updated_at = $4
                 WHERE id = $1 AND status = $2",
            )
            .bind(id)
            .bind(from.as_db())
            .bind(to.as_db())
            .bind(now)
            .bind(payment_method.as_deref())
            .execute(&mut *tx)
            .await?
        }
        TransitionEffect::Shipped { courier, waybill_id } => {
            sqlx::query(
                "UPDATE orders SET status = $3, courier = COALESCE($5, courier),
                    waybill_id = COALESCE($6, waybill_id), updated_at = $4
                 WHERE id = $1 AND status = $2",
            )
            .bind(id)
            .bind(from.as_db())
            .bind(to.as_db())
            .bind(now)
            .bind(courier.as_deref())
            .bind(waybill_id.as_deref())
            .execute(&mut *tx)
            .await?
        }
    };
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    match (from, to) {
        (OrderStatus::Unpaid, OrderStatus::Packed) => take_stock(&mut tx, id, now).await?,
        (OrderStatus::Packed, OrderStatus::Cancelled) => {
            sqlx::query(
                "UPDATE products p SET stock = p.stock + i.stock_taken, updated_at = $2
                 FROM order_items i WHERE i.order_id = $1 AND p.id = i.product_id",
            )
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            sqlx::query("UPDATE order_items SET stock_taken = 0 WHERE order_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        _ => {}
    }

    tx.commit().await?;
    Ok(true)
}

/// Units a paid line can take from `stock`; the rest is oversold
pub fn units_to_take(quantity: i32, stock: i32) -> i32 {
    quantity.min(stock).max(0)
}

/// Decrement stock for a paid order, recording per line what was taken so a
/// refund restores exactly that
async fn take_stock(tx: &mut sqlx::PgConnection, order_id: i64, now: i64) -> Result<(), sqlx::Error> {
    let lines: Vec<(i64, i64, i32, i32)> = sqlx::query_as(
        "SELECT i.id, p.id, i.quantity, p.stock
         FROM order_items i JOIN products p ON p.id = i.product_id
         WHERE i.order_id = $1
         ORDER BY p.id
         FOR UPDATE OF p",
    )
    .bind(order_id)
    .fetch_all(&mut *tx)
    .await?;

    for (item_id, product_id, quantity, stock) in lines {
        let taken = units_to_take(quantity, stock);
        if taken < quantity {
            tracing::warn!(order_id, product_id, quantity, stock, "Paid order oversells product stock");
        }
        sqlx::query("UPDATE products SET stock = stock - $2, updated_at = $3 WHERE id = $1")
            .bind(product_id)
            .bind(taken)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE order_items SET stock_taken = $2 WHERE id = $1")
            .bind(item_id)
            .bind(taken)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

/// Order counts and revenue for the farmer dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderStats {
    pub by_status: Vec<StatusCount>,
    /// Sum of completed order subtotals
    pub revenue_total: i64,
    pub revenue_this_month: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

pub async fn stats_for_farmer(
    pool: &PgPool,
    farmer_id: &str,
    month_start: i64,
) -> Result<OrderStats, sqlx::Error> {
    let by_status: Vec<StatusCount> = sqlx::query_as(
        "SELECT status, COUNT(*) AS count FROM orders WHERE farmer_id = $1 GROUP BY status ORDER BY status",
    )
    .bind(farmer_id)
    .fetch_all(pool)
    .await?;

    let (revenue_total, revenue_this_month): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(subtotal), 0)::BIGINT,
                COALESCE(SUM(subtotal) FILTER (WHERE updated_at >= $2), 0)::BIGINT
         FROM orders WHERE farmer_id = $1 AND status = 'completed'",
    )
    .bind(farmer_id)
    .bind(month_start)
    .fetch_one(pool)
    .await?;

    Ok(OrderStats {
        by_status,
        revenue_total,
        revenue_this_month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_to_take_clamps_at_stock() {
        assert_eq!(units_to_take(3, 10), 3);
        assert_eq!(units_to_take(3, 2), 2);
        assert_eq!(units_to_take(3, 0), 0);
        assert_eq!(units_to_take(3, -1), 0);
    }

    #[test]
    fn test_refunding_oversold_orders_restores_only_what_was_taken() {
        // two paid orders race for the last unit
        let mut stock = 1;
        let first = units_to_take(1, stock);
        stock -= first;
        let second = units_to_take(1, stock);
        stock -= second;
        assert_eq!((first, second, stock), (1, 0, 0));

        stock += first + second;
        assert_eq!(stock, 1);
    }
}
