//! Farmer dashboard aggregates

use serde::Serialize;
use sqlx::PgPool;

use super::orders::{self, StatusCount};
use super::supplies;

#[derive(Debug, Clone, Serialize)]
pub struct FarmerDashboard {
    pub product_count: i64,
    pub active_product_count: i64,
    pub orders_by_status: Vec<StatusCount>,
    pub revenue_total: i64,
    pub revenue_this_month: i64,
    /// Open pickup requests any farmer may accept
    pub pending_supply_count: i64,
}

pub async fn farmer(pool: &PgPool, farmer_id: &str, month_start: i64) -> Result<FarmerDashboard, sqlx::Error> {
    let (product_count, active_product_count): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM products WHERE farmer_id = $1",
    )
    .bind(farmer_id)
    .fetch_one(pool)
    .await?;

    let order_stats = orders::stats_for_farmer(pool, farmer_id, month_start).await?;
    let pending_supply_count = supplies::pending_count(pool).await?;

    Ok(FarmerDashboard {
        product_count,
        active_product_count,
        orders_by_status: order_stats.by_status,
        revenue_total: order_stats.revenue_total,
        revenue_this_month: order_stats.revenue_this_month,
        pending_supply_count,
    })
}

/// Unix millis of the first day of the month containing `now_millis` (UTC)
pub fn month_start(now_millis: i64) -> i64 {
    use chrono::{Datelike, TimeZone, Utc};
    let Some(now) = Utc.timestamp_millis_opt(now_millis).single() else {
        return 0;
    };
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .map(|d| d.timestamp_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        // 2026-10-18T00:00:00Z -> 2026-10-01T00:00:00Z
        assert_eq!(month_start(1_792_281_600_000), 1_790_812_800_000);
        assert_eq!(month_start(1_790_812_800_000), 1_790_812_800_000);
    }
}
