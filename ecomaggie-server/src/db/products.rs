use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};
use sqlx::PgPool;

/// Active products for the public catalog, newest first
pub async fn list_active(pool: &PgPool, query: &ProductQuery) -> Result<Vec<Product>, sqlx::Error> {
    let (limit, offset) = query.limit_offset();
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")));

    sqlx::query_as(
        "SELECT * FROM products
         WHERE is_active
           AND ($1::text IS NULL OR category = $1)
           AND ($2::text IS NULL OR name ILIKE $2)
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4",
    )
    .bind(query.category.map(|c| c.as_db()))
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_active(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1 AND is_active")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_farmer(pool: &PgPool, farmer_id: &str) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE farmer_id = $1 ORDER BY created_at DESC")
        .bind(farmer_id)
        .fetch_all(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    id: i64,
    farmer_id: &str,
    input: &ProductCreate,
    now: i64,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO products (id, farmer_id, name, description, category, price, unit, stock,
            image_url, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, $10)
         RETURNING *",
    )
    .bind(id)
    .bind(farmer_id)
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(input.category.as_db())
    .bind(input.price)
    .bind(input.unit.trim())
    .bind(input.stock)
    .bind(input.image_url.as_deref())
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Partial update of a farmer's own product
pub async fn update(
    pool: &PgPool,
    farmer_id: &str,
    id: i64,
    input: &ProductUpdate,
    now: i64,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE products SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            category = COALESCE($5, category),
            price = COALESCE($6, price),
            unit = COALESCE($7, unit),
            stock = COALESCE($8, stock),
            image_url = COALESCE($9, image_url),
            is_active = COALESCE($10, is_active),
            updated_at = $11
         WHERE id = $1 AND farmer_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(farmer_id)
    .bind(input.name.as_deref().map(str::trim))
    .bind(input.description.as_deref())
    .bind(input.category.map(|c| c.as_db()))
    .bind(input.price)
    .bind(input.unit.as_deref().map(str::trim))
    .bind(input.stock)
    .bind(input.image_url.as_deref())
    .bind(input.is_active)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Products are never deleted, only hidden from the catalog
pub async fn deactivate(pool: &PgPool, farmer_id: &str, id: i64, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET is_active = FALSE, updated_at = $3 WHERE id = $1 AND farmer_id = $2",
    )
    .bind(id)
    .bind(farmer_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// (id, updated_at) of every active product
pub async fn sitemap_entries(pool: &PgPool) -> Result<Vec<(i64, i64)>, sqlx::Error> {
    sqlx::query_as("SELECT id, updated_at FROM products WHERE is_active ORDER BY id")
        .fetch_all(pool)
        .await
}
