//! Cart Model

use serde::{Deserialize, Serialize};

/// Cart line joined with its product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub farmer_id: String,
    pub price: i64,
    pub unit: String,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }

    /// Can this line be checked out as-is?
    pub fn is_purchasable(&self) -> bool {
        self.is_active && self.quantity > 0 && self.quantity <= self.stock
    }
}

/// Cart contents returned to the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
}

impl CartSummary {
    pub fn new(items: Vec<CartLine>) -> Self {
        let subtotal = items.iter().map(CartLine::line_total).sum();
        Self { items, subtotal }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItem {
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i32,
}

/// Requested quantity limited to what is in stock; `None` when nothing can be added.
pub fn clamp_quantity(requested: i32, stock: i32) -> Option<i32> {
    if requested <= 0 || stock <= 0 {
        return None;
    }
    Some(requested.min(stock))
}
