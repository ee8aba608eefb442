//! Order Model

use serde::{Deserialize, Serialize};

use super::UnknownVariant;
use crate::error::{AppError, ErrorCode};

/// Purchase lifecycle stage
///
/// `Packed` means paid and waiting for the farmer to hand the parcel to a courier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Unpaid,
    Packed,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Unpaid,
        Self::Packed,
        Self::Shipped,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Parse from database string value (lowercase)
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(Self::Unpaid),
            "packed" => Some(Self::Packed),
            "shipped" => Some(Self::Shipped),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Database string representation (lowercase)
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Packed => "packed",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Label shown to buyers and farmers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unpaid => "Belum Dibayar",
            Self::Packed => "Dikemas",
            Self::Shipped => "Dikirim",
            Self::Completed => "Selesai",
            Self::Cancelled => "Dibatalkan",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Position along the forward path; `None` for `Cancelled`.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Unpaid => Some(0),
            Self::Packed => Some(1),
            Self::Shipped => Some(2),
            Self::Completed => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Transitions a buyer or farmer may request through the API.
    ///
    /// Payment and courier webhooks use their own rules (see the server's
    /// reconciliation module).
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Unpaid, Self::Cancelled)
                | (Self::Packed, Self::Shipped)
                | (Self::Packed, Self::Cancelled)
                | (Self::Shipped, Self::Completed)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_db(&value).ok_or(UnknownVariant {
            kind: "order status",
            value,
        })
    }
}

/// Address copied onto the order at checkout, so later edits do not change history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub village: Option<String>,
    pub district: String,
    pub regency: String,
    pub province: String,
    pub postal_code: String,
}

impl ShippingAddress {
    /// Single-line rendering used in notifications
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.as_str()];
        if let Some(v) = self.village.as_deref().filter(|v| !v.is_empty()) {
            parts.push(v);
        }
        parts.extend([
            self.district.as_str(),
            self.regency.as_str(),
            self.province.as_str(),
            self.postal_code.as_str(),
        ]);
        parts.join(", ")
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Public order reference, also used as the payment gateway's `order_id`
    pub order_number: String,
    pub buyer_id: String,
    pub farmer_id: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub shipping_address: ShippingAddress,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: OrderStatus,
    /// Amounts in Rupiah
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub service_fee: i64,
    pub total: i64,
    pub payment_token: Option<String>,
    pub payment_redirect_url: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<i64>,
    pub courier: Option<String>,
    pub waybill_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item (name and price frozen at checkout)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price: i64,
    pub quantity: i32,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// Order with its items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Farmer request to hand an order to a courier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipOrderRequest {
    pub courier: String,
    pub waybill_id: String,
    /// Courier booking id, when the parcel was booked through the courier API
    #[serde(default)]
    pub courier_order_id: Option<String>,
}

impl ShipOrderRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.courier.trim().is_empty() {
            return Err(AppError::validation("Kurir wajib diisi").with_detail("field", "courier"));
        }
        if self.waybill_id.trim().is_empty() {
            return Err(AppError::validation("Nomor resi wajib diisi").with_detail("field", "waybill_id"));
        }
        Ok(())
    }
}

/// Highest accepted shipping quote (Rupiah)
pub const MAX_SHIPPING_COST: i64 = 10_000_000;

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub address_id: i64,
    /// Cart lines to buy; all lines when absent
    #[serde(default)]
    pub cart_item_ids: Option<Vec<i64>>,
    pub courier: Option<String>,
    /// Quoted by the courier on the client, in Rupiah
    #[serde(default)]
    pub shipping_cost: i64,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=MAX_SHIPPING_COST).contains(&self.shipping_cost) {
            return Err(AppError::new(ErrorCode::ValueOutOfRange)
                .with_detail("field", "shipping_cost"));
        }
        if self.cart_item_ids.as_ref().is_some_and(Vec::is_empty) {
            return Err(AppError::new(ErrorCode::CartEmpty));
        }
        Ok(())
    }
}

/// Created order plus the hosted payment page to send the buyer to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order: Order,
    pub payment_token: String,
    pub redirect_url: String,
}

/// Amounts for a checkout, all in Rupiah
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub service_fee: i64,
    pub total: i64,
}

impl OrderTotals {
    /// `ValueOutOfRange` when any amount overflows
    pub fn compute(
        lines: impl IntoIterator<Item = (i64, i32)>,
        shipping_cost: i64,
        service_fee: i64,
    ) -> Result<Self, AppError> {
        let out_of_range = || AppError::new(ErrorCode::ValueOutOfRange).with_detail("field", "total");
        let subtotal = lines.into_iter().try_fold(0i64, |acc, (price, qty)| {
            price
                .checked_mul(i64::from(qty))
                .and_then(|line| acc.checked_add(line))
                .ok_or_else(out_of_range)
        })?;
        let total = subtotal
            .checked_add(shipping_cost)
            .and_then(|t| t.checked_add(service_fee))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            subtotal,
            shipping_cost,
            service_fee,
            total,
        })
    }
}
