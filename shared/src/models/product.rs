//! Product Model

use serde::{Deserialize, Serialize};

use super::UnknownVariant;
use crate::error::{AppError, ErrorCode};

/// Product category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Live BSF larvae
    MaggotFresh,
    /// Dried larvae (feed)
    MaggotDried,
    /// Kasgot / frass fertilizer
    Frass,
    Pupa,
    Other,
}

impl ProductCategory {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "maggot_fresh" => Some(Self::MaggotFresh),
            "maggot_dried" => Some(Self::MaggotDried),
            "frass" => Some(Self::Frass),
            "pupa" => Some(Self::Pupa),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::MaggotFresh => "maggot_fresh",
            Self::MaggotDried => "maggot_dried",
            Self::Frass => "frass",
            Self::Pupa => "pupa",
            Self::Other => "other",
        }
    }
}

impl TryFrom<String> for ProductCategory {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_db(&value).ok_or(UnknownVariant {
            kind: "product category",
            value,
        })
    }
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub farmer_id: String,
    pub name: String,
    pub description: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub category: ProductCategory,
    /// Price in Rupiah per unit
    pub price: i64,
    /// Sales unit, e.g. "kg"
    pub unit: String,
    pub stock: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ProductCategory,
    pub price: i64,
    pub unit: String,
    pub stock: i32,
    pub image_url: Option<String>,
}

impl ProductCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(Some(&self.name), Some(self.price), Some(self.stock))?;
        if self.unit.trim().is_empty() {
            return Err(AppError::validation("Satuan produk wajib diisi").with_detail("field", "unit"));
        }
        Ok(())
    }
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<i64>,
    pub unit: Option<String>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(self.name.as_ref(), self.price, self.stock)
    }
}

/// Highest accepted unit price (Rupiah)
pub const MAX_PRICE: i64 = 1_000_000_000;

fn validate_fields(name: Option<&String>, price: Option<i64>, stock: Option<i32>) -> Result<(), AppError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Nama produk wajib diisi").with_detail("field", "name"));
    }
    if price.is_some_and(|p| p <= 0 || p > MAX_PRICE) {
        return Err(AppError::new(ErrorCode::ProductInvalidPrice).with_detail("field", "price"));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::new(ErrorCode::ValueOutOfRange).with_detail("field", "stock"));
    }
    Ok(())
}

/// Public product listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<ProductCategory>,
    /// Case-insensitive name search
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ProductQuery {
    /// (limit, offset) with `per_page` clamped to 1..=100
    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, (page - 1) * per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> ProductCreate {
        ProductCreate {
            name: "Maggot Segar".into(),
            description: String::new(),
            category: ProductCategory::MaggotFresh,
            price: 8_000,
            unit: "kg".into(),
            stock: 50,
            image_url: None,
        }
    }

    #[test]
    fn test_valid_create() {
        assert!(create().validate().is_ok());
    }

    #[test]
    fn test_price_bounds() {
        let mut p = create();
        p.price = 0;
        assert_eq!(p.validate().unwrap_err().code, ErrorCode::ProductInvalidPrice);
        p.price = MAX_PRICE + 1;
        assert_eq!(p.validate().unwrap_err().code, ErrorCode::ProductInvalidPrice);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut p = create();
        p.name = "   ".into();
        assert_eq!(p.validate().unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_update_only_checks_present_fields() {
        assert!(ProductUpdate::default().validate().is_ok());
        let update = ProductUpdate {
            stock: Some(-1),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err().code, ErrorCode::ValueOutOfRange);
    }

    #[test]
    fn test_pagination_clamps() {
        let q = ProductQuery {
            page: Some(3),
            per_page: Some(500),
            ..Default::default()
        };
        assert_eq!(q.limit_offset(), (100, 200));
        assert_eq!(ProductQuery::default().limit_offset(), (20, 0));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(ProductCategory::from_db("frass"), Some(ProductCategory::Frass));
        assert!(ProductCategory::try_from("compost".to_string()).is_err());
    }
}
