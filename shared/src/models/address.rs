//! Address Model

use serde::{Deserialize, Serialize};

use super::order::ShippingAddress;
use crate::error::AppError;

/// Saved address (shipping destination or waste pickup point)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub user_id: String,
    /// e.g. "Rumah", "Gudang"
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub province_id: String,
    pub province: String,
    pub regency_id: String,
    pub regency: String,
    pub district_id: String,
    pub district: String,
    pub village: Option<String>,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: i64,
}

impl Address {
    pub fn to_shipping(&self) -> ShippingAddress {
        ShippingAddress {
            recipient_name: self.recipient_name.clone(),
            phone: self.phone.clone(),
            street: self.street.clone(),
            village: self.village.clone(),
            district: self.district.clone(),
            regency: self.regency.clone(),
            province: self.province.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

/// Create / replace address payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressInput {
    pub label: String,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub province_id: String,
    pub province: String,
    pub regency_id: String,
    pub regency: String,
    pub district_id: String,
    pub district: String,
    pub village: Option<String>,
    pub postal_code: String,
}

impl AddressInput {
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("recipient_name", &self.recipient_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("province_id", &self.province_id),
            ("regency_id", &self.regency_id),
            ("district_id", &self.district_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{field} wajib diisi"))
                    .with_detail("field", field));
            }
        }
        if self.postal_code.len() != 5 || !self.postal_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::validation("Kode pos harus 5 digit")
                .with_detail("field", "postal_code"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            label: "Rumah".into(),
            recipient_name: "Budi".into(),
            phone: "081234567890".into(),
            street: "Jl. Melati 3".into(),
            province_id: "32".into(),
            province: "Jawa Barat".into(),
            regency_id: "3273".into(),
            regency: "Kota Bandung".into(),
            district_id: "3273010".into(),
            district: "Sukasari".into(),
            village: None,
            postal_code: "40151".into(),
        }
    }

    #[test]
    fn test_valid_address() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_postal_code_must_be_five_digits() {
        let mut a = input();
        a.postal_code = "4015".into();
        assert!(a.validate().is_err());
        a.postal_code = "4015a".into();
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_missing_field_named_in_details() {
        let mut a = input();
        a.street = " ".into();
        let err = a.validate().unwrap_err();
        assert_eq!(err.details.unwrap().get("field").unwrap(), "street");
    }
}
