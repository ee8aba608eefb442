//! Supply (organic waste pickup request) Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UnknownVariant;
use crate::error::AppError;

/// Supply request lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SupplyStatus {
    #[default]
    Pending,
    Accepted,
    Completed,
    Rejected,
    Cancelled,
}

/// Action requested on a supply request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupplyAction {
    /// Farmer claims the pickup
    Accept,
    /// Farmer declines the pickup
    Reject,
    /// Assigned farmer has collected the waste
    Complete,
    /// Producer withdraws the request
    Cancel,
}

impl SupplyAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }
}

impl SupplyStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Resulting status, or `None` if the action is not allowed from here
    pub fn apply(&self, action: SupplyAction) -> Option<SupplyStatus> {
        match (self, action) {
            (Self::Pending, SupplyAction::Accept) => Some(Self::Accepted),
            (Self::Pending, SupplyAction::Reject) => Some(Self::Rejected),
            (Self::Pending, SupplyAction::Cancel) => Some(Self::Cancelled),
            (Self::Accepted, SupplyAction::Complete) => Some(Self::Completed),
            _ => None,
        }
    }
}

impl TryFrom<String> for SupplyStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_db(&value).ok_or(UnknownVariant {
            kind: "supply status",
            value,
        })
    }
}

/// Supply request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Supply {
    pub id: i64,
    pub producer_id: String,
    /// Farmer who accepted (or rejected) the request
    pub farmer_id: Option<String>,
    /// e.g. "sisa sayur", "ampas tahu"
    pub waste_type: String,
    pub weight_kg: Decimal,
    pub pickup_address_id: i64,
    /// Requested pickup day (Unix millis)
    pub pickup_date: i64,
    pub notes: Option<String>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub status: SupplyStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create supply request payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCreate {
    pub waste_type: String,
    pub weight_kg: Decimal,
    pub pickup_address_id: i64,
    pub pickup_date: i64,
    pub notes: Option<String>,
}

impl SupplyCreate {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.waste_type.trim().is_empty() {
            return Err(
                AppError::validation("Jenis sampah wajib diisi").with_detail("field", "waste_type")
            );
        }
        if self.weight_kg <= Decimal::ZERO {
            return Err(AppError::validation("Berat sampah harus lebih dari 0")
                .with_detail("field", "weight_kg"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transitions() {
        use SupplyAction::*;
        use SupplyStatus::*;
        assert_eq!(Pending.apply(Accept), Some(Accepted));
        assert_eq!(Pending.apply(Reject), Some(Rejected));
        assert_eq!(Pending.apply(Cancel), Some(Cancelled));
        assert_eq!(Accepted.apply(Complete), Some(Completed));

        assert_eq!(Pending.apply(Complete), None);
        assert_eq!(Accepted.apply(Cancel), None);
        assert_eq!(Rejected.apply(Accept), None);
        assert_eq!(Completed.apply(Cancel), None);
    }

    #[test]
    fn test_validate_weight() {
        let mut req = SupplyCreate {
            waste_type: "sisa sayur".into(),
            weight_kg: Decimal::from_str("12.5").unwrap(),
            pickup_address_id: 1,
            pickup_date: 1_760_000_000_000,
            notes: None,
        };
        assert!(req.validate().is_ok());

        req.weight_kg = Decimal::ZERO;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_status_db_values() {
        assert_eq!(SupplyStatus::from_db("accepted"), Some(SupplyStatus::Accepted));
        assert_eq!(SupplyStatus::Cancelled.as_db(), "cancelled");
        assert!(SupplyStatus::try_from("picked".to_string()).is_err());
    }
}
