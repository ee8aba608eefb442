//! User profile Model

use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Marketplace role chosen at onboarding
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Buyer,
    /// Maggot farmer: sells products, collects waste
    Farmer,
    /// Organic waste producer: requests pickups
    Producer,
}

impl UserRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(Self::Buyer),
            "farmer" => Some(Self::Farmer),
            "producer" => Some(Self::Producer),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Farmer => "farmer",
            Self::Producer => "producer",
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_db(&value).ok_or(UnknownVariant {
            kind: "user role",
            value,
        })
    }
}

/// Profile row keyed by the identity provider's user id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub user_id: String,
    pub full_name: String,
    /// WhatsApp number as entered by the user
    pub phone: Option<String>,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub role: UserRole,
    pub business_name: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Upsert profile payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub business_name: Option<String>,
}
