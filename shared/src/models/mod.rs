//! Marketplace data models
//!
//! Shared between the API server and its JSON clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Status columns are stored as lowercase text and decoded through `TryFrom<String>`.
//! All timestamps are Unix milliseconds.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod profile;
pub mod supply;

// Re-exports
pub use address::*;
pub use cart::*;
pub use order::*;
pub use product::*;
pub use profile::*;
pub use supply::*;

/// Error returned when a stored status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
