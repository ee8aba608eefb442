//! Shared types for EcoMaggie
//!
//! Error codes, the `AppError` / `ApiResponse` envelope, marketplace domain
//! models with their status tables, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
