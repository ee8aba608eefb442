//! Business logic shared by the HTTP handlers and webhooks

pub mod checkout;
pub mod ledger;
pub mod orders;
pub mod reconcile;
pub mod supplies;
