//! Database access layer

pub mod addresses;
pub mod carts;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod shipments;
pub mod supplies;
pub mod webhook_events;
