//! HTTP route handlers.

pub mod health;
pub mod inventory;
pub mod menu;
pub mod metrics;
pub mod orders;
