//! Shared types for the cafe order service.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{IngredientId, MenuItemId, OrderId};
