//! Domain error types.

use rust_decimal::Decimal;
use store::{IngredientId, OrderId, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request is malformed (blank customer, empty order, zero quantity,
    /// invalid catalog data).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A requested menu item does not exist.
    #[error("Menu item not found: {name}")]
    MenuItemNotFound { name: String },

    /// An ingredient's stock cannot cover the order's demand.
    #[error(
        "Insufficient inventory for {name} (ingredient {ingredient_id}): required {required}, available {available}"
    )]
    InsufficientInventory {
        ingredient_id: IngredientId,
        name: String,
        required: Decimal,
        available: Decimal,
    },

    /// A recipe references an ingredient with no inventory row.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(IngredientId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    /// Returns the rejection reason reported for this error in batch results.
    pub fn reason(&self) -> &'static str {
        match self {
            DomainError::InsufficientInventory { .. } => "insufficient_inventory",
            DomainError::MenuItemNotFound { .. } => "menu_item_not_found",
            _ => "unknown_error",
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MenuItemNotFound(id) => DomainError::MenuItemNotFound {
                name: id.to_string(),
            },
            StoreError::IngredientNotFound(id) => DomainError::IngredientNotFound(id),
            StoreError::OrderNotFound(id) => DomainError::OrderNotFound(id),
            other => DomainError::Store(other),
        }
    }
}
