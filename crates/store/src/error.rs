use thiserror::Error;

use crate::{IngredientId, MenuItemId, OrderId};

/// Errors that can occur when interacting with the cafe store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The menu item was not found.
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(MenuItemId),

    /// The inventory ingredient was not found.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(IngredientId),

    /// The order was not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A write would violate a store constraint (unique name, non-negative
    /// stock, foreign key).
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Committing a unit of work failed; nothing it wrote is visible.
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
