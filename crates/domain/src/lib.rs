//! Domain layer for the cafe order service.
//!
//! This crate provides the business rules on top of the store:
//! - Order placement with summed ingredient demand and all-or-nothing stock
//!   decrement
//! - Batch processing with per-order outcomes and a summary
//! - Order close and delete
//! - Menu and inventory maintenance

pub mod catalog;
pub mod error;
pub mod order;

pub use catalog::{CatalogService, InventoryItemChanges, PriceUpdate};
pub use error::DomainError;
pub use order::{
    BatchOrderProcessor, BatchResult, BatchSummary, IngredientDemand, InventoryUpdate,
    MAX_LINE_QUANTITY, MAX_ORDER_TOTAL, OrderLifecycle, OrderLineRequest, OrderOutcome,
    OrderPlacer, PlaceOrder, PlacedOrder, ProcessedOrder,
};
