//! Order placement, batch processing and lifecycle.

mod batch;
mod demand;
mod lifecycle;
mod placer;
mod request;

pub use batch::{BatchOrderProcessor, BatchResult, BatchSummary, OrderOutcome, ProcessedOrder};
pub use demand::IngredientDemand;
pub use lifecycle::OrderLifecycle;
pub use placer::OrderPlacer;
pub use request::{
    InventoryUpdate, MAX_LINE_QUANTITY, MAX_ORDER_TOTAL, OrderLineRequest, PlaceOrder,
    PlacedOrder,
};
