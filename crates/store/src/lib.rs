pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{IngredientId, MenuItemId, Money, OrderId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryCafeStore, InMemoryUnitOfWork};
pub use postgres::{PgUnitOfWork, PostgresCafeStore};
pub use query::{LeftoverSort, LeftoversQuery, OrderedItemsQuery};
pub use record::{
    InventoryItem, InventoryTransaction, Leftover, LeftoversPage, MenuItem, NewInventoryItem,
    NewMenuItem, NewOrder, NewOrderLine, Order, OrderLine, OrderStatus, OrderedItemCount,
    PriceChange, RecipeLine, StatusChange, StockLevel,
};
pub use store::{CafeStore, CafeStoreExt, InventoryStore, MenuCatalog, OrderStore, UnitOfWork};
