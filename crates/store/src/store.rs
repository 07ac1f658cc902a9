use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{
    IngredientId, InventoryItem, InventoryTransaction, LeftoversPage, LeftoversQuery, MenuItem,
    MenuItemId, Money, NewInventoryItem, NewMenuItem, NewOrder, NewOrderLine, Order, OrderId,
    OrderStatus, OrderedItemCount, OrderedItemsQuery, PriceChange, Result, StatusChange,
    StockLevel,
};

/// Menu lookups and writes available inside a unit of work.
#[async_trait]
pub trait MenuCatalog: Send {
    /// Looks up a menu item by its unique name, including its recipe.
    ///
    /// Returns None if no item has that name.
    async fn price_and_recipe(&mut self, name: &str) -> Result<Option<MenuItem>>;

    /// Inserts a menu item and its recipe lines.
    ///
    /// Fails with `Constraint` if the name is taken or a recipe line
    /// references a missing ingredient.
    async fn insert_menu_item(&mut self, item: NewMenuItem) -> Result<MenuItem>;

    /// Sets a menu item's price and returns the previous one.
    ///
    /// Returns None if the item does not exist. Does not touch the price
    /// history; see [`MenuCatalog::record_price_change`].
    async fn update_price(&mut self, id: MenuItemId, price: Money) -> Result<Option<Money>>;

    /// Appends a row to the price history.
    async fn record_price_change(
        &mut self,
        id: MenuItemId,
        old_price: Money,
        new_price: Money,
    ) -> Result<()>;

    /// Loads a menu item with its recipe and locks its row until the unit of
    /// work ends.
    async fn lock_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>>;

    /// Rewrites a menu item's fields and replaces its recipe.
    ///
    /// Fails with `MenuItemNotFound` if the item is missing and with
    /// `Constraint` if the new name is taken or a recipe line references a
    /// missing ingredient. Does not touch the price history.
    async fn update_menu_item(&mut self, id: MenuItemId, item: NewMenuItem) -> Result<MenuItem>;

    /// Deletes a menu item with its recipe and price history.
    ///
    /// Returns false if the item did not exist. Fails with `Constraint` if
    /// an order line still references it.
    async fn delete_menu_item(&mut self, id: MenuItemId) -> Result<bool>;
}

/// Stock reads and mutations available inside a unit of work.
///
/// Every mutation appends a signed entry to the inventory ledger in the same
/// unit of work.
#[async_trait]
pub trait InventoryStore: Send {
    /// Reads the stock of the given ingredients and locks their rows until
    /// the unit of work ends.
    ///
    /// Rows are locked in ascending id order. Ids without a row are omitted
    /// from the result.
    async fn current_stock(&mut self, ids: &[IngredientId]) -> Result<Vec<StockLevel>>;

    /// Subtracts `quantity` from an ingredient's stock and returns the level
    /// after the decrement.
    ///
    /// Fails with `IngredientNotFound` if the row is missing and with
    /// `Constraint` if the stock would go negative.
    async fn decrement(&mut self, id: IngredientId, quantity: Decimal) -> Result<StockLevel>;

    /// Adds `quantity` to an ingredient's stock and returns the new level.
    async fn restock(&mut self, id: IngredientId, quantity: Decimal) -> Result<StockLevel>;

    /// Inserts an ingredient, recording its opening stock in the ledger.
    async fn insert_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem>;

    /// Loads an ingredient and locks its row until the unit of work ends.
    async fn lock_inventory_item(&mut self, id: IngredientId) -> Result<Option<InventoryItem>>;

    /// Sets an ingredient's name and reorder level. Stock is changed only
    /// through [`InventoryStore::decrement`] and [`InventoryStore::restock`].
    ///
    /// Fails with `IngredientNotFound` if the row is missing and with
    /// `Constraint` if the name is taken.
    async fn update_inventory_details(
        &mut self,
        id: IngredientId,
        name: &str,
        reorder_level: Decimal,
    ) -> Result<InventoryItem>;

    /// Deletes an ingredient with its ledger entries.
    ///
    /// Returns false if the row did not exist. Fails with `Constraint` if a
    /// recipe still uses the ingredient.
    async fn delete_inventory_item(&mut self, id: IngredientId) -> Result<bool>;
}

/// Order writes available inside a unit of work.
#[async_trait]
pub trait OrderStore: Send {
    /// Inserts an `active` order header and returns its id.
    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderId>;

    /// Inserts one line of an order.
    async fn insert_order_line(&mut self, order_id: OrderId, line: NewOrderLine) -> Result<()>;

    /// Appends a row to the order's status history.
    async fn append_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<()>;

    /// Reads an order's status and locks its row until the unit of work ends.
    ///
    /// Returns None if the order does not exist.
    async fn lock_order(&mut self, order_id: OrderId) -> Result<Option<OrderStatus>>;

    /// Sets the status column of an order.
    async fn set_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<()>;

    /// Rewrites an order header (customer, total, status `active`, created-at
    /// now) and deletes all of its lines.
    async fn replace_order(&mut self, order_id: OrderId, order: NewOrder) -> Result<()>;

    /// Deletes an order with its lines and status history.
    ///
    /// Returns false if the order did not exist.
    async fn delete_order(&mut self, order_id: OrderId) -> Result<bool>;
}

/// An atomic, isolated unit of work over the whole store.
///
/// Dropping a unit of work without committing rolls it back.
#[async_trait]
pub trait UnitOfWork: MenuCatalog + InventoryStore + OrderStore + Send {
    /// Makes every write of this unit of work visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this unit of work.
    async fn rollback(self) -> Result<()>;
}

/// Core trait for cafe store implementations.
///
/// Writes go through a [`UnitOfWork`] obtained from [`CafeStore::begin`];
/// the remaining methods are committed-state reads.
#[async_trait]
pub trait CafeStore: Send + Sync {
    /// The unit of work type of this store.
    type Tx: UnitOfWork + 'static;

    /// Starts a unit of work.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Resolves the prices of the named menu items. Unknown names are absent
    /// from the map.
    async fn price_map(&self, names: &[String]) -> Result<HashMap<String, Money>>;

    /// Lists menu items ordered by id.
    async fn list_menu_items(&self) -> Result<Vec<MenuItem>>;

    /// Loads a menu item with its recipe.
    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>>;

    /// Returns the price history of a menu item, oldest first.
    async fn price_history(&self, id: MenuItemId) -> Result<Vec<PriceChange>>;

    /// Loads an order with its lines.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders ordered by id.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// Returns the status history of an order, oldest first.
    async fn status_history(&self, id: OrderId) -> Result<Vec<StatusChange>>;

    /// Loads an inventory ingredient.
    async fn get_inventory_item(&self, id: IngredientId) -> Result<Option<InventoryItem>>;

    /// Lists inventory ingredients ordered by id.
    async fn list_inventory(&self) -> Result<Vec<InventoryItem>>;

    /// Returns the ledger entries of an ingredient, oldest first.
    async fn inventory_transactions(&self, id: IngredientId) -> Result<Vec<InventoryTransaction>>;

    /// Sums ordered quantities per menu item over orders in the window.
    ///
    /// Every menu item appears once, ordered by name; items without matching
    /// order lines report 0.
    async fn ordered_item_counts(&self, query: OrderedItemsQuery)
    -> Result<Vec<OrderedItemCount>>;

    /// Returns one page of ingredient names with their stock levels.
    ///
    /// Name order is ascending, quantity order is descending; ties fall back
    /// to ingredient id.
    async fn leftovers(&self, query: LeftoversQuery) -> Result<LeftoversPage>;
}

/// Extension trait providing convenience methods for cafe stores.
#[async_trait]
pub trait CafeStoreExt: CafeStore {
    /// Checks if an order exists.
    async fn order_exists(&self, id: OrderId) -> Result<bool> {
        Ok(self.get_order(id).await?.is_some())
    }

    /// Returns the stock level of every ingredient keyed by id.
    async fn stock_snapshot(&self) -> Result<HashMap<IngredientId, Decimal>> {
        Ok(self
            .list_inventory()
            .await?
            .into_iter()
            .map(|item| (item.id, item.stock_level))
            .collect())
    }

    /// Returns the number of status history rows of an order.
    async fn status_history_len(&self, id: OrderId) -> Result<usize> {
        Ok(self.status_history(id).await?.len())
    }
}

// Blanket implementation for all CafeStore implementations
impl<T: CafeStore + ?Sized> CafeStoreExt for T {}
