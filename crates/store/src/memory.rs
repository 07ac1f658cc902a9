use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    CafeStore, IngredientId, InventoryItem, InventoryStore, InventoryTransaction, Leftover,
    LeftoverSort, LeftoversPage, LeftoversQuery, MenuCatalog, MenuItem, MenuItemId, Money,
    NewInventoryItem, NewMenuItem, NewOrder, NewOrderLine, Order, OrderId, OrderLine,
    OrderStatus, OrderStore, OrderedItemCount, OrderedItemsQuery, PriceChange, Result,
    StatusChange, StockLevel, StoreError, UnitOfWork,
};

/// All tables of the in-memory store.
#[derive(Debug, Default)]
struct MemoryState {
    menu_items: BTreeMap<MenuItemId, MenuItem>,
    price_history: Vec<PriceChange>,
    inventory: BTreeMap<IngredientId, InventoryItem>,
    transactions: Vec<InventoryTransaction>,
    orders: BTreeMap<OrderId, Order>,
    status_history: Vec<StatusChange>,
    last_menu_item_id: i64,
    last_ingredient_id: i64,
    last_order_id: i64,
    last_transaction_id: i64,
}

/// Reverses one write of an uncommitted unit of work.
///
/// Id counters are not part of the log: like database sequences, ids handed
/// out by a rolled back unit of work are never reused.
#[derive(Debug)]
enum Undo {
    MenuItem(MenuItemId, Option<MenuItem>),
    Inventory(IngredientId, Option<InventoryItem>),
    Order(OrderId, Option<Order>),
    PricePushed,
    TransactionPushed,
    StatusPushed,
    PricesRemoved(Vec<(usize, PriceChange)>),
    TransactionsRemoved(Vec<(usize, InventoryTransaction)>),
    StatusesRemoved(Vec<(usize, StatusChange)>),
}

impl Undo {
    fn revert(self, state: &mut MemoryState) {
        match self {
            Undo::MenuItem(id, previous) => restore_row(&mut state.menu_items, id, previous),
            Undo::Inventory(id, previous) => restore_row(&mut state.inventory, id, previous),
            Undo::Order(id, previous) => restore_row(&mut state.orders, id, previous),
            Undo::PricePushed => {
                state.price_history.pop();
            }
            Undo::TransactionPushed => {
                state.transactions.pop();
            }
            Undo::StatusPushed => {
                state.status_history.pop();
            }
            Undo::PricesRemoved(rows) => reinsert(&mut state.price_history, rows),
            Undo::TransactionsRemoved(rows) => reinsert(&mut state.transactions, rows),
            Undo::StatusesRemoved(rows) => reinsert(&mut state.status_history, rows),
        }
    }
}

fn restore_row<K: Ord, V>(table: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(row) => {
            table.insert(key, row);
        }
        None => {
            table.remove(&key);
        }
    }
}

/// Removes matching rows, returning them with their original positions.
fn remove_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Vec<(usize, T)> {
    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(rows.len());
    for (index, row) in std::mem::take(rows).into_iter().enumerate() {
        if pred(&row) {
            removed.push((index, row));
        } else {
            kept.push(row);
        }
    }
    *rows = kept;
    removed
}

/// Puts rows taken by [`remove_where`] back; positions must be ascending.
fn reinsert<T>(rows: &mut Vec<T>, removed: Vec<(usize, T)>) {
    for (index, row) in removed {
        rows.insert(index, row);
    }
}

/// In-memory cafe store implementation for testing.
///
/// This implementation stores all tables in memory and provides the same
/// interface as the PostgreSQL implementation. A unit of work holds the
/// store lock for its whole lifetime, so units of work are fully serialized.
/// Writes go straight to the shared tables and are logged; a unit of work
/// that is dropped without a successful commit replays the log backwards.
#[derive(Clone, Default)]
pub struct InMemoryCafeStore {
    state: Arc<Mutex<MemoryState>>,
    fail_on_commit: Arc<AtomicBool>,
    fail_price_lookups: Arc<AtomicBool>,
}

impl InMemoryCafeStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every following commit to fail with `CommitFailed`.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Configures every following [`CafeStore::price_map`] call to fail.
    pub fn set_fail_price_lookups(&self, fail: bool) {
        self.fail_price_lookups.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Returns the total number of inventory ledger entries.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        *self.state.lock().await = MemoryState::default();
    }
}

/// Unit of work over an [`InMemoryCafeStore`].
pub struct InMemoryUnitOfWork {
    state: OwnedMutexGuard<MemoryState>,
    undo: Vec<Undo>,
    committed: bool,
    fail_on_commit: bool,
}

impl InMemoryUnitOfWork {
    fn put_menu_item(&mut self, item: MenuItem) {
        let previous = self.state.menu_items.insert(item.id, item.clone());
        self.undo.push(Undo::MenuItem(item.id, previous));
    }

    fn put_inventory_item(&mut self, item: InventoryItem) {
        let previous = self.state.inventory.insert(item.id, item.clone());
        self.undo.push(Undo::Inventory(item.id, previous));
    }

    fn put_order(&mut self, order: Order) {
        let previous = self.state.orders.insert(order.id, order.clone());
        self.undo.push(Undo::Order(order.id, previous));
    }

    fn order(&self, id: OrderId) -> Result<Order> {
        self.state
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(id))
    }

    fn check_recipe(&self, item: &NewMenuItem) -> Result<()> {
        if let Some(missing) = item
            .recipe
            .iter()
            .find(|line| !self.state.inventory.contains_key(&line.ingredient_id))
        {
            return Err(StoreError::Constraint(format!(
                "recipe references missing ingredient {}",
                missing.ingredient_id
            )));
        }
        Ok(())
    }

    fn apply_stock_delta(&mut self, id: IngredientId, delta: Decimal) -> Result<StockLevel> {
        let mut item = self
            .state
            .inventory
            .get(&id)
            .cloned()
            .ok_or(StoreError::IngredientNotFound(id))?;

        let stock = item.stock_level + delta;
        if stock < Decimal::ZERO {
            return Err(StoreError::Constraint(format!(
                "stock level of ingredient {id} cannot go negative ({stock})"
            )));
        }

        let now = Utc::now();
        item.stock_level = stock;
        item.last_updated = now;
        let level = StockLevel {
            ingredient_id: id,
            name: item.name.clone(),
            stock,
        };
        self.put_inventory_item(item);

        self.state.last_transaction_id += 1;
        let transaction = InventoryTransaction {
            id: self.state.last_transaction_id,
            ingredient_id: id,
            quantity: delta,
            created_at: now,
        };
        self.state.transactions.push(transaction);
        self.undo.push(Undo::TransactionPushed);

        Ok(level)
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if !self.undo.is_empty() {
            tracing::debug!(writes = self.undo.len(), "rolling back in-memory unit of work");
        }
        let state = &mut *self.state;
        while let Some(entry) = self.undo.pop() {
            entry.revert(state);
        }
    }
}

#[async_trait]
impl MenuCatalog for InMemoryUnitOfWork {
    async fn price_and_recipe(&mut self, name: &str) -> Result<Option<MenuItem>> {
        Ok(self
            .state
            .menu_items
            .values()
            .find(|item| item.name == name)
            .cloned())
    }

    async fn insert_menu_item(&mut self, item: NewMenuItem) -> Result<MenuItem> {
        if self.state.menu_items.values().any(|m| m.name == item.name) {
            return Err(StoreError::Constraint(format!(
                "menu item name '{}' already exists",
                item.name
            )));
        }
        self.check_recipe(&item)?;

        self.state.last_menu_item_id += 1;
        let menu_item = MenuItem {
            id: MenuItemId::new(self.state.last_menu_item_id),
            name: item.name,
            description: item.description,
            price: item.price,
            tags: item.tags,
            recipe: item.recipe,
        };
        self.put_menu_item(menu_item.clone());
        Ok(menu_item)
    }

    async fn update_price(&mut self, id: MenuItemId, price: Money) -> Result<Option<Money>> {
        let Some(mut item) = self.state.menu_items.get(&id).cloned() else {
            return Ok(None);
        };
        let old = std::mem::replace(&mut item.price, price);
        self.put_menu_item(item);
        Ok(Some(old))
    }

    async fn record_price_change(
        &mut self,
        id: MenuItemId,
        old_price: Money,
        new_price: Money,
    ) -> Result<()> {
        self.state.price_history.push(PriceChange {
            menu_item_id: id,
            old_price,
            new_price,
            changed_at: Utc::now(),
        });
        self.undo.push(Undo::PricePushed);
        Ok(())
    }

    async fn lock_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        Ok(self.state.menu_items.get(&id).cloned())
    }

    async fn update_menu_item(&mut self, id: MenuItemId, item: NewMenuItem) -> Result<MenuItem> {
        if !self.state.menu_items.contains_key(&id) {
            return Err(StoreError::MenuItemNotFound(id));
        }
        if self
            .state
            .menu_items
            .values()
            .any(|m| m.id != id && m.name == item.name)
        {
            return Err(StoreError::Constraint(format!(
                "menu item name '{}' already exists",
                item.name
            )));
        }
        self.check_recipe(&item)?;

        let updated = MenuItem {
            id,
            name: item.name,
            description: item.description,
            price: item.price,
            tags: item.tags,
            recipe: item.recipe,
        };
        self.put_menu_item(updated.clone());
        Ok(updated)
    }

    async fn delete_menu_item(&mut self, id: MenuItemId) -> Result<bool> {
        if !self.state.menu_items.contains_key(&id) {
            return Ok(false);
        }
        if self
            .state
            .orders
            .values()
            .any(|o| o.lines.iter().any(|l| l.menu_item_id == id))
        {
            return Err(StoreError::Constraint(format!(
                "menu item {id} is referenced by existing orders"
            )));
        }

        let previous = self.state.menu_items.remove(&id);
        self.undo.push(Undo::MenuItem(id, previous));
        let removed = remove_where(&mut self.state.price_history, |p| p.menu_item_id == id);
        self.undo.push(Undo::PricesRemoved(removed));
        Ok(true)
    }
}

#[async_trait]
impl InventoryStore for InMemoryUnitOfWork {
    async fn current_stock(&mut self, ids: &[IngredientId]) -> Result<Vec<StockLevel>> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();

        Ok(ids
            .into_iter()
            .filter_map(|id| self.state.inventory.get(&id))
            .map(|item| StockLevel {
                ingredient_id: item.id,
                name: item.name.clone(),
                stock: item.stock_level,
            })
            .collect())
    }

    async fn decrement(&mut self, id: IngredientId, quantity: Decimal) -> Result<StockLevel> {
        self.apply_stock_delta(id, -quantity)
    }

    async fn restock(&mut self, id: IngredientId, quantity: Decimal) -> Result<StockLevel> {
        self.apply_stock_delta(id, quantity)
    }

    async fn insert_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem> {
        if self.state.inventory.values().any(|i| i.name == item.name) {
            return Err(StoreError::Constraint(format!(
                "ingredient name '{}' already exists",
                item.name
            )));
        }

        self.state.last_ingredient_id += 1;
        let id = IngredientId::new(self.state.last_ingredient_id);
        self.put_inventory_item(InventoryItem {
            id,
            name: item.name,
            stock_level: Decimal::ZERO,
            reorder_level: item.reorder_level,
            last_updated: Utc::now(),
        });
        self.apply_stock_delta(id, item.stock_level)?;

        self.state
            .inventory
            .get(&id)
            .cloned()
            .ok_or(StoreError::IngredientNotFound(id))
    }

    async fn lock_inventory_item(&mut self, id: IngredientId) -> Result<Option<InventoryItem>> {
        Ok(self.state.inventory.get(&id).cloned())
    }

    async fn update_inventory_details(
        &mut self,
        id: IngredientId,
        name: &str,
        reorder_level: Decimal,
    ) -> Result<InventoryItem> {
        let mut item = self
            .state
            .inventory
            .get(&id)
            .cloned()
            .ok_or(StoreError::IngredientNotFound(id))?;
        if self
            .state
            .inventory
            .values()
            .any(|i| i.id != id && i.name == name)
        {
            return Err(StoreError::Constraint(format!(
                "ingredient name '{name}' already exists"
            )));
        }

        item.name = name.to_string();
        item.reorder_level = reorder_level;
        item.last_updated = Utc::now();
        self.put_inventory_item(item.clone());
        Ok(item)
    }

    async fn delete_inventory_item(&mut self, id: IngredientId) -> Result<bool> {
        if !self.state.inventory.contains_key(&id) {
            return Ok(false);
        }
        if let Some(item) = self
            .state
            .menu_items
            .values()
            .find(|m| m.recipe.iter().any(|l| l.ingredient_id == id))
        {
            return Err(StoreError::Constraint(format!(
                "ingredient {id} is used by menu item '{}'",
                item.name
            )));
        }

        let previous = self.state.inventory.remove(&id);
        self.undo.push(Undo::Inventory(id, previous));
        let removed = remove_where(&mut self.state.transactions, |t| t.ingredient_id == id);
        self.undo.push(Undo::TransactionsRemoved(removed));
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for InMemoryUnitOfWork {
    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderId> {
        self.state.last_order_id += 1;
        let id = OrderId::new(self.state.last_order_id);
        self.put_order(Order {
            id,
            customer_name: order.customer_name,
            status: OrderStatus::Active,
            total_amount: order.total_amount,
            created_at: Utc::now(),
            lines: Vec::new(),
        });
        Ok(id)
    }

    async fn insert_order_line(&mut self, order_id: OrderId, line: NewOrderLine) -> Result<()> {
        let menu_item_name = self
            .state
            .menu_items
            .get(&line.menu_item_id)
            .map(|item| item.name.clone())
            .ok_or_else(|| {
                StoreError::Constraint(format!(
                    "order line references missing menu item {}",
                    line.menu_item_id
                ))
            })?;

        let mut order = self.order(order_id)?;
        order.lines.push(OrderLine {
            menu_item_id: line.menu_item_id,
            menu_item_name,
            quantity: line.quantity,
            price_at_order_time: line.price_at_order_time,
        });
        self.put_order(order);
        Ok(())
    }

    async fn append_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        if !self.state.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }
        self.state.status_history.push(StatusChange {
            order_id,
            status,
            changed_at: Utc::now(),
        });
        self.undo.push(Undo::StatusPushed);
        Ok(())
    }

    async fn lock_order(&mut self, order_id: OrderId) -> Result<Option<OrderStatus>> {
        Ok(self.state.orders.get(&order_id).map(|o| o.status))
    }

    async fn set_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut order = self.order(order_id)?;
        order.status = status;
        self.put_order(order);
        Ok(())
    }

    async fn replace_order(&mut self, order_id: OrderId, order: NewOrder) -> Result<()> {
        let mut existing = self.order(order_id)?;
        existing.customer_name = order.customer_name;
        existing.total_amount = order.total_amount;
        existing.status = OrderStatus::Active;
        existing.created_at = Utc::now();
        existing.lines.clear();
        self.put_order(existing);
        Ok(())
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<bool> {
        let Some(previous) = self.state.orders.remove(&order_id) else {
            return Ok(false);
        };
        self.undo.push(Undo::Order(order_id, Some(previous)));
        let removed = remove_where(&mut self.state.status_history, |h| h.order_id == order_id);
        self.undo.push(Undo::StatusesRemoved(removed));
        Ok(true)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self) -> Result<()> {
        let mut uow = self;
        if uow.fail_on_commit {
            tracing::warn!("discarding unit of work: commit failure injected");
            return Err(StoreError::CommitFailed(
                "in-memory store configured to fail commits".to_string(),
            ));
        }
        uow.committed = true;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        drop(self);
        Ok(())
    }
}

#[async_trait]
impl CafeStore for InMemoryCafeStore {
    type Tx = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        let state = self.state.clone().lock_owned().await;
        Ok(InMemoryUnitOfWork {
            state,
            undo: Vec::new(),
            committed: false,
            fail_on_commit: self.fail_on_commit.load(Ordering::SeqCst),
        })
    }

    async fn price_map(&self, names: &[String]) -> Result<HashMap<String, Money>> {
        if self.fail_price_lookups.load(Ordering::SeqCst) {
            tracing::warn!("price lookup failure injected");
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let state = self.state.lock().await;
        Ok(state
            .menu_items
            .values()
            .filter(|item| names.contains(&item.name))
            .map(|item| (item.name.clone(), item.price))
            .collect())
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>> {
        Ok(self.state.lock().await.menu_items.values().cloned().collect())
    }

    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>> {
        Ok(self.state.lock().await.menu_items.get(&id).cloned())
    }

    async fn price_history(&self, id: MenuItemId) -> Result<Vec<PriceChange>> {
        let state = self.state.lock().await;
        Ok(state
            .price_history
            .iter()
            .filter(|p| p.menu_item_id == id)
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.state.lock().await.orders.values().cloned().collect())
    }

    async fn status_history(&self, id: OrderId) -> Result<Vec<StatusChange>> {
        let state = self.state.lock().await;
        Ok(state
            .status_history
            .iter()
            .filter(|h| h.order_id == id)
            .cloned()
            .collect())
    }

    async fn get_inventory_item(&self, id: IngredientId) -> Result<Option<InventoryItem>> {
        Ok(self.state.lock().await.inventory.get(&id).cloned())
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        Ok(self.state.lock().await.inventory.values().cloned().collect())
    }

    async fn inventory_transactions(&self, id: IngredientId) -> Result<Vec<InventoryTransaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| t.ingredient_id == id)
            .cloned()
            .collect())
    }

    async fn ordered_item_counts(
        &self,
        query: OrderedItemsQuery,
    ) -> Result<Vec<OrderedItemCount>> {
        let state = self.state.lock().await;

        let mut totals: BTreeMap<&str, i64> = state
            .menu_items
            .values()
            .map(|item| (item.name.as_str(), 0))
            .collect();

        for order in state.orders.values().filter(|o| query.contains(o.created_at)) {
            for line in &order.lines {
                if let Some(item) = state.menu_items.get(&line.menu_item_id)
                    && let Some(total) = totals.get_mut(item.name.as_str())
                {
                    *total += i64::from(line.quantity);
                }
            }
        }

        Ok(totals
            .into_iter()
            .map(|(name, quantity)| OrderedItemCount {
                name: name.to_string(),
                quantity,
            })
            .collect())
    }

    async fn leftovers(&self, query: LeftoversQuery) -> Result<LeftoversPage> {
        let state = self.state.lock().await;

        let mut rows: Vec<&InventoryItem> = state.inventory.values().collect();
        match query.sort_by {
            LeftoverSort::Name => rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
            LeftoverSort::Quantity => rows.sort_by(|a, b| {
                b.stock_level
                    .cmp(&a.stock_level)
                    .then(a.id.cmp(&b.id))
            }),
        }

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let data = rows
            .iter()
            .skip(offset)
            .take(query.page_size as usize)
            .map(|item| Leftover {
                name: item.name.clone(),
                quantity: item.stock_level,
            })
            .collect();

        Ok(LeftoversPage::new(&query, rows.len() as u64, data))
    }
}
