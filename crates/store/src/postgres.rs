use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    CafeStore, IngredientId, InventoryItem, InventoryStore, InventoryTransaction, Leftover,
    LeftoverSort, LeftoversPage, LeftoversQuery, MenuCatalog, MenuItem, MenuItemId, Money,
    NewInventoryItem, NewMenuItem, NewOrder, NewOrderLine, Order, OrderId, OrderLine,
    OrderStatus, OrderStore, OrderedItemCount, OrderedItemsQuery, PriceChange, RecipeLine,
    Result, StatusChange, StockLevel, StoreError, UnitOfWork,
};

/// SQLSTATE of `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// PostgreSQL-backed cafe store implementation.
#[derive(Clone)]
pub struct PostgresCafeStore {
    pool: PgPool,
}

impl PostgresCafeStore {
    /// Creates a new PostgreSQL cafe store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps constraint violations to [`StoreError::Constraint`], everything else
/// to [`StoreError::Database`].
fn map_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.kind() {
            sqlx::error::ErrorKind::UniqueViolation
            | sqlx::error::ErrorKind::ForeignKeyViolation
            | sqlx::error::ErrorKind::CheckViolation
            | sqlx::error::ErrorKind::NotNullViolation => {
                tracing::debug!(error = %db_err, "constraint violation");
                return StoreError::Constraint(db_err.message().to_string());
            }
            _ if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
                tracing::debug!(error = %db_err, "numeric value out of range");
                return StoreError::Constraint(db_err.message().to_string());
            }
            _ => {}
        }
    }
    StoreError::Database(e)
}

fn money(amount: Decimal) -> Result<Money> {
    Money::from_decimal(amount)
        .ok_or_else(|| StoreError::Constraint(format!("amount {amount} out of range")))
}

fn parse_status(status: &str) -> Result<OrderStatus> {
    status.parse().map_err(StoreError::Constraint)
}

fn row_to_inventory_item(row: PgRow) -> Result<InventoryItem> {
    Ok(InventoryItem {
        id: IngredientId::new(row.try_get("inventory_id")?),
        name: row.try_get("name")?,
        stock_level: row.try_get("stock_level")?,
        reorder_level: row.try_get("reorder_level")?,
        last_updated: row.try_get("last_updated")?,
    })
}

fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: OrderId::new(row.try_get("order_id")?),
        customer_name: row.try_get("customer_name")?,
        status: parse_status(&status)?,
        total_amount: money(row.try_get("total_amount")?)?,
        created_at: row.try_get("order_date")?,
        lines,
    })
}

async fn fetch_recipe(conn: &mut PgConnection, id: MenuItemId) -> Result<Vec<RecipeLine>> {
    let rows = sqlx::query(
        r#"
        SELECT inventory_id, quantity
        FROM menu_item_ingredients
        WHERE menu_item_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(id.as_i64())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(RecipeLine {
                ingredient_id: IngredientId::new(row.try_get("inventory_id")?),
                quantity_per_unit: row.try_get("quantity")?,
            })
        })
        .collect()
}

async fn insert_recipe(
    conn: &mut PgConnection,
    id: MenuItemId,
    recipe: &[RecipeLine],
) -> Result<()> {
    for line in recipe {
        sqlx::query(
            r#"
            INSERT INTO menu_item_ingredients (menu_item_id, inventory_id, quantity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id.as_i64())
        .bind(line.ingredient_id.as_i64())
        .bind(line.quantity_per_unit)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;
    }
    Ok(())
}

async fn row_to_menu_item(conn: &mut PgConnection, row: PgRow) -> Result<MenuItem> {
    let id = MenuItemId::new(row.try_get("menu_item_id")?);
    Ok(MenuItem {
        id,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: money(row.try_get("price")?)?,
        tags: row.try_get("tags")?,
        recipe: fetch_recipe(conn, id).await?,
    })
}

/// Loads the lines of the given orders keyed by order id, each in insertion
/// order.
async fn fetch_lines(
    conn: &mut PgConnection,
    order_ids: &[i64],
) -> Result<HashMap<OrderId, Vec<OrderLine>>> {
    let rows = sqlx::query(
        r#"
        SELECT oi.order_id, oi.menu_item_id, mi.name, oi.quantity, oi.price_at_order_time
        FROM order_items oi
        JOIN menu_items mi ON mi.menu_item_id = oi.menu_item_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.order_item_id ASC
        "#,
    )
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut lines: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
    for row in rows {
        let quantity: i32 = row.try_get("quantity")?;
        let line = OrderLine {
            menu_item_id: MenuItemId::new(row.try_get("menu_item_id")?),
            menu_item_name: row.try_get("name")?,
            quantity: u32::try_from(quantity)
                .map_err(|_| StoreError::Constraint(format!("invalid quantity {quantity}")))?,
            price_at_order_time: money(row.try_get("price_at_order_time")?)?,
        };
        lines
            .entry(OrderId::new(row.try_get("order_id")?))
            .or_default()
            .push(line);
    }
    Ok(lines)
}

async fn append_ledger(conn: &mut PgConnection, id: IngredientId, delta: Decimal) -> Result<()> {
    sqlx::query("INSERT INTO inventory_transactions (inventory_id, quantity) VALUES ($1, $2)")
        .bind(id.as_i64())
        .bind(delta)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

async fn apply_stock_delta(
    conn: &mut PgConnection,
    id: IngredientId,
    delta: Decimal,
) -> Result<StockLevel> {
    let row = sqlx::query(
        r#"
        UPDATE inventory
        SET stock_level = stock_level + $1, last_updated = NOW()
        WHERE inventory_id = $2
        RETURNING name, stock_level
        "#,
    )
    .bind(delta)
    .bind(id.as_i64())
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_db_error)?
    .ok_or(StoreError::IngredientNotFound(id))?;

    append_ledger(conn, id, delta).await?;

    Ok(StockLevel {
        ingredient_id: id,
        name: row.try_get("name")?,
        stock: row.try_get("stock_level")?,
    })
}

/// Unit of work over a PostgreSQL transaction.
///
/// Dropping it without calling [`UnitOfWork::commit`] rolls the transaction
/// back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MenuCatalog for PgUnitOfWork {
    async fn price_and_recipe(&mut self, name: &str) -> Result<Option<MenuItem>> {
        let row = sqlx::query(
            r#"
            SELECT menu_item_id, name, description, price, tags
            FROM menu_items
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_menu_item(&mut self.tx, row).await?)),
            None => Ok(None),
        }
    }

    async fn insert_menu_item(&mut self, item: NewMenuItem) -> Result<MenuItem> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO menu_items (name, description, price, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING menu_item_id
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.to_decimal())
        .bind(&item.tags)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        let id = MenuItemId::new(id);
        insert_recipe(&mut self.tx, id, &item.recipe).await?;

        Ok(MenuItem {
            id,
            name: item.name,
            description: item.description,
            price: item.price,
            tags: item.tags,
            recipe: item.recipe,
        })
    }

    async fn update_price(&mut self, id: MenuItemId, price: Money) -> Result<Option<Money>> {
        let old: Option<Decimal> =
            sqlx::query_scalar("SELECT price FROM menu_items WHERE menu_item_id = $1 FOR UPDATE")
                .bind(id.as_i64())
                .fetch_optional(&mut *self.tx)
                .await?;

        let Some(old) = old else {
            return Ok(None);
        };

        sqlx::query("UPDATE menu_items SET price = $1 WHERE menu_item_id = $2")
            .bind(price.to_decimal())
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        Ok(Some(money(old)?))
    }

    async fn record_price_change(
        &mut self,
        id: MenuItemId,
        old_price: Money,
        new_price: Money,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO price_history (menu_item_id, old_price, new_price)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id.as_i64())
        .bind(old_price.to_decimal())
        .bind(new_price.to_decimal())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn lock_menu_item(&mut self, id: MenuItemId) -> Result<Option<MenuItem>> {
        let row = sqlx::query(
            r#"
            SELECT menu_item_id, name, description, price, tags
            FROM menu_items
            WHERE menu_item_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_menu_item(&mut self.tx, row).await?)),
            None => Ok(None),
        }
    }

    async fn update_menu_item(&mut self, id: MenuItemId, item: NewMenuItem) -> Result<MenuItem> {
        let result = sqlx::query(
            r#"
            UPDATE menu_items
            SET name = $1, description = $2, price = $3, tags = $4
            WHERE menu_item_id = $5
            "#,
        )
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.to_decimal())
        .bind(&item.tags)
        .bind(id.as_i64())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MenuItemNotFound(id));
        }

        sqlx::query("DELETE FROM menu_item_ingredients WHERE menu_item_id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        insert_recipe(&mut self.tx, id, &item.recipe).await?;

        Ok(MenuItem {
            id,
            name: item.name,
            description: item.description,
            price: item.price,
            tags: item.tags,
            recipe: item.recipe,
        })
    }

    async fn delete_menu_item(&mut self, id: MenuItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE menu_item_id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InventoryStore for PgUnitOfWork {
    async fn current_stock(&mut self, ids: &[IngredientId]) -> Result<Vec<StockLevel>> {
        let ids: Vec<i64> = ids.iter().map(IngredientId::as_i64).collect();

        // Row locks are taken in id order so concurrent orders touching the
        // same ingredients cannot deadlock.
        let rows = sqlx::query(
            r#"
            SELECT inventory_id, name, stock_level
            FROM inventory
            WHERE inventory_id = ANY($1)
            ORDER BY inventory_id ASC
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(StockLevel {
                    ingredient_id: IngredientId::new(row.try_get("inventory_id")?),
                    name: row.try_get("name")?,
                    stock: row.try_get("stock_level")?,
                })
            })
            .collect()
    }

    async fn decrement(&mut self, id: IngredientId, quantity: Decimal) -> Result<StockLevel> {
        apply_stock_delta(&mut self.tx, id, -quantity).await
    }

    async fn restock(&mut self, id: IngredientId, quantity: Decimal) -> Result<StockLevel> {
        apply_stock_delta(&mut self.tx, id, quantity).await
    }

    async fn insert_inventory_item(&mut self, item: NewInventoryItem) -> Result<InventoryItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO inventory (name, stock_level, reorder_level)
            VALUES ($1, $2, $3)
            RETURNING inventory_id, name, stock_level, reorder_level, last_updated
            "#,
        )
        .bind(&item.name)
        .bind(item.stock_level)
        .bind(item.reorder_level)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        let inserted = row_to_inventory_item(row)?;
        append_ledger(&mut self.tx, inserted.id, item.stock_level).await?;
        Ok(inserted)
    }

    async fn lock_inventory_item(&mut self, id: IngredientId) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            SELECT inventory_id, name, stock_level, reorder_level, last_updated
            FROM inventory
            WHERE inventory_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_inventory_item).transpose()
    }

    async fn update_inventory_details(
        &mut self,
        id: IngredientId,
        name: &str,
        reorder_level: Decimal,
    ) -> Result<InventoryItem> {
        let row = sqlx::query(
            r#"
            UPDATE inventory
            SET name = $1, reorder_level = $2, last_updated = NOW()
            WHERE inventory_id = $3
            RETURNING inventory_id, name, stock_level, reorder_level, last_updated
            "#,
        )
        .bind(name)
        .bind(reorder_level)
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_db_error)?
        .ok_or(StoreError::IngredientNotFound(id))?;

        row_to_inventory_item(row)
    }

    async fn delete_inventory_item(&mut self, id: IngredientId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM inventory WHERE inventory_id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PgUnitOfWork {
    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_name, status, total_amount)
            VALUES ($1, 'active', $2)
            RETURNING order_id
            "#,
        )
        .bind(&order.customer_name)
        .bind(order.total_amount.to_decimal())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(OrderId::new(id))
    }

    async fn insert_order_line(&mut self, order_id: OrderId, line: NewOrderLine) -> Result<()> {
        let quantity = i32::try_from(line.quantity)
            .map_err(|_| StoreError::Constraint(format!("quantity {} too large", line.quantity)))?;

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, menu_item_id, price_at_order_time, quantity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id.as_i64())
        .bind(line.menu_item_id.as_i64())
        .bind(line.price_at_order_time.to_decimal())
        .bind(quantity)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn append_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        sqlx::query("INSERT INTO order_status_history (order_id, status) VALUES ($1, $2)")
            .bind(order_id.as_i64())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn lock_order(&mut self, order_id: OrderId) -> Result<Option<OrderStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE order_id = $1 FOR UPDATE")
                .bind(order_id.as_i64())
                .fetch_optional(&mut *self.tx)
                .await?;

        status.as_deref().map(parse_status).transpose()
    }

    async fn set_status(&mut self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE order_id = $2")
            .bind(status.as_str())
            .bind(order_id.as_i64())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }

    async fn replace_order(&mut self, order_id: OrderId, order: NewOrder) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET customer_name = $1, status = 'active', total_amount = $2, order_date = NOW()
            WHERE order_id = $3
            "#,
        )
        .bind(&order.customer_name)
        .bind(order.total_amount.to_decimal())
        .bind(order_id.as_i64())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl CafeStore for PostgresCafeStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(PgUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }

    async fn price_map(&self, names: &[String]) -> Result<HashMap<String, Money>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query("SELECT name, price FROM menu_items WHERE name = ANY($1)")
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok((row.try_get("name")?, money(row.try_get("price")?)?)))
            .collect()
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT menu_item_id, name, description, price, tags
            FROM menu_items
            ORDER BY menu_item_id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(row_to_menu_item(&mut conn, row).await?);
        }
        Ok(items)
    }

    async fn get_menu_item(&self, id: MenuItemId) -> Result<Option<MenuItem>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(
            r#"
            SELECT menu_item_id, name, description, price, tags
            FROM menu_items
            WHERE menu_item_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_menu_item(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn price_history(&self, id: MenuItemId) -> Result<Vec<PriceChange>> {
        let rows = sqlx::query(
            r#"
            SELECT menu_item_id, old_price, new_price, changed_at
            FROM price_history
            WHERE menu_item_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(PriceChange {
                    menu_item_id: MenuItemId::new(row.try_get("menu_item_id")?),
                    old_price: money(row.try_get("old_price")?)?,
                    new_price: money(row.try_get("new_price")?)?,
                    changed_at: row.try_get("changed_at")?,
                })
            })
            .collect()
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(
            r#"
            SELECT order_id, customer_name, status, total_amount, order_date
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = fetch_lines(&mut conn, &[id.as_i64()]).await?;
        let order = row_to_order(&row, lines.remove(&id).unwrap_or_default())?;
        Ok(Some(order))
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT order_id, customer_name, status, total_amount, order_date
            FROM orders
            ORDER BY order_id ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("order_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut lines = fetch_lines(&mut conn, &ids).await?;

        rows.iter()
            .zip(ids)
            .map(|(row, id)| row_to_order(row, lines.remove(&OrderId::new(id)).unwrap_or_default()))
            .collect()
    }

    async fn status_history(&self, id: OrderId) -> Result<Vec<StatusChange>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, status, changed_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(StatusChange {
                    order_id: OrderId::new(row.try_get("order_id")?),
                    status: parse_status(&status)?,
                    changed_at: row.try_get("changed_at")?,
                })
            })
            .collect()
    }

    async fn get_inventory_item(&self, id: IngredientId) -> Result<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            SELECT inventory_id, name, stock_level, reorder_level, last_updated
            FROM inventory
            WHERE inventory_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_inventory_item).transpose()
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query(
            r#"
            SELECT inventory_id, name, stock_level, reorder_level, last_updated
            FROM inventory
            ORDER BY inventory_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_inventory_item).collect()
    }

    async fn inventory_transactions(&self, id: IngredientId) -> Result<Vec<InventoryTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, inventory_id, quantity, transaction_date
            FROM inventory_transactions
            WHERE inventory_id = $1
            ORDER BY transaction_id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(InventoryTransaction {
                    id: row.try_get("transaction_id")?,
                    ingredient_id: IngredientId::new(row.try_get("inventory_id")?),
                    quantity: row.try_get("quantity")?,
                    created_at: row.try_get("transaction_date")?,
                })
            })
            .collect()
    }

    async fn ordered_item_counts(
        &self,
        query: OrderedItemsQuery,
    ) -> Result<Vec<OrderedItemCount>> {
        let rows = sqlx::query(
            r#"
            SELECT mi.name, COALESCE(SUM(counted.quantity), 0)::BIGINT AS total_quantity
            FROM menu_items mi
            LEFT JOIN (
                SELECT oi.menu_item_id, oi.quantity
                FROM order_items oi
                JOIN orders o ON o.order_id = oi.order_id
                WHERE ($1::DATE IS NULL OR (o.order_date AT TIME ZONE 'UTC')::DATE >= $1::DATE)
                  AND ($2::DATE IS NULL OR (o.order_date AT TIME ZONE 'UTC')::DATE <= $2::DATE)
            ) counted ON counted.menu_item_id = mi.menu_item_id
            GROUP BY mi.name
            ORDER BY mi.name ASC
            "#,
        )
        .bind(query.start)
        .bind(query.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderedItemCount {
                    name: row.try_get("name")?,
                    quantity: row.try_get("total_quantity")?,
                })
            })
            .collect()
    }

    async fn leftovers(&self, query: LeftoversQuery) -> Result<LeftoversPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;

        let order_by = match query.sort_by {
            LeftoverSort::Name => "name ASC, inventory_id ASC",
            LeftoverSort::Quantity => "stock_level DESC, inventory_id ASC",
        };
        let sql = format!(
            "SELECT name, stock_level FROM inventory ORDER BY {order_by} LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(query.page_size))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let data = rows
            .into_iter()
            .map(|row| {
                Ok(Leftover {
                    name: row.try_get("name")?,
                    quantity: row.try_get("stock_level")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LeftoversPage::new(
            &query,
            u64::try_from(total).unwrap_or_default(),
            data,
        ))
    }
}
