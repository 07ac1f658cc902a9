//! Order placement: pricing, inventory check and decrement, persistence.

use std::collections::HashMap;
use std::time::Instant;

use store::{
    CafeStore, IngredientId, InventoryStore, MenuCatalog, Money, NewOrder, NewOrderLine, OrderId,
    OrderStatus, OrderStore, StockLevel, UnitOfWork,
};

use crate::error::DomainError;

use super::demand::IngredientDemand;
use super::request::{InventoryUpdate, MAX_ORDER_TOTAL, PlaceOrder, PlacedOrder};

/// Order lines priced and backed by decremented stock, not yet persisted.
struct FilledOrder {
    total: Money,
    lines: Vec<NewOrderLine>,
    inventory_updates: Vec<InventoryUpdate>,
}

/// Places orders against a cafe store.
///
/// Each placement runs in a single unit of work: either the order, its
/// lines, its initial status row and every stock decrement are committed
/// together, or none of them are.
#[derive(Clone)]
pub struct OrderPlacer<S: CafeStore> {
    store: S,
}

impl<S: CafeStore> OrderPlacer<S> {
    /// Creates a new order placer over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places a new order.
    ///
    /// Fails without side effects if the request is invalid, a menu item is
    /// unknown, or any ingredient's stock cannot cover the summed demand.
    #[tracing::instrument(skip(self, cmd), fields(customer = %cmd.customer_name, lines = cmd.lines.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<PlacedOrder, DomainError> {
        let started = Instant::now();
        let result = self.place(&cmd).await;
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(placed) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %placed.order_id,
                    total = %placed.total,
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, "order rejected");
            }
        }
        result
    }

    async fn place(&self, cmd: &PlaceOrder) -> Result<PlacedOrder, DomainError> {
        cmd.validate()?;

        // Dropping `tx` on any early return rolls the unit of work back.
        let mut tx = self.store.begin().await?;
        let filled = fill_order(&mut tx, cmd).await?;

        let order_id = tx
            .insert_order(NewOrder {
                customer_name: cmd.customer_name.clone(),
                total_amount: filled.total,
            })
            .await?;
        for line in filled.lines {
            tx.insert_order_line(order_id, line).await?;
        }
        tx.append_status(order_id, OrderStatus::Active).await?;
        tx.commit().await?;

        Ok(PlacedOrder {
            order_id,
            total: filled.total,
            inventory_updates: filled.inventory_updates,
        })
    }

    /// Rewrites an existing order from a new request.
    ///
    /// The new lines are priced and their ingredients decremented exactly
    /// like a new order. Stock consumed by the previous lines is not
    /// returned. The header is reset to `active` with a fresh creation time
    /// and an `active` row is appended to the status history.
    #[tracing::instrument(skip(self, cmd), fields(customer = %cmd.customer_name))]
    pub async fn replace_order(
        &self,
        order_id: OrderId,
        cmd: PlaceOrder,
    ) -> Result<PlacedOrder, DomainError> {
        cmd.validate()?;

        let mut tx = self.store.begin().await?;
        if tx.lock_order(order_id).await?.is_none() {
            return Err(DomainError::OrderNotFound(order_id));
        }

        let filled = fill_order(&mut tx, &cmd).await?;

        tx.replace_order(
            order_id,
            NewOrder {
                customer_name: cmd.customer_name.clone(),
                total_amount: filled.total,
            },
        )
        .await?;
        for line in filled.lines {
            tx.insert_order_line(order_id, line).await?;
        }
        tx.append_status(order_id, OrderStatus::Active).await?;
        tx.commit().await?;

        tracing::info!(%order_id, total = %filled.total, "order replaced");

        Ok(PlacedOrder {
            order_id,
            total: filled.total,
            inventory_updates: filled.inventory_updates,
        })
    }
}

/// Prices the requested lines and decrements the stock they consume.
///
/// Nothing is decremented unless every ingredient covers its summed demand.
async fn fill_order<T: UnitOfWork>(
    tx: &mut T,
    cmd: &PlaceOrder,
) -> Result<FilledOrder, DomainError> {
    let mut total = Money::zero();
    let mut lines = Vec::with_capacity(cmd.lines.len());
    let mut demand = IngredientDemand::new();

    for requested in &cmd.lines {
        let item = tx
            .price_and_recipe(&requested.menu_item_name)
            .await?
            .ok_or_else(|| DomainError::MenuItemNotFound {
                name: requested.menu_item_name.clone(),
            })?;

        total = item
            .price
            .checked_multiply(requested.quantity)
            .and_then(|line_total| total.checked_add(line_total))
            .filter(|total| *total <= MAX_ORDER_TOTAL)
            .ok_or_else(|| {
                DomainError::validation(format!("order total exceeds {MAX_ORDER_TOTAL}"))
            })?;
        demand.add_recipe(&item.recipe, requested.quantity);
        lines.push(NewOrderLine {
            menu_item_id: item.id,
            quantity: requested.quantity,
            price_at_order_time: item.price,
        });
    }

    let stock: HashMap<IngredientId, StockLevel> = tx
        .current_stock(&demand.ingredient_ids())
        .await?
        .into_iter()
        .map(|level| (level.ingredient_id, level))
        .collect();

    for (ingredient_id, required) in demand.iter() {
        let level = stock
            .get(&ingredient_id)
            .ok_or(DomainError::IngredientNotFound(ingredient_id))?;
        if level.stock < required {
            return Err(DomainError::InsufficientInventory {
                ingredient_id,
                name: level.name.clone(),
                required,
                available: level.stock,
            });
        }
    }

    let mut inventory_updates = Vec::with_capacity(demand.len());
    for (ingredient_id, required) in demand.iter() {
        let after = tx.decrement(ingredient_id, required).await?;
        inventory_updates.push(InventoryUpdate {
            ingredient_id,
            name: after.name,
            quantity_used: required,
            remaining: after.stock,
        });
    }

    Ok(FilledOrder {
        total,
        lines,
        inventory_updates,
    })
}
